use sea_orm::sea_query::LockType;
use sea_orm::{ConnectionTrait, DatabaseTransaction, EntityTrait, QuerySelect};

use crate::entity::contest;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

/// Look up a contest by ID, returning 404 if not found.
pub async fn find_contest<C: ConnectionTrait>(db: &C, id: i32) -> Result<contest::Model, AppError> {
    contest::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Contest not found".into()))
}

/// Look up a contest and hold a row lock on it until `txn` ends.
pub async fn find_contest_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<contest::Model, AppError> {
    contest::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Contest not found".into()))
}

/// Drafts are invisible to anyone without `contest:manage`.
/// Returns 404 (not 403) so draft IDs can't be probed.
pub fn check_contest_visible(auth_user: &AuthUser, contest: &contest::Model) -> Result<(), AppError> {
    if contest.status.is_published() || auth_user.has_permission("contest:manage") {
        return Ok(());
    }
    Err(AppError::NotFound("Contest not found".into()))
}
