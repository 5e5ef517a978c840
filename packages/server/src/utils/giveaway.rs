use sea_orm::sea_query::LockType;
use sea_orm::{ConnectionTrait, DatabaseTransaction, EntityTrait, QuerySelect};

use crate::entity::giveaway;
use crate::error::AppError;

pub async fn find_giveaway<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<giveaway::Model, AppError> {
    giveaway::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Giveaway not found".into()))
}

/// Look up a giveaway and hold a row lock on it until `txn` ends.
pub async fn find_giveaway_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<giveaway::Model, AppError> {
    giveaway::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Giveaway not found".into()))
}
