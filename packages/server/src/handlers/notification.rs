use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::notification;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::notification::*;
use crate::models::shared::{Pagination, page_bounds};
use crate::state::AppState;

fn unread_of(user_id: i32) -> Select<notification::Entity> {
    notification::Entity::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::ReadAt.is_null())
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Notifications",
    operation_id = "listNotifications",
    summary = "Current user's notifications",
    description = "Newest first. `unread_only=true` hides notifications already read.",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Notifications", body = NotificationListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_notifications(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<NotificationListResponse>, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let select = if query.unread_only {
        unread_of(auth_user.user_id)
    } else {
        notification::Entity::find().filter(notification::Column::UserId.eq(auth_user.user_id))
    };

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(NotificationResponse::from)
        .collect();

    Ok(Json(NotificationListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/unread-count",
    tag = "Notifications",
    operation_id = "unreadNotificationCount",
    summary = "Number of unread notifications",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn unread_count(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let count = unread_of(auth_user.user_id).count(&state.db).await?;
    Ok(Json(UnreadCountResponse { count }))
}

#[utoipa::path(
    post,
    path = "/{id}/read",
    tag = "Notifications",
    operation_id = "markNotificationRead",
    summary = "Mark one notification read",
    description = "Idempotent; re-reading keeps the original read time.",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification", body = NotificationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Notification not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<NotificationResponse>, AppError> {
    let existing = notification::Entity::find_by_id(id)
        .filter(notification::Column::UserId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".into()))?;

    if existing.read_at.is_some() {
        return Ok(Json(existing.into()));
    }

    let mut active: notification::ActiveModel = existing.into();
    active.read_at = Set(Some(Utc::now()));
    let model = active.update(&state.db).await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/read-all",
    tag = "Notifications",
    operation_id = "markAllNotificationsRead",
    summary = "Mark every notification read",
    responses(
        (status = 200, description = "Notifications updated", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn mark_all_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let result = notification::Entity::update_many()
        .col_expr(notification::Column::ReadAt, Expr::value(Utc::now()))
        .filter(notification::Column::UserId.eq(auth_user.user_id))
        .filter(notification::Column::ReadAt.is_null())
        .exec(&state.db)
        .await?;

    Ok(Json(MarkAllReadResponse {
        updated: result.rows_affected,
    }))
}
