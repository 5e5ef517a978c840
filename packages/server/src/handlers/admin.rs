use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::TransactionKind;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::points::{AdjustPointsRequest, TransactionResponse, validate_adjust_points};
use crate::models::shared::{Pagination, escape_like, page_bounds};
use crate::models::user::*;
use crate::state::AppState;
use crate::utils::ledger::{self, LedgerEntry};
use crate::utils::notify::{self, Notice};

#[utoipa::path(
    get,
    path = "/users",
    tag = "Admin",
    operation_id = "listUsers",
    summary = "List and search users",
    description = "Newest accounts first. `search` matches email or display name case-insensitively. Requires `user:manage` permission.",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users", body = UserListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    auth_user.require_permission("user:manage")?;
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let mut select = user::Entity::find();
    if let Some(ref role) = query.role {
        select = select.filter(user::Column::Role.eq(role.as_str()));
    }
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(user::Column::Email)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(user::Column::DisplayName)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Email)
        .column(user::Column::DisplayName)
        .column(user::Column::Role)
        .column(user::Column::PointsBalance)
        .column(user::Column::SubscriptionTier)
        .column(user::Column::SubscriptionStatus)
        .column(user::Column::EmailVerifiedAt)
        .column(user::Column::CreatedAt)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .into_model::<UserSummary>()
        .all(&state.db)
        .await?;

    Ok(Json(UserListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Admin",
    operation_id = "getUser",
    summary = "Get a user",
    description = "Requires `user:manage` permission.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserSummary),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserSummary>, AppError> {
    auth_user.require_permission("user:manage")?;
    let account = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "Admin",
    operation_id = "updateUser",
    summary = "Change a user's role or display name",
    description = "Requires `user:manage` permission. Admins can't change their own role. The new role applies from the user's next login.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserSummary),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserSummary>, AppError> {
    auth_user.require_permission("user:manage")?;
    validate_update_user(&payload)?;

    let existing = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if payload == UpdateUserRequest::default() {
        return Ok(Json(existing.into()));
    }
    if id == auth_user.user_id
        && payload.role.as_deref().is_some_and(|r| r != existing.role)
    {
        return Err(AppError::field("role", "You can't change your own role"));
    }

    let mut active: user::ActiveModel = existing.into();
    if let Some(role) = payload.role {
        active.role = Set(role);
    }
    if let Some(ref name) = payload.display_name {
        active.display_name = Set(name.trim().to_string());
    }
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    tracing::info!(user_id = id, role = %model.role, "User updated by admin");
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/points/adjust",
    tag = "Admin",
    operation_id = "adjustPoints",
    summary = "Credit or debit a user's points",
    description = "Writes an `adjusted` ledger row and updates the balance atomically. Requires `points:adjust` permission. A debit can't take the balance below zero.",
    request_body = AdjustPointsRequest,
    responses(
        (status = 201, description = "Adjustment recorded", body = TransactionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR) or overdraw (INSUFFICIENT_POINTS)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(target = payload.user_id, amount = payload.amount))]
pub async fn adjust_points(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AdjustPointsRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("points:adjust")?;
    validate_adjust_points(&payload)?;

    let reason = payload.reason.trim().to_string();
    let txn = state.db.begin().await?;
    let row = ledger::record(
        &txn,
        payload.user_id,
        LedgerEntry::new(TransactionKind::Adjusted, payload.amount, reason.clone())
            .referencing("admin", auth_user.user_id),
    )
    .await?;

    let title = if payload.amount > 0 {
        format!("{} points added", payload.amount)
    } else {
        format!("{} points removed", -payload.amount)
    };
    notify::push(
        &txn,
        payload.user_id,
        Notice {
            kind: notify::POINTS_ADJUSTED,
            title,
            body: reason,
            link: Some("/dashboard/points".into()),
        },
    )
    .await?;
    txn.commit().await?;

    tracing::info!(balance_after = row.balance_after, "Points adjusted");
    Ok((StatusCode::CREATED, Json(TransactionResponse::from(row))))
}
