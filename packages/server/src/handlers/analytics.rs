use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use common::{SubscriptionStatus, TransactionKind};
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{
    contest, contest_application, contest_submission, giveaway, giveaway_entry,
    points_transaction, user,
};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::analytics::*;
use crate::state::AppState;

/// Row count per distinct value of `column`. Enum columns are stored as
/// text, so they read back as their string form.
async fn count_by<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    column: E::Column,
) -> Result<BTreeMap<String, u64>, DbErr>
where
    E: EntityTrait,
{
    let rows: Vec<(String, i64)> = select
        .select_only()
        .column(column)
        .column_as(column.count(), "count")
        .group_by(column)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(key, n)| (key, Ord::max(n, 0) as u64))
        .collect())
}

// Postgres widens `SUM(bigint)` to `numeric`; the sums are cast back to bigint.
async fn points_stats(db: &DatabaseConnection) -> Result<PointsStats, DbErr> {
    let by_kind: Vec<(String, i64)> = points_transaction::Entity::find()
        .select_only()
        .column(points_transaction::Column::Kind)
        .column_as(
            Expr::cust(r#"CAST(COALESCE(SUM("amount"), 0) AS BIGINT)"#),
            "total",
        )
        .group_by(points_transaction::Column::Kind)
        .into_tuple()
        .all(db)
        .await?;
    let sums: BTreeMap<String, i64> = by_kind.into_iter().collect();
    let sum_of = |kind: TransactionKind| sums.get(kind.as_str()).copied().unwrap_or(0);

    let outstanding: Option<i64> = user::Entity::find()
        .select_only()
        .column_as(
            Expr::cust(r#"CAST(COALESCE(SUM("points_balance"), 0) AS BIGINT)"#),
            "total",
        )
        .into_tuple()
        .one(db)
        .await?;

    Ok(PointsStats {
        issued: sum_of(TransactionKind::Earned),
        spent: -sum_of(TransactionKind::Spent),
        purchased: sum_of(TransactionKind::Purchased),
        adjusted: sum_of(TransactionKind::Adjusted),
        outstanding: outstanding.unwrap_or(0),
    })
}

#[utoipa::path(
    get,
    path = "/analytics",
    tag = "Admin",
    operation_id = "getAnalytics",
    summary = "Platform-wide counters",
    description = "Users by role, contests/applications/submissions/giveaways by status, entries, points flows and active subscriptions by tier. Requires `analytics:view` permission.",
    responses(
        (status = 200, description = "Analytics", body = AnalyticsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_analytics(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    auth_user.require_permission("analytics:view")?;
    let db = &state.db;

    let by_role = count_by(db, user::Entity::find(), user::Column::Role).await?;
    let users = UserStats {
        total: by_role.values().sum(),
        verified: user::Entity::find()
            .filter(user::Column::EmailVerifiedAt.is_not_null())
            .count(db)
            .await?,
        by_role,
    };

    let active_subscriptions = count_by(
        db,
        user::Entity::find()
            .filter(user::Column::SubscriptionStatus.eq(SubscriptionStatus::Active)),
        user::Column::SubscriptionTier,
    )
    .await?;

    Ok(Json(AnalyticsResponse {
        users,
        contests_by_status: count_by(db, contest::Entity::find(), contest::Column::Status).await?,
        applications_by_status: count_by(
            db,
            contest_application::Entity::find(),
            contest_application::Column::Status,
        )
        .await?,
        submissions_by_status: count_by(
            db,
            contest_submission::Entity::find(),
            contest_submission::Column::Status,
        )
        .await?,
        giveaways_by_status: count_by(db, giveaway::Entity::find(), giveaway::Column::Status)
            .await?,
        giveaway_entries: giveaway_entry::Entity::find().count(db).await?,
        points: points_stats(db).await?,
        active_subscriptions,
    }))
}
