use axum::Json;
use axum::extract::{Query, State};
use common::TransactionKind;
use sea_orm::*;
use tracing::instrument;

use crate::config::PointsPackage;
use crate::entity::{points_transaction, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::points::*;
use crate::models::shared::{Pagination, page_bounds, parse_filter};
use crate::payments::{CheckoutSession, PointsCheckout};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/balance",
    tag = "Points",
    operation_id = "getBalance",
    summary = "Current user's points balance",
    responses(
        (status = 200, description = "Balance", body = BalanceResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_balance(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, AppError> {
    let account = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(BalanceResponse {
        user_id: account.id,
        balance: account.points_balance,
    }))
}

#[utoipa::path(
    get,
    path = "/transactions",
    tag = "Points",
    operation_id = "listTransactions",
    summary = "Current user's points history",
    description = "Ledger rows newest first, optionally filtered by kind.",
    params(TransactionListQuery),
    responses(
        (status = 200, description = "Transactions", body = TransactionListResponse),
        (status = 400, description = "Invalid kind filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_transactions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let mut select = points_transaction::Entity::find()
        .filter(points_transaction::Column::UserId.eq(auth_user.user_id));
    if let Some(kind) = parse_filter::<TransactionKind>(query.kind.as_deref(), "kind")? {
        select = select.filter(points_transaction::Column::Kind.eq(kind));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .order_by_desc(points_transaction::Column::CreatedAt)
        .order_by_desc(points_transaction::Column::Id)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(TransactionListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/packages",
    tag = "Points",
    operation_id = "listPackages",
    summary = "Purchasable points packages",
    responses(
        (status = 200, description = "Packages", body = Vec<PointsPackage>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_packages(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<PointsPackage>> {
    Json(state.config.payments.packages.clone())
}

#[utoipa::path(
    post,
    path = "/purchase",
    tag = "Points",
    operation_id = "purchasePoints",
    summary = "Start a points purchase",
    description = "Creates a hosted checkout for a package. Points are credited when the payment webhook confirms the charge.",
    request_body = PurchaseRequest,
    responses(
        (status = 200, description = "Checkout created", body = CheckoutSession),
        (status = 400, description = "Unknown package (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 503, description = "Payments disabled (PAYMENTS_DISABLED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, package = %payload.package_id))]
pub async fn purchase_points(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<PurchaseRequest>,
) -> Result<Json<CheckoutSession>, AppError> {
    let gateway = state.payments()?;
    let package = state
        .config
        .payments
        .package(&payload.package_id)
        .ok_or_else(|| AppError::field("package_id", "Unknown points package"))?;

    let account = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let public_url = &state.config.server.public_url;
    let success_url = format!("{public_url}/dashboard/points?checkout=success");
    let cancel_url = format!("{public_url}/dashboard/points?checkout=cancelled");

    let session = gateway
        .create_points_checkout(PointsCheckout {
            user_id: account.id,
            customer_id: account.stripe_customer_id.as_deref(),
            package_id: &package.id,
            package_name: &package.name,
            points: package.points,
            price_cents: package.price_cents,
            success_url: &success_url,
            cancel_url: &cancel_url,
        })
        .await?;

    tracing::info!(session_id = %session.session_id, "Points checkout created");
    Ok(Json(session))
}
