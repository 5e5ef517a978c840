use axum::Json;
use axum::extract::State;
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::subscription::*;
use crate::payments::{CheckoutSession, SubscriptionCheckout};
use crate::state::AppState;

async fn find_account<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Subscription",
    operation_id = "getSubscription",
    summary = "Current user's subscription",
    responses(
        (status = 200, description = "Subscription", body = SubscriptionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_subscription(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let account = find_account(&state.db, auth_user.user_id).await?;
    Ok(Json(SubscriptionResponse::from(&account)))
}

#[utoipa::path(
    post,
    path = "/checkout",
    tag = "Subscription",
    operation_id = "createSubscriptionCheckout",
    summary = "Start a subscription checkout",
    description = "Creates a hosted checkout for a paid tier, creating the processor customer on first use. \
        The tier is applied when the payment webhook reports the subscription.",
    request_body = SubscriptionCheckoutRequest,
    responses(
        (status = 200, description = "Checkout created", body = CheckoutSession),
        (status = 400, description = "Free tier or tier not offered (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Already subscribed (CONFLICT)", body = ErrorBody),
        (status = 503, description = "Payments disabled (PAYMENTS_DISABLED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, tier = %payload.tier))]
pub async fn create_subscription_checkout(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubscriptionCheckoutRequest>,
) -> Result<Json<CheckoutSession>, AppError> {
    let gateway = state.payments()?;
    validate_subscription_checkout(&payload)?;

    let account = find_account(&state.db, auth_user.user_id).await?;
    if SubscriptionResponse::from(&account).active {
        return Err(AppError::Conflict(
            "You already have an active subscription".into(),
        ));
    }

    let customer_id = match account.stripe_customer_id.clone() {
        Some(id) => id,
        None => {
            let id = gateway
                .create_customer(account.id, &account.email, &account.display_name)
                .await?;
            let mut active: user::ActiveModel = account.clone().into();
            active.stripe_customer_id = Set(Some(id.clone()));
            active.updated_at = Set(chrono::Utc::now());
            active.update(&state.db).await?;
            id
        }
    };

    let public_url = &state.config.server.public_url;
    let success_url = format!("{public_url}/dashboard/subscription?checkout=success");
    let cancel_url = format!("{public_url}/dashboard/subscription?checkout=cancelled");

    let session = gateway
        .create_subscription_checkout(SubscriptionCheckout {
            user_id: account.id,
            customer_id: &customer_id,
            tier: payload.tier,
            success_url: &success_url,
            cancel_url: &cancel_url,
        })
        .await?;

    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/cancel",
    tag = "Subscription",
    operation_id = "cancelSubscription",
    summary = "Cancel the current subscription",
    description = "Cancels at the end of the billing period. The status changes when the processor's webhook arrives.",
    responses(
        (status = 200, description = "Cancellation requested", body = SubscriptionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No subscription (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Payments disabled (PAYMENTS_DISABLED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn cancel_subscription(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let gateway = state.payments()?;
    let account = find_account(&state.db, auth_user.user_id).await?;

    let subscription_id = account
        .stripe_subscription_id
        .as_deref()
        .ok_or_else(|| AppError::NotFound("You don't have a subscription".into()))?;
    gateway.cancel_subscription(subscription_id).await?;

    tracing::info!("Subscription cancellation requested");
    Ok(Json(SubscriptionResponse::from(&account)))
}
