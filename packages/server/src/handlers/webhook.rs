use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::Utc;
use common::{SubscriptionStatus, SubscriptionTier, TransactionKind};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{payment_event, user};
use crate::error::{AppError, ErrorBody};
use crate::models::subscription::WebhookAck;
use crate::payments::{PaymentEvent, WebhookEvent};
use crate::state::AppState;
use crate::utils::ledger::{self, LedgerEntry};
use crate::utils::notify::{self, Notice};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[utoipa::path(
    post,
    path = "/payments",
    tag = "Webhooks",
    operation_id = "paymentWebhook",
    summary = "Payment processor webhook",
    description = "Receives signed events from the payment processor. Each event id is applied at most once; \
        repeated deliveries are acknowledged with `duplicate: true`.",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Event accepted", body = WebhookAck),
        (status = 400, description = "Missing or invalid signature (VALIDATION_ERROR)", body = ErrorBody),
        (status = 503, description = "Payments disabled (PAYMENTS_DISABLED)", body = ErrorBody),
    ),
)]
#[instrument(skip_all)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookAck>, AppError> {
    let gateway = state.payments()?;
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Validation("Missing webhook signature".into()))?;

    let WebhookEvent {
        id,
        event_type,
        event,
    } = gateway.parse_webhook(&body, signature)?;
    tracing::info!(event_id = %id, event_type = %event_type, "Payment webhook received");

    let duplicate = Json(WebhookAck {
        received: true,
        duplicate: true,
    });

    let txn = state.db.begin().await?;
    if payment_event::Entity::find_by_id(id.clone())
        .one(&txn)
        .await?
        .is_some()
    {
        tracing::debug!(event_id = %id, "Skipping already processed event");
        return Ok(duplicate);
    }

    apply_event(&txn, event).await?;

    let recorded = payment_event::ActiveModel {
        id: Set(id.clone()),
        event_type: Set(event_type),
        processed_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await;
    if let Err(e) = recorded {
        // A concurrent delivery of the same event won; drop our copy.
        if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            return Ok(duplicate);
        }
        return Err(e.into());
    }

    txn.commit().await?;
    Ok(Json(WebhookAck {
        received: true,
        duplicate: false,
    }))
}

async fn apply_event(txn: &DatabaseTransaction, event: PaymentEvent) -> Result<(), AppError> {
    match event {
        PaymentEvent::PointsPurchased {
            user_id,
            package_id,
            points,
            session_id,
        } => {
            if user::Entity::find_by_id(user_id).one(txn).await?.is_none() {
                tracing::warn!(user_id, "Points purchased for unknown user");
                return Ok(());
            }
            let row = ledger::record(
                txn,
                user_id,
                LedgerEntry::new(
                    TransactionKind::Purchased,
                    points,
                    format!("Purchased package '{package_id}'"),
                )
                .referencing("payment", session_id),
            )
            .await?;
            notify::push(
                txn,
                user_id,
                Notice {
                    kind: notify::POINTS_PURCHASED,
                    title: format!("{points} points added"),
                    body: format!("Your balance is now {}.", row.balance_after),
                    link: Some("/dashboard/points".into()),
                },
            )
            .await?;
        }
        PaymentEvent::SubscriptionStarted {
            user_id,
            customer_id,
            subscription_id,
        } => {
            let Some(account) = user::Entity::find_by_id(user_id).one(txn).await? else {
                tracing::warn!(user_id, "Subscription started for unknown user");
                return Ok(());
            };
            let mut active: user::ActiveModel = account.into();
            active.stripe_customer_id = Set(Some(customer_id));
            active.stripe_subscription_id = Set(Some(subscription_id));
            active.updated_at = Set(Utc::now());
            active.update(txn).await?;
        }
        PaymentEvent::SubscriptionChanged {
            customer_id,
            subscription_id,
            status,
            tier,
        } => {
            let Some(account) = user::Entity::find()
                .filter(user::Column::StripeCustomerId.eq(customer_id.as_str()))
                .one(txn)
                .await?
            else {
                tracing::warn!(customer_id = %customer_id, "Subscription update for unknown customer");
                return Ok(());
            };
            let mut active: user::ActiveModel = account.into();
            active.subscription_status = Set(status);
            active.stripe_subscription_id = Set(Some(subscription_id));
            match (status, tier) {
                (SubscriptionStatus::Canceled, _) => {
                    active.subscription_tier = Set(SubscriptionTier::Free);
                }
                (_, Some(tier)) => active.subscription_tier = Set(tier),
                (_, None) => {}
            }
            active.updated_at = Set(Utc::now());
            active.update(txn).await?;
        }
        PaymentEvent::Ignored => {}
    }
    Ok(())
}
