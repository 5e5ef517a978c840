use std::sync::Arc;

use common::{SubscriptionStatus, SubscriptionTier};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod stripe_gateway;

pub use stripe_gateway::StripeGateway;

use crate::config::PaymentsConfig;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payments are disabled")]
    Disabled,
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),
    #[error("{0} is not configured")]
    NotConfigured(String),
    #[error("Payment provider error: {0}")]
    Provider(String),
}

/// A hosted checkout page the client should be redirected to.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CheckoutSession {
    #[schema(example = "cs_test_a1b2c3")]
    pub session_id: String,
    #[schema(example = "https://checkout.stripe.com/c/pay/cs_test_a1b2c3")]
    pub checkout_url: String,
}

pub struct PointsCheckout<'a> {
    pub user_id: i32,
    pub customer_id: Option<&'a str>,
    pub package_id: &'a str,
    pub package_name: &'a str,
    pub points: i64,
    pub price_cents: i64,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

pub struct SubscriptionCheckout<'a> {
    pub user_id: i32,
    pub customer_id: &'a str,
    pub tier: SubscriptionTier,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

/// What a verified webhook means for us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentEvent {
    /// A one-off points package was paid for.
    PointsPurchased {
        user_id: i32,
        package_id: String,
        points: i64,
        session_id: String,
    },
    /// A subscription checkout finished; links the processor ids to the user.
    SubscriptionStarted {
        user_id: i32,
        customer_id: String,
        subscription_id: String,
    },
    /// The processor reports a new state for a subscription.
    SubscriptionChanged {
        customer_id: String,
        subscription_id: String,
        status: SubscriptionStatus,
        /// `None` when the price doesn't match a configured tier.
        tier: Option<SubscriptionTier>,
    },
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Processor event id, used for idempotency.
    pub id: String,
    pub event_type: String,
    pub event: PaymentEvent,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a processor-side customer record and return its id.
    async fn create_customer(
        &self,
        user_id: i32,
        email: &str,
        name: &str,
    ) -> Result<String, PaymentError>;

    async fn create_points_checkout(
        &self,
        checkout: PointsCheckout<'_>,
    ) -> Result<CheckoutSession, PaymentError>;

    async fn create_subscription_checkout(
        &self,
        checkout: SubscriptionCheckout<'_>,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Cancel at the end of the current billing period.
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), PaymentError>;

    /// Verify the signature of a webhook delivery and decode it.
    fn parse_webhook(&self, payload: &str, signature: &str) -> Result<WebhookEvent, PaymentError>;
}

pub type DynPaymentGateway = Arc<dyn PaymentGateway>;

/// Build the configured gateway, or `None` when payments are disabled.
pub fn create_payment_gateway(
    config: &PaymentsConfig,
) -> Result<Option<DynPaymentGateway>, PaymentError> {
    if !config.enabled {
        return Ok(None);
    }
    Ok(Some(Arc::new(StripeGateway::new(config)?)))
}
