use common::{SubscriptionStatus, SubscriptionTier};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubscriptionResponse {
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    /// Whether paid features are currently unlocked.
    pub active: bool,
}

impl From<&crate::entity::user::Model> for SubscriptionResponse {
    fn from(user: &crate::entity::user::Model) -> Self {
        Self {
            tier: user.subscription_tier,
            status: user.subscription_status,
            active: user.subscription_tier.is_paid()
                && user.subscription_status == SubscriptionStatus::Active,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubscriptionCheckoutRequest {
    /// `creator` or `pro`.
    pub tier: SubscriptionTier,
}

pub fn validate_subscription_checkout(payload: &SubscriptionCheckoutRequest) -> Result<(), AppError> {
    if !payload.tier.is_paid() {
        return Err(AppError::field("tier", "must be a paid tier"));
    }
    Ok(())
}

/// Acknowledgement returned to the payment processor.
#[derive(Serialize, utoipa::ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    /// The event had already been processed and was skipped.
    pub duplicate: bool,
}
