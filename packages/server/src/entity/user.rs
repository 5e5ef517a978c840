use common::{SubscriptionStatus, SubscriptionTier};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored lowercased.
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub display_name: String,

    pub role: String,
    #[sea_orm(belongs_to, from = "role", to = "name")]
    pub role_ref: HasOne<super::role::Entity>,

    /// Cached sum of the user's points ledger.
    pub points_balance: i64,

    pub subscription_tier: SubscriptionTier,
    pub subscription_status: SubscriptionStatus,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,

    pub email_verified_at: Option<DateTimeUtc>,
    /// SHA-256 of the outstanding verification token.
    #[serde(skip_serializing)]
    pub verification_token_hash: Option<String>,
    pub verification_expires_at: Option<DateTimeUtc>,
    /// SHA-256 of the outstanding password-reset token.
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    pub reset_expires_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
