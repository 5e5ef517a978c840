use chrono::{DateTime, Utc};
use common::{SubscriptionStatus, SubscriptionTier};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use super::shared::Pagination;
use crate::entity::role::ALL_ROLES;
use crate::error::AppError;

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive match on email or display name.
    pub search: Option<String>,
    /// Only users with this role.
    pub role: Option<String>,
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct UserSummary {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
    #[schema(example = "member")]
    pub role: String,
    #[schema(example = 1200)]
    pub points_balance: i64,
    pub subscription_tier: SubscriptionTier,
    pub subscription_status: SubscriptionStatus,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::user::Model> for UserSummary {
    fn from(m: crate::entity::user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            display_name: m.display_name,
            role: m.role,
            points_balance: m.points_balance,
            subscription_tier: m.subscription_tier,
            subscription_status: m.subscription_status,
            email_verified_at: m.email_verified_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserSummary>,
    pub pagination: Pagination,
}

/// Admin edit of a user record.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    /// One of `member`, `brand_admin`, `bass_admin`.
    #[schema(example = "brand_admin")]
    pub role: Option<String>,
    pub display_name: Option<String>,
}

pub fn validate_update_user(payload: &UpdateUserRequest) -> Result<(), AppError> {
    if let Some(ref role) = payload.role
        && !ALL_ROLES.contains(&role.as_str())
    {
        return Err(AppError::field(
            "role",
            format!("Must be one of: {}", ALL_ROLES.join(", ")),
        ));
    }
    if let Some(ref name) = payload.display_name {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > 64 {
            return Err(AppError::field("display_name", "Display name must be 1-64 characters"));
        }
    }
    Ok(())
}
