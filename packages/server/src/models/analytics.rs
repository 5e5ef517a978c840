use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserStats {
    pub total: u64,
    pub verified: u64,
    #[schema(example = json!({"member": 120, "brand_admin": 3}))]
    pub by_role: BTreeMap<String, u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PointsStats {
    /// Sum of `earned` transactions.
    pub issued: i64,
    /// Sum of `spent` transactions, as a positive number.
    pub spent: i64,
    pub purchased: i64,
    /// Net of all admin adjustments.
    pub adjusted: i64,
    /// Sum of all current balances.
    pub outstanding: i64,
}

/// Platform-wide counters for the admin dashboard.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AnalyticsResponse {
    pub users: UserStats,
    #[schema(example = json!({"draft": 1, "open": 2}))]
    pub contests_by_status: BTreeMap<String, u64>,
    pub applications_by_status: BTreeMap<String, u64>,
    pub submissions_by_status: BTreeMap<String, u64>,
    pub giveaways_by_status: BTreeMap<String, u64>,
    pub giveaway_entries: u64,
    pub points: PointsStats,
    /// Active paid subscriptions by tier.
    pub active_subscriptions: BTreeMap<String, u64>,
}
