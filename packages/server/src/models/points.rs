use chrono::{DateTime, Utc};
use common::TransactionKind;
use serde::{Deserialize, Serialize};

use super::shared::Pagination;
use crate::entity::points_transaction;
use crate::error::AppError;

/// Largest single admin adjustment, in either direction.
pub const MAX_ADJUSTMENT: i64 = 1_000_000;

#[derive(Serialize, utoipa::ToSchema)]
pub struct BalanceResponse {
    #[schema(example = 42)]
    pub user_id: i32,
    #[schema(example = 1200)]
    pub balance: i64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TransactionResponse {
    pub id: i32,
    pub user_id: i32,
    pub kind: TransactionKind,
    /// Signed: credits positive, debits negative.
    #[schema(example = -100)]
    pub amount: i64,
    pub balance_after: i64,
    #[schema(example = "Entry to giveaway #12")]
    pub description: String,
    #[schema(example = "giveaway")]
    pub reference_type: Option<String>,
    #[schema(example = "12")]
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<points_transaction::Model> for TransactionResponse {
    fn from(m: points_transaction::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            kind: m.kind,
            amount: m.amount,
            balance_after: m.balance_after,
            description: m.description,
            reference_type: m.reference_type,
            reference_id: m.reference_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// `earned`, `spent`, `purchased` or `adjusted`.
    pub kind: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TransactionListResponse {
    pub data: Vec<TransactionResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct PurchaseRequest {
    #[schema(example = "starter")]
    pub package_id: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AdjustPointsRequest {
    pub user_id: i32,
    /// Non-zero; negative to deduct.
    #[schema(example = 250)]
    pub amount: i64,
    #[schema(example = "Compensation for broken upload")]
    pub reason: String,
}

pub fn validate_adjust_points(payload: &AdjustPointsRequest) -> Result<(), AppError> {
    if payload.amount == 0 {
        return Err(AppError::field("amount", "must not be zero"));
    }
    if payload.amount.unsigned_abs() > MAX_ADJUSTMENT.unsigned_abs() {
        return Err(AppError::field(
            "amount",
            format!("must be at most {MAX_ADJUSTMENT} in either direction"),
        ));
    }
    let reason = payload.reason.trim();
    if reason.is_empty() || reason.chars().count() > 500 {
        return Err(AppError::field("reason", "must be 1-500 characters"));
    }
    Ok(())
}
