//! Points ledger writes.
//!
//! Every balance change appends a `points_transaction` row and updates the
//! cached `user.points_balance` inside the caller's transaction, with the
//! user row locked. Both commit or neither does.

use chrono::Utc;
use common::TransactionKind;
use common::points::next_balance;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{points_transaction, user};
use crate::error::AppError;

/// A single balance change to record.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub kind: TransactionKind,
    /// Signed amount; must agree with `kind`.
    pub amount: i64,
    pub description: String,
    /// What caused the change, e.g. `("giveaway", "12")`.
    pub reference: Option<(&'static str, String)>,
}

impl LedgerEntry {
    pub fn new(kind: TransactionKind, amount: i64, description: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            description: description.into(),
            reference: None,
        }
    }

    pub fn referencing(mut self, kind: &'static str, id: impl ToString) -> Self {
        self.reference = Some((kind, id.to_string()));
        self
    }
}

/// Apply `entry` to the user's balance and append it to the ledger.
///
/// Fails with `INSUFFICIENT_POINTS` (and writes nothing) if the change would
/// leave the balance negative.
#[instrument(skip(txn, entry), fields(kind = %entry.kind, amount = entry.amount))]
pub async fn record(
    txn: &DatabaseTransaction,
    user_id: i32,
    entry: LedgerEntry,
) -> Result<points_transaction::Model, AppError> {
    let account = user::Entity::find_by_id(user_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let balance_after = next_balance(account.points_balance, entry.kind, entry.amount)?;
    let now = Utc::now();

    let mut active: user::ActiveModel = account.into();
    active.points_balance = Set(balance_after);
    active.updated_at = Set(now);
    active.update(txn).await?;

    let (reference_type, reference_id) = match entry.reference {
        Some((kind, id)) => (Some(kind.to_string()), Some(id)),
        None => (None, None),
    };

    let row = points_transaction::ActiveModel {
        user_id: Set(user_id),
        kind: Set(entry.kind),
        amount: Set(entry.amount),
        balance_after: Set(balance_after),
        description: Set(entry.description),
        reference_type: Set(reference_type),
        reference_id: Set(reference_id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok(row)
}
