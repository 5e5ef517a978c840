#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a points transaction happened. Amounts are signed: credits are
/// positive, debits negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Awarded by the platform (signup bonus, contest win).
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "earned"))]
    Earned,
    /// Paid for a giveaway entry.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "spent"))]
    Spent,
    /// Bought through the payment processor.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "purchased"))]
    Purchased,
    /// Manual correction by an admin, either direction.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "adjusted"))]
    Adjusted,
}

impl TransactionKind {
    pub const ALL: &'static [TransactionKind] =
        &[Self::Earned, Self::Spent, Self::Purchased, Self::Adjusted];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earned => "earned",
            Self::Spent => "spent",
            Self::Purchased => "purchased",
            Self::Adjusted => "adjusted",
        }
    }

    /// Check that `amount` has the sign this kind requires.
    pub fn validate_amount(&self, amount: i64) -> Result<(), LedgerError> {
        let ok = match self {
            Self::Earned | Self::Purchased => amount > 0,
            Self::Spent => amount < 0,
            Self::Adjusted => amount != 0,
        };
        if ok {
            Ok(())
        } else {
            Err(LedgerError::InvalidAmount {
                kind: *self,
                amount,
            })
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Amount {amount} is not valid for a '{kind}' transaction")]
    InvalidAmount { kind: TransactionKind, amount: i64 },
    #[error("Insufficient points: balance is {balance}, {required} required")]
    InsufficientBalance { balance: i64, required: i64 },
    #[error("Points balance overflow")]
    Overflow,
}

/// Compute the balance after applying a signed `amount` of the given kind.
///
/// The balance never goes negative.
pub fn next_balance(balance: i64, kind: TransactionKind, amount: i64) -> Result<i64, LedgerError> {
    kind.validate_amount(amount)?;
    let next = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
    if next < 0 {
        return Err(LedgerError::InsufficientBalance {
            balance,
            required: amount.saturating_neg(),
        });
    }
    Ok(next)
}
