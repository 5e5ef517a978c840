#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::ParseEnumError;

/// Default number of days a winner has to claim a prize.
pub const DEFAULT_CLAIM_WINDOW_DAYS: i64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum GiveawayStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "upcoming"))]
    Upcoming,
    /// Accepting entries while inside the date window.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "active"))]
    Active,
    /// Winners have been drawn.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "completed"))]
    Completed,
}

impl GiveawayStatus {
    pub const ALL: &'static [GiveawayStatus] = &[Self::Upcoming, Self::Active, Self::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl Default for GiveawayStatus {
    fn default() -> Self {
        Self::Upcoming
    }
}

impl fmt::Display for GiveawayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GiveawayStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<_> = Self::ALL.iter().map(|s| s.as_str()).collect();
                ParseEnumError::new("giveaway status", s, &valid)
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Eligible for the draw.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "entered"))]
    Entered,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "won"))]
    Won,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "disqualified"))]
    Disqualified,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entered => "entered",
            Self::Won => "won",
            Self::Disqualified => "disqualified",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prize-claim state of a drawn winner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "claimed"))]
    Claimed,
    /// The prize has been shipped or paid out.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "fulfilled"))]
    Fulfilled,
    /// The claim deadline passed before the winner claimed.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "expired"))]
    Expired,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Fulfilled => "fulfilled",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a draw cannot go ahead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("At least one winner must be requested")]
    NothingRequested,
    #[error("Requested {requested} winners but only {eligible} eligible entries")]
    NotEnoughEntries { requested: usize, eligible: usize },
}

/// Pick `count` distinct candidates uniformly at random.
///
/// Uses a partial Fisher-Yates shuffle, so every subset of size `count` is
/// equally likely and the order of the result is random as well.
pub fn draw_winners<T, R>(candidates: &[T], count: usize, rng: &mut R) -> Result<Vec<T>, DrawError>
where
    T: Clone,
    R: Rng + ?Sized,
{
    if count == 0 {
        return Err(DrawError::NothingRequested);
    }
    if count > candidates.len() {
        return Err(DrawError::NotEnoughEntries {
            requested: count,
            eligible: candidates.len(),
        });
    }

    let mut pool = candidates.to_vec();
    let (chosen, _) = pool.partial_shuffle(rng, count);
    Ok(chosen.to_vec())
}

/// Deadline for claiming a prize drawn at `drawn_at`.
pub fn claim_deadline(drawn_at: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    drawn_at + Duration::days(window_days)
}
