use chrono::{DateTime, Utc};
use common::{ClaimStatus, EntryStatus, GiveawayStatus};
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, Pagination, double_option, title_ok};
use crate::entity::{giveaway, giveaway_entry, giveaway_winner};
use crate::error::AppError;

/// Most winners a single draw may pick.
pub const MAX_WINNERS_PER_DRAW: u32 = 100;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateGiveawayRequest {
    #[schema(example = "Win a cinema camera")]
    pub title: String,
    pub description: String,
    #[schema(example = "Blackmagic Pocket 6K")]
    pub prize_description: String,
    #[schema(example = 199500)]
    pub prize_value_cents: i64,
    /// Points charged per entry; 0 for free entry.
    #[serde(default)]
    #[schema(example = 100)]
    pub entry_cost: i32,
    /// Omit for unlimited entries.
    pub max_entries: Option<i32>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateGiveawayRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub prize_description: Option<String>,
    pub prize_value_cents: Option<i64>,
    pub entry_cost: Option<i32>,
    /// `null` removes the cap.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub max_entries: Option<Option<i32>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// `upcoming` or `active`. Giveaways complete only by drawing winners.
    pub status: Option<GiveawayStatus>,
}

fn check_amounts(
    errors: &mut FieldErrors,
    prize_value_cents: Option<i64>,
    entry_cost: Option<i32>,
    max_entries: Option<i32>,
) {
    if let Some(v) = prize_value_cents {
        errors.check(v >= 0, "prize_value_cents", "must not be negative");
    }
    if let Some(v) = entry_cost {
        errors.check(v >= 0, "entry_cost", "must not be negative");
    }
    if let Some(v) = max_entries {
        errors.check(v >= 1, "max_entries", "must be at least 1");
    }
}

pub fn validate_create_giveaway(payload: &CreateGiveawayRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.check(title_ok(&payload.title), "title", "Title must be 1-256 characters");
    errors.check(
        !payload.prize_description.trim().is_empty(),
        "prize_description",
        "must not be empty",
    );
    check_amounts(
        &mut errors,
        Some(payload.prize_value_cents),
        Some(payload.entry_cost),
        payload.max_entries,
    );
    errors.check(
        payload.end_date > payload.start_date,
        "end_date",
        "must be after start_date",
    );
    errors.into_result()
}

pub fn validate_update_giveaway(payload: &UpdateGiveawayRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(ref title) = payload.title {
        errors.check(title_ok(title), "title", "Title must be 1-256 characters");
    }
    if let Some(ref prize) = payload.prize_description {
        errors.check(!prize.trim().is_empty(), "prize_description", "must not be empty");
    }
    check_amounts(
        &mut errors,
        payload.prize_value_cents,
        payload.entry_cost,
        payload.max_entries.flatten(),
    );
    if payload.status == Some(GiveawayStatus::Completed) {
        errors.add("status", "giveaways complete by drawing winners");
    }
    errors.into_result()
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct DrawRequest {
    /// Number of winners to pick (default 1).
    #[serde(default = "one")]
    #[schema(example = 3)]
    pub count: u32,
    /// Users that may not win (staff, previously disqualified, ...).
    #[serde(default)]
    pub exclude_user_ids: Vec<i32>,
}

fn one() -> u32 {
    1
}

pub fn validate_draw(payload: &DrawRequest) -> Result<(), AppError> {
    if payload.count == 0 || payload.count > MAX_WINNERS_PER_DRAW {
        return Err(AppError::field(
            "count",
            format!("must be between 1 and {MAX_WINNERS_PER_DRAW}"),
        ));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GiveawayListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// `upcoming`, `active` or `completed`.
    pub status: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GiveawayResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub prize_description: String,
    pub prize_value_cents: i64,
    pub entry_cost: i32,
    pub max_entries: Option<i32>,
    pub entry_count: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: GiveawayStatus,
    pub drawn_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<giveaway::Model> for GiveawayResponse {
    fn from(m: giveaway::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            prize_description: m.prize_description,
            prize_value_cents: m.prize_value_cents,
            entry_cost: m.entry_cost,
            max_entries: m.max_entries,
            entry_count: m.entry_count,
            start_date: m.start_date,
            end_date: m.end_date,
            status: m.status,
            drawn_at: m.drawn_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GiveawayListResponse {
    pub data: Vec<GiveawayResponse>,
    pub pagination: Pagination,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EntryResponse {
    pub id: i32,
    pub giveaway_id: i32,
    pub user_id: i32,
    pub entry_number: i32,
    pub status: EntryStatus,
    pub points_spent: i32,
    pub created_at: DateTime<Utc>,
}

impl From<giveaway_entry::Model> for EntryResponse {
    fn from(m: giveaway_entry::Model) -> Self {
        Self {
            id: m.id,
            giveaway_id: m.giveaway_id,
            user_id: m.user_id,
            entry_number: m.entry_number,
            status: m.status,
            points_spent: m.points_spent,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EntryListResponse {
    pub data: Vec<EntryResponse>,
    pub pagination: Pagination,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct WinnerResponse {
    pub id: i32,
    pub giveaway_id: i32,
    pub entry_id: i32,
    pub user_id: i32,
    /// Public name of the winner.
    pub display_name: String,
    pub claim_status: ClaimStatus,
    pub claim_deadline: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WinnerResponse {
    pub fn new(m: giveaway_winner::Model, display_name: String) -> Self {
        Self {
            id: m.id,
            giveaway_id: m.giveaway_id,
            entry_id: m.entry_id,
            user_id: m.user_id,
            display_name,
            claim_status: m.claim_status,
            claim_deadline: m.claim_deadline,
            claimed_at: m.claimed_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DrawResponse {
    pub giveaway: GiveawayResponse,
    pub winners: Vec<WinnerResponse>,
}
