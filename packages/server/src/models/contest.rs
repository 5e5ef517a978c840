use chrono::{DateTime, Utc};
use common::ContestStatus;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, Pagination, double_option, title_ok};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateContestRequest {
    #[schema(example = "Summer Reel 2026")]
    pub title: String,
    /// Markdown.
    pub description: String,
    #[schema(example = "$5,000 production budget")]
    pub prize: String,
    pub start_date: DateTime<Utc>,
    pub application_deadline: DateTime<Utc>,
    pub submission_deadline: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Maximum number of applications; omit for unlimited.
    #[schema(example = 50)]
    pub max_participants: Option<i32>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateContestRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub prize: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub submission_deadline: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// `null` removes the cap.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub max_participants: Option<Option<i32>>,
}

/// The four contest dates, in the order they must occur.
#[derive(Debug, Clone, Copy)]
pub struct ContestDates {
    pub start_date: DateTime<Utc>,
    pub application_deadline: DateTime<Utc>,
    pub submission_deadline: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl ContestDates {
    /// Strictly increasing: start < application deadline < submission deadline < end.
    pub fn validate(&self, errors: &mut FieldErrors) {
        errors.check(
            self.application_deadline > self.start_date,
            "application_deadline",
            "must be after start_date",
        );
        errors.check(
            self.submission_deadline > self.application_deadline,
            "submission_deadline",
            "must be after application_deadline",
        );
        errors.check(
            self.end_date > self.submission_deadline,
            "end_date",
            "must be after submission_deadline",
        );
    }
}

fn check_capacity(errors: &mut FieldErrors, max: Option<i32>) {
    if let Some(max) = max {
        errors.check(max >= 1, "max_participants", "must be at least 1");
    }
}

pub fn validate_create_contest(payload: &CreateContestRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.check(title_ok(&payload.title), "title", "Title must be 1-256 characters");
    errors.check(!payload.prize.trim().is_empty(), "prize", "Prize must not be empty");
    check_capacity(&mut errors, payload.max_participants);
    ContestDates {
        start_date: payload.start_date,
        application_deadline: payload.application_deadline,
        submission_deadline: payload.submission_deadline,
        end_date: payload.end_date,
    }
    .validate(&mut errors);
    errors.into_result()
}

/// Field-local checks only; date ordering is checked against stored values
/// in the handler.
pub fn validate_update_contest(payload: &UpdateContestRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(ref title) = payload.title {
        errors.check(title_ok(title), "title", "Title must be 1-256 characters");
    }
    if let Some(ref prize) = payload.prize {
        errors.check(!prize.trim().is_empty(), "prize", "Prize must not be empty");
    }
    if let Some(max) = payload.max_participants {
        check_capacity(&mut errors, max);
    }
    errors.into_result()
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct TransitionContestRequest {
    /// Must be the status right after the current one.
    pub status: ContestStatus,
    /// When completing, the submission to crown as winner.
    pub winner_submission_id: Option<i32>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContestListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive title search.
    pub search: Option<String>,
    /// One of `draft`, `open`, `closed`, `judging`, `completed`.
    pub status: Option<String>,
    /// `created_at` (default), `start_date`, `application_deadline` or `title`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContestResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub prize: String,
    pub status: ContestStatus,
    pub start_date: DateTime<Utc>,
    pub application_deadline: DateTime<Utc>,
    pub submission_deadline: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub application_count: i32,
    pub submission_count: i32,
    pub winner_submission_id: Option<i32>,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::contest::Model> for ContestResponse {
    fn from(m: crate::entity::contest::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            prize: m.prize,
            status: m.status,
            start_date: m.start_date,
            application_deadline: m.application_deadline,
            submission_deadline: m.submission_deadline,
            end_date: m.end_date,
            max_participants: m.max_participants,
            application_count: m.application_count,
            submission_count: m.submission_count,
            winner_submission_id: m.winner_submission_id,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct ContestListItem {
    pub id: i32,
    pub title: String,
    pub prize: String,
    pub status: ContestStatus,
    pub start_date: DateTime<Utc>,
    pub application_deadline: DateTime<Utc>,
    pub submission_deadline: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub application_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContestListResponse {
    pub data: Vec<ContestListItem>,
    pub pagination: Pagination,
}
