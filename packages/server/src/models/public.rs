use chrono::{DateTime, Utc};
use common::{ContestStatus, GiveawayStatus};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, Pagination, email_ok};
use crate::error::AppError;

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct PublicContest {
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
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicContestList {
    pub data: Vec<PublicContest>,
    pub pagination: Pagination,
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct PublicGiveaway {
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
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicGiveawayList {
    pub data: Vec<PublicGiveaway>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ContactRequest {
    #[schema(example = "Grace Hopper")]
    pub name: String,
    #[schema(example = "grace@example.com")]
    pub email: String,
    #[schema(example = "Commercial shoot in March")]
    pub subject: String,
    pub message: String,
}

pub fn validate_contact(payload: &ContactRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    let name = payload.name.trim();
    errors.check(
        !name.is_empty() && name.chars().count() <= 100,
        "name",
        "must be 1-100 characters",
    );
    errors.check(email_ok(&payload.email), "email", "Must be a valid email address");
    let subject = payload.subject.trim();
    errors.check(
        !subject.is_empty() && subject.chars().count() <= 200,
        "subject",
        "must be 1-200 characters",
    );
    let message = payload.message.trim();
    errors.check(
        !message.is_empty() && message.chars().count() <= 5000,
        "message",
        "must be 1-5000 characters",
    );
    errors.into_result()
}
