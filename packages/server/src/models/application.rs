use chrono::{DateTime, Utc};
use common::ApplicationStatus;
use serde::{Deserialize, Serialize};

use super::shared::Pagination;
use crate::entity::contest_application;
use crate::error::AppError;

/// Largest accepted `responses` document, in serialized bytes.
const MAX_RESPONSES_BYTES: usize = 16 * 1024;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ApplyRequest {
    /// Answers to the contest's application questions, as a JSON object.
    #[serde(default = "empty_object")]
    #[schema(value_type = Object, example = json!({"portfolio": "https://vimeo.com/ada", "experience": "3 years"}))]
    pub responses: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

pub fn validate_apply(payload: &ApplyRequest) -> Result<(), AppError> {
    if !payload.responses.is_object() {
        return Err(AppError::field("responses", "must be a JSON object"));
    }
    if payload.responses.to_string().len() > MAX_RESPONSES_BYTES {
        return Err(AppError::field(
            "responses",
            format!("must be at most {MAX_RESPONSES_BYTES} bytes"),
        ));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReviewApplicationRequest {
    /// `approved` or `rejected`.
    pub status: ApplicationStatus,
    /// Shared with the applicant.
    pub notes: Option<String>,
}

pub fn validate_review(payload: &ReviewApplicationRequest) -> Result<(), AppError> {
    if !payload.status.is_decision() {
        return Err(AppError::field("status", "must be approved or rejected"));
    }
    if let Some(ref notes) = payload.notes
        && notes.chars().count() > 2000
    {
        return Err(AppError::field("notes", "must be at most 2000 characters"));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApplicationListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// `pending`, `approved` or `rejected`.
    pub status: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ApplicationResponse {
    pub id: i32,
    pub contest_id: i32,
    pub user_id: i32,
    pub status: ApplicationStatus,
    #[schema(value_type = Object)]
    pub responses: serde_json::Value,
    pub reviewed_by: Option<i32>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<contest_application::Model> for ApplicationResponse {
    fn from(m: contest_application::Model) -> Self {
        Self {
            id: m.id,
            contest_id: m.contest_id,
            user_id: m.user_id,
            status: m.status,
            responses: m.responses,
            reviewed_by: m.reviewed_by,
            reviewed_at: m.reviewed_at,
            review_notes: m.review_notes,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// An application as seen by contest managers, with the applicant's identity.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ApplicationListItem {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub applicant_email: String,
    pub applicant_name: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ApplicationListResponse {
    pub data: Vec<ApplicationListItem>,
    pub pagination: Pagination,
}
