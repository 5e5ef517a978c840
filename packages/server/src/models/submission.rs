use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::SubmissionStatus;
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, Pagination};
use crate::entity::contest_submission;
use crate::error::AppError;

pub const MAX_JUDGEMENTS_PER_REQUEST: usize = 100;

/// Multipart form accepted by the submit endpoint. Documentation only;
/// the handler reads the fields from `Multipart` directly.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct SubmitForm {
    /// Title of the piece (1-256 characters).
    pub title: String,
    pub description: Option<String>,
    /// The media file.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    pub id: i32,
    pub contest_id: i32,
    pub user_id: i32,
    pub application_id: i32,
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "final-cut.mp4")]
    pub file_name: String,
    #[schema(example = "video/mp4")]
    pub content_type: Option<String>,
    pub file_size: i64,
    pub sha256: String,
    pub status: SubmissionStatus,
    pub score: Option<i32>,
    pub judge_notes: Option<String>,
    pub judged_by: Option<i32>,
    pub judged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<contest_submission::Model> for SubmissionResponse {
    fn from(m: contest_submission::Model) -> Self {
        Self {
            id: m.id,
            contest_id: m.contest_id,
            user_id: m.user_id,
            application_id: m.application_id,
            title: m.title,
            description: m.description,
            file_name: m.file_name,
            content_type: m.content_type,
            file_size: m.file_size,
            sha256: m.sha256,
            status: m.status,
            score: m.score,
            judge_notes: m.judge_notes,
            judged_by: m.judged_by,
            judged_at: m.judged_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubmissionListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// `submitted`, `under_review`, `approved` or `rejected`.
    pub status: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionListResponse {
    pub data: Vec<SubmissionResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct Judgement {
    pub submission_id: i32,
    /// `under_review`, `approved` or `rejected`.
    pub status: SubmissionStatus,
    /// 0-100.
    #[schema(example = 87)]
    pub score: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct JudgeRequest {
    pub judgements: Vec<Judgement>,
}

pub fn validate_judge_request(payload: &JudgeRequest) -> Result<(), AppError> {
    if payload.judgements.is_empty() {
        return Err(AppError::field("judgements", "must not be empty"));
    }
    if payload.judgements.len() > MAX_JUDGEMENTS_PER_REQUEST {
        return Err(AppError::field(
            "judgements",
            format!("at most {MAX_JUDGEMENTS_PER_REQUEST} per request"),
        ));
    }

    let mut errors = FieldErrors::new();
    let mut seen = HashSet::new();
    for (i, j) in payload.judgements.iter().enumerate() {
        if !seen.insert(j.submission_id) {
            errors.add(
                &format!("judgements[{i}].submission_id"),
                format!("duplicate submission {}", j.submission_id),
            );
        }
        errors.check(
            j.status.is_judgeable(),
            &format!("judgements[{i}].status"),
            "must be under_review, approved or rejected",
        );
        if let Some(score) = j.score {
            errors.check(
                (0..=100).contains(&score),
                &format!("judgements[{i}].score"),
                "must be between 0 and 100",
            );
        }
    }
    errors.into_result()
}
