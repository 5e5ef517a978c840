use common::SubmissionStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One per (contest, user); uniqueness is enforced by `idx_submission_contest_user`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contest_submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub contest_id: i32,
    #[sea_orm(belongs_to, from = "contest_id", to = "id")]
    pub contest: HasOne<super::contest::Entity>,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    /// The approved application that allowed this submission.
    pub application_id: i32,

    pub title: String,
    pub description: Option<String>,

    /// Key in the media store.
    pub media_key: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub file_size: i64,
    pub sha256: String,

    pub status: SubmissionStatus,
    /// 0-100, set by judges.
    pub score: Option<i32>,
    pub judge_notes: Option<String>,
    pub judged_by: Option<i32>,
    pub judged_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
