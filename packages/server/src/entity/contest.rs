use common::ContestStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contest")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub description: String, // in Markdown
    pub prize: String,
    pub status: ContestStatus,

    // Ordered: start < application deadline < submission deadline < end.
    pub start_date: DateTimeUtc,
    pub application_deadline: DateTimeUtc,
    pub submission_deadline: DateTimeUtc,
    pub end_date: DateTimeUtc,

    /// NULL means unlimited applications.
    pub max_participants: Option<i32>,
    pub application_count: i32,
    pub submission_count: i32,

    pub winner_submission_id: Option<i32>,
    pub created_by: i32,

    #[sea_orm(has_many)]
    pub applications: HasMany<super::contest_application::Entity>,

    #[sea_orm(has_many)]
    pub submissions: HasMany<super::contest_submission::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
