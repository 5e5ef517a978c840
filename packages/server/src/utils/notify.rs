use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};

use crate::entity::notification;

pub const APPLICATION_REVIEWED: &str = "application_reviewed";
pub const SUBMISSION_JUDGED: &str = "submission_judged";
pub const CONTEST_WON: &str = "contest_won";
pub const GIVEAWAY_WON: &str = "giveaway_won";
pub const POINTS_ADJUSTED: &str = "points_adjusted";
pub const POINTS_PURCHASED: &str = "points_purchased";

/// In-app notification about to be written to a user's inbox.
pub struct Notice {
    pub kind: &'static str,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
}

pub async fn push<C: ConnectionTrait>(db: &C, user_id: i32, notice: Notice) -> Result<(), DbErr> {
    notification::ActiveModel {
        user_id: Set(user_id),
        kind: Set(notice.kind.to_string()),
        title: Set(notice.title),
        body: Set(notice.body),
        link: Set(notice.link),
        read_at: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}
