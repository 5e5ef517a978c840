use common::EntryStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One per (giveaway, user); uniqueness is enforced by `idx_entry_giveaway_user`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "giveaway_entry")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub giveaway_id: i32,
    #[sea_orm(belongs_to, from = "giveaway_id", to = "id")]
    pub giveaway: HasOne<super::giveaway::Entity>,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    /// 1-based position in entry order.
    pub entry_number: i32,
    pub status: EntryStatus,
    pub points_spent: i32,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
