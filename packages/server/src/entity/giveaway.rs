use common::GiveawayStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "giveaway")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub description: String,
    pub prize_description: String,
    pub prize_value_cents: i64,

    /// Points charged per entry; 0 for free giveaways.
    pub entry_cost: i32,
    /// NULL means unlimited entries.
    pub max_entries: Option<i32>,
    pub entry_count: i32,

    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub status: GiveawayStatus,
    pub drawn_at: Option<DateTimeUtc>,
    pub created_by: i32,

    #[sea_orm(has_many)]
    pub entries: HasMany<super::giveaway_entry::Entity>,

    #[sea_orm(has_many)]
    pub winners: HasMany<super::giveaway_winner::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
