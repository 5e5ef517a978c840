use common::ClaimStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "giveaway_winner")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub giveaway_id: i32,
    #[sea_orm(belongs_to, from = "giveaway_id", to = "id")]
    pub giveaway: HasOne<super::giveaway::Entity>,

    #[sea_orm(unique)]
    pub entry_id: i32,
    pub user_id: i32,

    pub claim_status: ClaimStatus,
    pub claim_deadline: DateTimeUtc,
    pub claimed_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
