//! Container entity ("property"): the local grouping every remote task-list mirrors.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "containers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Unique among non-discarded containers (partial index, see `storage::db`).
    pub name: String,
    pub creator_id: Uuid,
    pub is_default: bool,
    pub is_private: bool,
    pub discarded_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::CreatorId",
        to = "super::account::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::tasklist::Entity")]
    Tasklists,
    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,
}

impl Related<super::tasklist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasklists.def()
    }
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether `account_id` may see this container's tasks.
    pub fn is_visible_to(&self, account_id: Uuid) -> bool {
        self.discarded_at.is_none() && (!self.is_private || self.creator_id == account_id)
    }
}
