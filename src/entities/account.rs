//! Account entity: a person with a linked Google identity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Remote subject id, set once the account has authenticated with Google.
    #[sea_orm(unique)]
    pub oauth_id: Option<String>,
    #[serde(skip_serializing)]
    pub oauth_token: Option<String>,
    #[serde(skip_serializing)]
    pub oauth_refresh_token: Option<String>,
    pub oauth_expires_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tasklist::Entity")]
    Tasklists,
    #[sea_orm(has_many = "super::task_user::Entity")]
    TaskUsers,
}

impl Related<super::tasklist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasklists.def()
    }
}

impl Related<super::task_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaskUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the account has ever completed the remote authentication flow.
    pub fn is_linked(&self) -> bool {
        self.oauth_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}
