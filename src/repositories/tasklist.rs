//! Tasklist link repository for database operations.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter};
use uuid::Uuid;

use crate::entities::tasklist;

/// Repository for tasklist-link database operations.
pub struct TasklistRepository;

impl TasklistRepository {
    /// Get the link an account holds for a remote task-list id.
    pub async fn get_by_google_id<C>(conn: &C, account_id: &Uuid, google_id: &str) -> Result<Option<tasklist::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(tasklist::Entity::find()
            .filter(tasklist::Column::AccountId.eq(*account_id))
            .filter(tasklist::Column::GoogleId.eq(google_id))
            .one(conn)
            .await?)
    }

    /// Get the link between an account and a container.
    pub async fn get_for<C>(conn: &C, account_id: &Uuid, container_id: &Uuid) -> Result<Option<tasklist::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(tasklist::Entity::find()
            .filter(tasklist::Column::AccountId.eq(*account_id))
            .filter(tasklist::Column::ContainerId.eq(*container_id))
            .one(conn)
            .await?)
    }

    /// Get all links of an account.
    pub async fn get_for_account<C>(conn: &C, account_id: &Uuid) -> Result<Vec<tasklist::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(tasklist::Entity::find()
            .filter(tasklist::Column::AccountId.eq(*account_id))
            .all(conn)
            .await?)
    }

    /// Get the links of an account that were never inserted remotely.
    pub async fn get_unsynced_for_account<C>(conn: &C, account_id: &Uuid) -> Result<Vec<tasklist::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(tasklist::Entity::find()
            .filter(tasklist::Column::AccountId.eq(*account_id))
            .filter(tasklist::Column::GoogleId.is_null())
            .all(conn)
            .await?)
    }

    /// Create a new link.
    pub async fn create<C>(conn: &C, link: tasklist::Model) -> Result<tasklist::Model>
    where
        C: ConnectionTrait,
    {
        Ok(link.into_active_model().reset_all().insert(conn).await?)
    }

    /// Record the remote id and remote timestamp of a link.
    pub async fn set_remote<C>(
        conn: &C,
        link: tasklist::Model,
        google_id: &str,
        updated: DateTime<Utc>,
    ) -> Result<tasklist::Model>
    where
        C: ConnectionTrait,
    {
        let mut active_model = link.into_active_model();
        active_model.google_id = ActiveValue::Set(Some(google_id.to_string()));
        active_model.updated = ActiveValue::Set(Some(updated));
        Ok(active_model.update(conn).await?)
    }

    /// Record only the remote timestamp of a link.
    pub async fn touch<C>(conn: &C, link: tasklist::Model, updated: DateTime<Utc>) -> Result<tasklist::Model>
    where
        C: ConnectionTrait,
    {
        let mut active_model = link.into_active_model();
        active_model.updated = ActiveValue::Set(Some(updated));
        Ok(active_model.update(conn).await?)
    }
}
