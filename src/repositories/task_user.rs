//! Task-user link repository for database operations.

use anyhow::Result;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter};
use uuid::Uuid;

use crate::entities::task_user;

/// Repository for task-user link database operations.
pub struct TaskUserRepository;

impl TaskUserRepository {
    /// Get the link holding a remote task id.
    pub async fn get_by_google_id<C>(conn: &C, google_id: &str) -> Result<Option<task_user::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task_user::Entity::find()
            .filter(task_user::Column::GoogleId.eq(google_id))
            .one(conn)
            .await?)
    }

    /// Get the link between an account and a task.
    pub async fn get_for<C>(conn: &C, account_id: &Uuid, task_id: &Uuid) -> Result<Option<task_user::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task_user::Entity::find()
            .filter(task_user::Column::AccountId.eq(*account_id))
            .filter(task_user::Column::TaskId.eq(*task_id))
            .one(conn)
            .await?)
    }

    /// Insert a new link.
    pub async fn create<C>(conn: &C, link: task_user::Model) -> Result<task_user::Model>
    where
        C: ConnectionTrait,
    {
        Ok(link.into_active_model().reset_all().insert(conn).await?)
    }

    /// Write every field of an existing link.
    pub async fn update<C>(conn: &C, link: task_user::Model) -> Result<task_user::Model>
    where
        C: ConnectionTrait,
    {
        Ok(link.into_active_model().reset_all().update(conn).await?)
    }
}
