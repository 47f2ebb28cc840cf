//! Task repository for database operations.

use anyhow::Result;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::task;

/// Repository for task-related database operations.
///
/// Every write recomputes `needs_more_info` and `position_int`, so callers never
/// persist a stale derived value.
pub struct TaskRepository;

impl TaskRepository {
    /// Get a single task by id.
    pub async fn get_by_id<C>(conn: &C, id: &Uuid) -> Result<Option<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find_by_id(*id).one(conn).await?)
    }

    /// Find a task by its natural key: title within a container.
    pub async fn find_by_title<C>(conn: &C, container_id: &Uuid, title: &str) -> Result<Option<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::ContainerId.eq(*container_id))
            .filter(task::Column::Title.eq(title))
            .order_by_asc(task::Column::PositionInt)
            .one(conn)
            .await?)
    }

    /// Get all non-deleted tasks for a container in remote order.
    pub async fn get_for_container<C>(conn: &C, container_id: &Uuid) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::ContainerId.eq(*container_id))
            .filter(task::Column::Deleted.eq(false))
            .order_by_asc(task::Column::PositionInt)
            .all(conn)
            .await?)
    }

    /// Count every task row, deleted or not.
    pub async fn count<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        use sea_orm::PaginatorTrait;
        Ok(task::Entity::find().count(conn).await?)
    }

    /// Insert a new task.
    pub async fn create<C>(conn: &C, task: task::Model) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        Ok(Self::with_derived_fields(task)
            .into_active_model()
            .reset_all()
            .insert(conn)
            .await?)
    }

    /// Write every field of an existing task.
    pub async fn update<C>(conn: &C, task: task::Model) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        Ok(Self::with_derived_fields(task)
            .into_active_model()
            .reset_all()
            .update(conn)
            .await?)
    }

    fn with_derived_fields(mut task: task::Model) -> task::Model {
        task.position_int = task::position_to_int(task.position.as_deref());
        task.needs_more_info = task.compute_needs_more_info();
        task
    }
}
