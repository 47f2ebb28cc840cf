//! Container repository for database operations.

use anyhow::Result;
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::container;

/// Repository for container-related database operations.
pub struct ContainerRepository;

impl ContainerRepository {
    /// Get a single container by id.
    pub async fn get_by_id<C>(conn: &C, id: &Uuid) -> Result<Option<container::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(container::Entity::find_by_id(*id).one(conn).await?)
    }

    /// Find the live container with exactly this name (case-sensitive).
    pub async fn find_by_name<C>(conn: &C, name: &str) -> Result<Option<container::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(container::Entity::find()
            .filter(container::Column::Name.eq(name))
            .filter(container::Column::DiscardedAt.is_null())
            .one(conn)
            .await?)
    }

    /// Find the default container created by `creator_id`, if any.
    pub async fn get_default_for<C>(conn: &C, creator_id: &Uuid) -> Result<Option<container::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(container::Entity::find()
            .filter(container::Column::CreatorId.eq(*creator_id))
            .filter(container::Column::IsDefault.eq(true))
            .filter(container::Column::DiscardedAt.is_null())
            .one(conn)
            .await?)
    }

    /// Get all live containers ordered by name.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<container::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(container::Entity::find()
            .filter(container::Column::DiscardedAt.is_null())
            .order_by_asc(container::Column::Name)
            .all(conn)
            .await?)
    }

    /// Create a new container.
    pub async fn create<C>(conn: &C, container: container::Model) -> Result<container::Model>
    where
        C: ConnectionTrait,
    {
        Ok(container.into_active_model().reset_all().insert(conn).await?)
    }

    /// Rename a container.
    pub async fn rename<C>(conn: &C, container: container::Model, name: &str) -> Result<container::Model>
    where
        C: ConnectionTrait,
    {
        let mut active_model = container.into_active_model();
        active_model.name = ActiveValue::Set(name.to_string());
        Ok(active_model.update(conn).await?)
    }
}
