use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityName, EntityTrait, Schema};

use crate::entities::{account, container, task, task_user, tasklist};

/// Local storage manager for accounts, containers, tasks and their sync links
#[derive(Clone)]
pub struct LocalStorage {
    pub conn: DatabaseConnection,
}

impl LocalStorage {
    /// Open (or create) the database at `database_url` and make sure the schema exists.
    pub async fn new(database_url: &str) -> Result<Self> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options
            .max_connections(4)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .with_context(|| format!("Failed to open database: {}", database_url))?;

        let storage = LocalStorage { conn };
        storage.init_schema().await?;
        info!("Local storage ready at {}", database_url);
        Ok(storage)
    }

    /// Initialize a private in-memory database.
    ///
    /// A single pooled connection is kept so every query sees the same memory database.
    pub async fn in_memory() -> Result<Self> {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(options).await?;
        let storage = LocalStorage { conn };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        self.create_table(account::Entity).await?;
        self.create_table(container::Entity).await?;
        self.create_table(tasklist::Entity).await?;
        self.create_table(task::Entity).await?;
        self.create_table(task_user::Entity).await?;

        // Container names only need to be unique among live rows.
        self.conn
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_containers_live_name \
                 ON containers (name) WHERE discarded_at IS NULL",
            )
            .await?;
        self.conn
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_tasklists_account_container \
                 ON tasklists (account_id, container_id)",
            )
            .await?;
        self.conn
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_task_users_account_task \
                 ON task_users (account_id, task_id)",
            )
            .await?;
        self.conn
            .execute_unprepared("CREATE INDEX IF NOT EXISTS idx_tasks_container_title ON tasks (container_id, title)")
            .await?;

        Ok(())
    }

    async fn create_table<E>(&self, entity: E) -> Result<()>
    where
        E: EntityTrait,
    {
        debug!("Ensuring table {}", entity.table_name());

        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);
        let mut statement = schema.create_table_from_entity(entity);
        statement.if_not_exists();
        self.conn.execute(backend.build(&statement)).await?;
        Ok(())
    }
}
