//! Repository layer for database operations.
//!
//! This module provides repository structs that encapsulate database queries
//! and operations, following the Data Mapper pattern recommended by SeaORM.
//! Repositories keep entities as pure data models while providing the lookups
//! the sync engine relies on: by remote id, by natural key (container name,
//! task title), and plain create/update.

pub mod account;
pub mod container;
pub mod task;
pub mod task_user;
pub mod tasklist;

pub use account::AccountRepository;
pub use container::ContainerRepository;
pub use task::TaskRepository;
pub use task_user::TaskUserRepository;
pub use tasklist::TasklistRepository;
