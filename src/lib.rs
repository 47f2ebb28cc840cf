//! PromiseTasks - two-way sync between local task-lists and Google Tasks
//!
//! Every linked account mirrors its remote task-lists onto shared local
//! containers ("properties") and its remote tasks onto shared local tasks.
//! Per-account links carry the remote ids and the remote `updated` timestamps
//! used to decide, item by item, whether to pull or push.
//!
//! # Modules
//!
//! * [`config`] - Application configuration management
//! * [`credentials`] - Access-token refresh for linked accounts
//! * [`backend`] - Remote task API abstraction and the Google Tasks client
//! * [`storage`] - Local database and schema
//! * [`sync`] - Reconciliation engine and background worker

/// Remote task API abstraction
pub mod backend;

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// OAuth token management
pub mod credentials;

/// SeaORM entity models for database tables
pub mod entities;

/// Logging setup
pub mod logger;

/// Repository layer for database operations
pub mod repositories;

/// Local storage layer
pub mod storage;

/// Synchronization engine for keeping local and remote data in sync
pub mod sync;

// Re-export entity models for convenient access
pub use entities::{account, container, task, task_user, tasklist};
