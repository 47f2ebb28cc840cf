//! Local storage module for the synchronized data set
//!
//! This module owns the SeaORM connection and the schema for:
//! - Accounts
//! - Containers
//! - Tasklist links
//! - Tasks
//! - Task-user links

pub mod db;

pub use db::LocalStorage;
