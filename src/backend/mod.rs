//! Remote task API abstraction.
//!
//! This module defines the interface the sync engine uses to talk to the remote
//! task service, the typed payloads it exchanges, and the error taxonomy for
//! remote calls. Payloads are decoded once here; the reconcilers only ever see
//! [`RemoteTaskList`] and [`RemoteTask`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::credentials::AccessToken;

pub mod google;

/// Common error types for remote operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The remote answered with a non-2xx status.
    #[error("Remote API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Invalid data: {0}")]
    Decode(String),
}

impl BackendError {
    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether re-running the whole pass later may succeed.
    ///
    /// 4xx answers are final for the item; 5xx and transport failures are left
    /// to the outer job retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Api { status, .. } => *status >= 500,
            BackendError::Transport(_) => true,
            BackendError::Decode(_) => false,
        }
    }
}

/// A remote task-list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTaskList {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub self_link: Option<String>,
}

/// Completion status of a remote task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    #[default]
    NeedsAction,
    Completed,
}

/// A remote task.
///
/// `deleted` and `hidden` are absent from most payloads and default to `false`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTask {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    pub updated: DateTime<Utc>,
}

/// Body sent when inserting or updating a remote task.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    /// Always sent so that reopening a task clears the remote completion.
    pub completed: Option<DateTime<Utc>>,
    pub deleted: bool,
}

/// A list item the remote returned but that could not be decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct MalformedItem {
    pub id: Option<String>,
    pub reason: String,
}

/// One page of decoded list items plus the items that failed to decode.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteItems<T> {
    pub items: Vec<T>,
    pub malformed: Vec<MalformedItem>,
}

impl<T> Default for RemoteItems<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            malformed: Vec::new(),
        }
    }
}

impl<T: DeserializeOwned> RemoteItems<T> {
    /// Decode raw list items one by one so a single bad item cannot sink the page.
    pub fn decode(values: Vec<serde_json::Value>) -> Self {
        let mut decoded = Self::default();
        for value in values {
            let id = value.get("id").and_then(|v| v.as_str()).map(String::from);
            match serde_json::from_value::<T>(value) {
                Ok(item) => decoded.items.push(item),
                Err(e) => decoded.malformed.push(MalformedItem {
                    id,
                    reason: e.to_string(),
                }),
            }
        }
        decoded
    }
}

/// Interface to the remote task service.
///
/// Every call takes a live access token; list calls return a single page.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Returns the backend type identifier (e.g., "google").
    fn backend_type(&self) -> &str;

    // Task-lists
    async fn list_task_lists(&self, token: &AccessToken) -> Result<RemoteItems<RemoteTaskList>, BackendError>;
    async fn get_default_task_list(&self, token: &AccessToken) -> Result<RemoteTaskList, BackendError>;
    async fn insert_task_list(&self, token: &AccessToken, title: &str) -> Result<RemoteTaskList, BackendError>;
    async fn update_task_list(
        &self,
        token: &AccessToken,
        list_id: &str,
        title: &str,
    ) -> Result<RemoteTaskList, BackendError>;

    // Tasks
    async fn list_tasks(&self, token: &AccessToken, list_id: &str) -> Result<RemoteItems<RemoteTask>, BackendError>;
    async fn insert_task(
        &self,
        token: &AccessToken,
        list_id: &str,
        payload: &TaskPayload,
        parent: Option<&str>,
    ) -> Result<RemoteTask, BackendError>;
    async fn update_task(
        &self,
        token: &AccessToken,
        list_id: &str,
        task_id: &str,
        payload: &TaskPayload,
    ) -> Result<RemoteTask, BackendError>;
    async fn delete_task(&self, token: &AccessToken, list_id: &str, task_id: &str) -> Result<(), BackendError>;
    async fn move_task(
        &self,
        token: &AccessToken,
        list_id: &str,
        task_id: &str,
        parent: Option<&str>,
        previous: Option<&str>,
    ) -> Result<RemoteTask, BackendError>;
}
