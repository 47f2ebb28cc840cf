//! Google Tasks implementation of [`TaskBackend`].

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{header, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};

use super::{BackendError, RemoteItems, RemoteTask, RemoteTaskList, TaskBackend, TaskPayload};
use crate::credentials::AccessToken;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemsEnvelope {
    #[serde(default)]
    items: Vec<serde_json::Value>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Google Tasks REST client.
pub struct GoogleTasksBackend {
    client: Client,
    base_url: String,
}

impl GoogleTasksBackend {
    /// Create a client against `base_url` (e.g. `https://tasks.googleapis.com/tasks/v1`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, token: &AccessToken) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token.as_str())
            .header(header::CONTENT_TYPE, "application/json")
    }

    async fn execute(request: RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = request.send().await.map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, BackendError> {
        let response = Self::execute(request).await?;
        let body = response.text().await.map_err(|e| BackendError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn send_items<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<RemoteItems<T>, BackendError> {
        let envelope: ItemsEnvelope = Self::send(request).await?;
        if envelope.next_page_token.is_some() {
            // Only the first page is read.
            warn!("Remote returned more {} than one page; later pages are not synced", what);
        }
        let decoded = RemoteItems::decode(envelope.items);
        debug!(
            "Decoded {} {} ({} malformed)",
            decoded.items.len(),
            what,
            decoded.malformed.len()
        );
        Ok(decoded)
    }
}

#[async_trait]
impl TaskBackend for GoogleTasksBackend {
    fn backend_type(&self) -> &str {
        "google"
    }

    async fn list_task_lists(&self, token: &AccessToken) -> Result<RemoteItems<RemoteTaskList>, BackendError> {
        Self::send_items(self.request(Method::GET, "/users/@me/lists", token), "task-lists").await
    }

    async fn get_default_task_list(&self, token: &AccessToken) -> Result<RemoteTaskList, BackendError> {
        Self::send(self.request(Method::GET, "/users/@me/lists/@default", token)).await
    }

    async fn insert_task_list(&self, token: &AccessToken, title: &str) -> Result<RemoteTaskList, BackendError> {
        let request = self
            .request(Method::POST, "/users/@me/lists", token)
            .json(&serde_json::json!({ "title": title }));
        Self::send(request).await
    }

    async fn update_task_list(
        &self,
        token: &AccessToken,
        list_id: &str,
        title: &str,
    ) -> Result<RemoteTaskList, BackendError> {
        let request = self
            .request(Method::PATCH, &format!("/users/@me/lists/{}", list_id), token)
            .json(&serde_json::json!({ "title": title }));
        Self::send(request).await
    }

    async fn list_tasks(&self, token: &AccessToken, list_id: &str) -> Result<RemoteItems<RemoteTask>, BackendError> {
        let request = self
            .request(Method::GET, &format!("/lists/{}/tasks", list_id), token)
            .query(&[("showCompleted", "true"), ("showHidden", "true")]);
        Self::send_items(request, "tasks").await
    }

    async fn insert_task(
        &self,
        token: &AccessToken,
        list_id: &str,
        payload: &TaskPayload,
        parent: Option<&str>,
    ) -> Result<RemoteTask, BackendError> {
        let mut request = self
            .request(Method::POST, &format!("/lists/{}/tasks", list_id), token)
            .json(payload);
        if let Some(parent) = parent {
            request = request.query(&[("parent", parent)]);
        }
        Self::send(request).await
    }

    async fn update_task(
        &self,
        token: &AccessToken,
        list_id: &str,
        task_id: &str,
        payload: &TaskPayload,
    ) -> Result<RemoteTask, BackendError> {
        let request = self
            .request(Method::PATCH, &format!("/lists/{}/tasks/{}", list_id, task_id), token)
            .json(payload);
        Self::send(request).await
    }

    async fn delete_task(&self, token: &AccessToken, list_id: &str, task_id: &str) -> Result<(), BackendError> {
        let request = self.request(Method::DELETE, &format!("/lists/{}/tasks/{}", list_id, task_id), token);
        Self::execute(request).await?;
        Ok(())
    }

    async fn move_task(
        &self,
        token: &AccessToken,
        list_id: &str,
        task_id: &str,
        parent: Option<&str>,
        previous: Option<&str>,
    ) -> Result<RemoteTask, BackendError> {
        let mut query = Vec::new();
        if let Some(parent) = parent {
            query.push(("parent", parent));
        }
        if let Some(previous) = previous {
            query.push(("previous", previous));
        }
        let request = self
            .request(Method::POST, &format!("/lists/{}/tasks/{}/move", list_id, task_id), token)
            .query(&query);
        Self::send(request).await
    }
}
