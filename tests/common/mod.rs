#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use promisetasks::backend::{
    BackendError, MalformedItem, RemoteItems, RemoteTask, RemoteTaskList, TaskBackend, TaskPayload, TaskStatus,
};
use promisetasks::credentials::{AccessToken, CredentialError, CredentialProvider};
use promisetasks::entities::{account, container, task, tasklist};
use promisetasks::repositories::{AccountRepository, ContainerRepository, TaskRepository, TasklistRepository};
use promisetasks::storage::LocalStorage;
use promisetasks::sync::{ProgressReporter, SyncService};

/// Fixed timestamps: `at(10)` is 2024-05-01 10:00 UTC.
pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

pub fn remote_list(id: &str, title: &str, updated: DateTime<Utc>) -> RemoteTaskList {
    RemoteTaskList {
        id: id.to_string(),
        title: title.to_string(),
        updated,
        self_link: None,
    }
}

pub fn remote_task(id: &str, title: &str, updated: DateTime<Utc>) -> RemoteTask {
    RemoteTask {
        id: id.to_string(),
        title: title.to_string(),
        notes: None,
        status: TaskStatus::NeedsAction,
        due: None,
        completed: None,
        deleted: false,
        hidden: false,
        position: Some("00000000000000000001".to_string()),
        parent: None,
        updated,
    }
}

#[derive(Default)]
pub struct FakeState {
    pub default_list: Option<RemoteTaskList>,
    pub lists: Vec<RemoteTaskList>,
    pub malformed_lists: Vec<MalformedItem>,
    pub tasks: HashMap<String, Vec<RemoteTask>>,
    pub malformed_tasks: HashMap<String, Vec<MalformedItem>>,
    /// Status returned by `list_tasks` for these list ids.
    pub failing_lists: HashMap<String, u16>,
    /// Every call as `"<method> <args>"`.
    pub calls: Vec<String>,
    /// Timestamp stamped on remote writes.
    pub clock: Option<DateTime<Utc>>,
    next_id: usize,
}

/// In-memory remote that records every call.
#[derive(Default)]
pub struct FakeBackend {
    pub state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_default_list(&self, list: RemoteTaskList) {
        self.state.lock().unwrap().default_list = Some(list);
    }

    /// Makes `get_default_task_list` fail with a 404 again.
    pub fn clear_default_list(&self) {
        self.state.lock().unwrap().default_list = None;
    }

    /// Removes a task remotely without going through the sync service.
    pub fn drop_task(&self, list_id: &str, task_id: &str) {
        if let Some(tasks) = self.state.lock().unwrap().tasks.get_mut(list_id) {
            tasks.retain(|t| t.id != task_id);
        }
    }

    /// Adds a list to the listing (the default list must be added too to appear there).
    pub fn add_list(&self, list: RemoteTaskList) {
        self.state.lock().unwrap().lists.push(list);
    }

    pub fn add_task(&self, list_id: &str, task: RemoteTask) {
        self.state
            .lock()
            .unwrap()
            .tasks
            .entry(list_id.to_string())
            .or_default()
            .push(task);
    }

    pub fn replace_task(&self, list_id: &str, task: RemoteTask) {
        let mut state = self.state.lock().unwrap();
        let tasks = state.tasks.entry(list_id.to_string()).or_default();
        tasks.retain(|t| t.id != task.id);
        tasks.push(task);
    }

    pub fn update_list(&self, list: RemoteTaskList) {
        let mut state = self.state.lock().unwrap();
        if state.default_list.as_ref().is_some_and(|l| l.id == list.id) {
            state.default_list = Some(list.clone());
        }
        state.lists.retain(|l| l.id != list.id);
        state.lists.push(list);
    }

    pub fn set_clock(&self, clock: DateTime<Utc>) {
        self.state.lock().unwrap().clock = Some(clock);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.split(' ').next() == Some(method))
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn remote_tasks(&self, list_id: &str) -> Vec<RemoteTask> {
        self.state.lock().unwrap().tasks.get(list_id).cloned().unwrap_or_default()
    }

    fn record(&self, call: String) -> std::sync::MutexGuard<'_, FakeState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

impl FakeState {
    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(|| at(12))
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

fn not_found() -> BackendError {
    BackendError::Api {
        status: 404,
        body: "Not Found".to_string(),
    }
}

#[async_trait]
impl TaskBackend for FakeBackend {
    fn backend_type(&self) -> &str {
        "fake"
    }

    async fn list_task_lists(&self, _token: &AccessToken) -> Result<RemoteItems<RemoteTaskList>, BackendError> {
        let state = self.record("list_task_lists".to_string());
        Ok(RemoteItems {
            items: state.lists.clone(),
            malformed: state.malformed_lists.clone(),
        })
    }

    async fn get_default_task_list(&self, _token: &AccessToken) -> Result<RemoteTaskList, BackendError> {
        let state = self.record("get_default_task_list".to_string());
        state.default_list.clone().ok_or_else(not_found)
    }

    async fn insert_task_list(&self, _token: &AccessToken, title: &str) -> Result<RemoteTaskList, BackendError> {
        let mut state = self.record(format!("insert_task_list {}", title));
        let id = state.next_id("list");
        let list = remote_list(&id, title, state.now());
        state.lists.push(list.clone());
        Ok(list)
    }

    async fn update_task_list(
        &self,
        _token: &AccessToken,
        list_id: &str,
        title: &str,
    ) -> Result<RemoteTaskList, BackendError> {
        let mut state = self.record(format!("update_task_list {} {}", list_id, title));
        let now = state.now();
        let list = state.lists.iter_mut().find(|l| l.id == list_id).ok_or_else(not_found)?;
        list.title = title.to_string();
        list.updated = now;
        Ok(list.clone())
    }

    async fn list_tasks(&self, _token: &AccessToken, list_id: &str) -> Result<RemoteItems<RemoteTask>, BackendError> {
        let state = self.record(format!("list_tasks {}", list_id));
        if let Some(status) = state.failing_lists.get(list_id) {
            return Err(BackendError::Api {
                status: *status,
                body: "backend failure".to_string(),
            });
        }
        Ok(RemoteItems {
            items: state.tasks.get(list_id).cloned().unwrap_or_default(),
            malformed: state.malformed_tasks.get(list_id).cloned().unwrap_or_default(),
        })
    }

    async fn insert_task(
        &self,
        _token: &AccessToken,
        list_id: &str,
        payload: &TaskPayload,
        parent: Option<&str>,
    ) -> Result<RemoteTask, BackendError> {
        let mut state = self.record(format!("insert_task {} {}", list_id, payload.title));
        let id = state.next_id("task");
        let mut task = remote_task(&id, &payload.title, state.now());
        task.notes = payload.notes.clone();
        task.due = payload.due;
        task.status = payload.status;
        task.completed = payload.completed;
        task.parent = parent.map(String::from);
        state.tasks.entry(list_id.to_string()).or_default().push(task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        _token: &AccessToken,
        list_id: &str,
        task_id: &str,
        payload: &TaskPayload,
    ) -> Result<RemoteTask, BackendError> {
        let mut state = self.record(format!("update_task {} {}", list_id, task_id));
        let now = state.now();
        let task = state
            .tasks
            .get_mut(list_id)
            .and_then(|tasks| tasks.iter_mut().find(|t| t.id == task_id))
            .ok_or_else(not_found)?;
        task.title = payload.title.clone();
        task.notes = payload.notes.clone();
        task.due = payload.due;
        task.status = payload.status;
        task.completed = payload.completed;
        task.deleted = payload.deleted;
        task.updated = now;
        Ok(task.clone())
    }

    async fn delete_task(&self, _token: &AccessToken, list_id: &str, task_id: &str) -> Result<(), BackendError> {
        let mut state = self.record(format!("delete_task {} {}", list_id, task_id));
        let tasks = state.tasks.get_mut(list_id).ok_or_else(not_found)?;
        let before = tasks.len();
        tasks.retain(|t| t.id != task_id);
        if tasks.len() == before {
            return Err(not_found());
        }
        Ok(())
    }

    async fn move_task(
        &self,
        _token: &AccessToken,
        list_id: &str,
        task_id: &str,
        parent: Option<&str>,
        previous: Option<&str>,
    ) -> Result<RemoteTask, BackendError> {
        let mut state = self.record(format!(
            "move_task {} {} {} {}",
            list_id,
            task_id,
            parent.unwrap_or("-"),
            previous.unwrap_or("-")
        ));
        let now = state.now();
        let task = state
            .tasks
            .get_mut(list_id)
            .and_then(|tasks| tasks.iter_mut().find(|t| t.id == task_id))
            .ok_or_else(not_found)?;
        task.parent = parent.map(String::from);
        task.position = Some("00000000000000000099".to_string());
        task.updated = now;
        Ok(task.clone())
    }
}

/// Always hands out the same token.
pub struct StaticCredentials;

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn ensure_fresh(&self, _account: &account::Model) -> Result<AccessToken, CredentialError> {
        Ok(AccessToken::new("test-token"))
    }
}

/// Fails like a revoked refresh token.
pub struct RevokedCredentials;

#[async_trait]
impl CredentialProvider for RevokedCredentials {
    async fn ensure_fresh(&self, _account: &account::Model) -> Result<AccessToken, CredentialError> {
        Err(CredentialError::Unauthorized("invalid_grant: Token has been expired or revoked.".to_string()))
    }
}

/// Records every progress update.
#[derive(Default)]
pub struct RecordingProgress {
    pub updates: Mutex<Vec<(usize, usize, String)>>,
}

impl ProgressReporter for RecordingProgress {
    fn on_progress(&self, current: usize, max: usize, message: &str) -> anyhow::Result<()> {
        self.updates.lock().unwrap().push((current, max, message.to_string()));
        Ok(())
    }
}

/// Always fails.
pub struct BrokenProgress;

impl ProgressReporter for BrokenProgress {
    fn on_progress(&self, _current: usize, _max: usize, _message: &str) -> anyhow::Result<()> {
        anyhow::bail!("job tracker unavailable")
    }
}

pub struct Harness {
    pub storage: LocalStorage,
    pub backend: Arc<FakeBackend>,
    pub service: SyncService,
    pub account: account::Model,
}

impl Harness {
    pub async fn new() -> Self {
        let storage = LocalStorage::in_memory().await.unwrap();
        let backend = FakeBackend::new();
        let service = SyncService::new(storage.clone(), backend.clone(), Arc::new(StaticCredentials));
        let account = seed_account(&storage, "Dana").await;
        Self {
            storage,
            backend,
            service,
            account,
        }
    }

    pub async fn containers(&self) -> Vec<container::Model> {
        ContainerRepository::get_all(&self.storage.conn).await.unwrap()
    }

    pub async fn links(&self) -> Vec<tasklist::Model> {
        TasklistRepository::get_for_account(&self.storage.conn, &self.account.id)
            .await
            .unwrap()
    }

    pub async fn task_count(&self) -> u64 {
        TaskRepository::count(&self.storage.conn).await.unwrap()
    }
}

pub async fn seed_account(storage: &LocalStorage, name: &str) -> account::Model {
    AccountRepository::create(
        &storage.conn,
        account::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            oauth_id: Some(format!("google-{}", name.to_lowercase())),
            oauth_token: Some("stored-token".to_string()),
            oauth_refresh_token: Some("stored-refresh".to_string()),
            oauth_expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        },
    )
    .await
    .unwrap()
}

pub async fn seed_container(storage: &LocalStorage, name: &str, creator: &account::Model, is_private: bool) -> container::Model {
    ContainerRepository::create(
        &storage.conn,
        container::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            creator_id: creator.id,
            is_default: false,
            is_private,
            discarded_at: None,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_link(
    storage: &LocalStorage,
    account: &account::Model,
    container: &container::Model,
    google_id: Option<&str>,
    updated: Option<DateTime<Utc>>,
) -> tasklist::Model {
    TasklistRepository::create(
        &storage.conn,
        tasklist::Model {
            id: Uuid::new_v4(),
            account_id: account.id,
            container_id: container.id,
            google_id: google_id.map(String::from),
            updated,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_task(storage: &LocalStorage, container: &container::Model, creator: &account::Model, title: &str) -> task::Model {
    TaskRepository::create(
        &storage.conn,
        task::Model {
            id: Uuid::new_v4(),
            container_id: Some(container.id),
            creator_id: creator.id,
            owner_id: creator.id,
            title: title.to_string(),
            notes: None,
            due: None,
            completed_at: None,
            deleted: false,
            hidden: false,
            google_id: None,
            parent_id: None,
            position: None,
            position_int: 0,
            priority: None,
            budget_cents: None,
            needs_more_info: true,
        },
    )
    .await
    .unwrap()
}
