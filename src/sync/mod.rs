//! Synchronization service module for PromiseTasks.
//!
//! This module provides the [`SyncService`] struct which runs a two-way sync pass
//! between one account's remote task-lists and the shared local containers and
//! tasks. A pass walks a fixed sequence of phases ([`SyncPhase`]):
//!
//! 1. Obtain a fresh access token (abort with `CredentialFailed` otherwise)
//! 2. Fetch and reconcile the default task-list
//! 3. Fetch and reconcile every other task-list, then push local-only lists
//! 4. Fetch every linked list's tasks and reconcile them one by one
//! 5. Push visible local tasks the remote has never seen
//!
//! Item-level failures are recorded in the [`SyncReport`] and never abort the
//! pass. Only one pass runs at a time per service; concurrent callers wait.

pub mod error;
pub mod progress;
pub mod report;
pub mod tasklists;
pub mod tasks;
pub mod worker;

pub use error::SyncError;
pub use progress::{LogProgress, ProgressReporter};
pub use report::{SyncIssue, SyncOutcome, SyncPhase, SyncReport};
pub use worker::{SyncHandle, SyncWorker};

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use log::{error, info, warn};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::backend::{RemoteItems, RemoteTask, RemoteTaskList, TaskBackend};
use crate::credentials::{AccessToken, CredentialProvider};
use crate::entities::{account, tasklist};
use crate::repositories::{AccountRepository, TasklistRepository};
use crate::storage::LocalStorage;

/// Service that reconciles remote task-lists and tasks with local storage.
///
/// Cloning is cheap and clones share the same pass lock.
#[derive(Clone)]
pub struct SyncService {
    storage: LocalStorage,
    backend: Arc<dyn TaskBackend>,
    credentials: Arc<dyn CredentialProvider>,
    progress: Arc<dyn ProgressReporter>,
    sync_lock: Arc<Mutex<()>>,
}

impl SyncService {
    pub fn new(
        storage: LocalStorage,
        backend: Arc<dyn TaskBackend>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            storage,
            backend,
            credentials,
            progress: Arc::new(LogProgress),
            sync_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Replace the default log-based progress reporter.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Checks if a pass is currently holding the lock.
    pub fn is_syncing(&self) -> bool {
        self.sync_lock.try_lock().is_err()
    }

    /// Runs one full pass for an account and reports through the service's reporter.
    pub async fn sync_account(&self, account_id: &Uuid) -> SyncReport {
        let progress = self.progress.clone();
        self.sync_account_with_progress(account_id, progress.as_ref()).await
    }

    /// Runs one full pass for an account.
    ///
    /// Never returns an error: every failure ends up in the report.
    pub async fn sync_account_with_progress(&self, account_id: &Uuid, progress: &dyn ProgressReporter) -> SyncReport {
        let _guard = self.sync_lock.lock().await;
        info!("🔄 Starting sync for account {}", account_id);

        let (account, token) = match self.authenticate(account_id).await {
            Ok(ready) => ready,
            Err(e) => {
                error!("❌ Sync aborted for account {}: {}", account_id, e);
                return SyncReport::credential_failed(*account_id, &e).finish();
            }
        };

        let mut report = SyncReport::new(*account_id);
        report.advance(SyncPhase::TokenEnsured);

        let links = self.sync_tasklists(&account, &token, &mut report, progress).await;
        self.sync_tasks(&account, &token, &links, &mut report, progress).await;

        let report = report.finish();
        if report.is_success() {
            info!("{}", report.summary());
        } else {
            warn!("{}", report.summary());
        }
        report
    }

    /// Runs a pass for every linked account, one after the other.
    pub async fn sync_all(&self) -> Result<Vec<SyncReport>> {
        let accounts = AccountRepository::get_linked(&self.storage.conn).await?;
        info!("🔄 Syncing {} linked accounts", accounts.len());

        let mut reports = Vec::with_capacity(accounts.len());
        for account in accounts {
            reports.push(self.sync_account(&account.id).await);
        }
        Ok(reports)
    }

    /// Pushes local-only lists and tasks without pulling anything.
    pub async fn push_local_changes(&self, account_id: &Uuid) -> SyncReport {
        let _guard = self.sync_lock.lock().await;
        info!("⬆️ Pushing local changes for account {}", account_id);

        let (account, token) = match self.authenticate(account_id).await {
            Ok(ready) => ready,
            Err(e) => return SyncReport::credential_failed(*account_id, &e).finish(),
        };

        let mut report = SyncReport::new(*account_id);
        report.advance(SyncPhase::TokenEnsured);
        self.push_unsynced_tasklists(&account, &token, &mut report).await;
        report.advance(SyncPhase::ListsReconciled);

        match TasklistRepository::get_for_account(&self.storage.conn, &account.id).await {
            Ok(links) => {
                for link in links.iter().filter(|l| l.google_id.is_some()) {
                    self.push_local_only_tasks(&account, &token, link, &HashSet::new(), &mut report)
                        .await;
                }
            }
            Err(e) => report.record_error("task-lists", &SyncError::from(e)),
        }

        report.finish()
    }

    async fn authenticate(&self, account_id: &Uuid) -> Result<(account::Model, AccessToken), SyncError> {
        let account = AccountRepository::get_by_id(&self.storage.conn, account_id)
            .await?
            .ok_or(SyncError::AccountNotFound(*account_id))?;
        let token = self.credentials.ensure_fresh(&account).await?;
        Ok((account, token))
    }

    fn notify(progress: &dyn ProgressReporter, current: usize, max: usize, message: &str) {
        if let Err(e) = progress.on_progress(current, max, message) {
            warn!("Progress reporter failed: {:#}", e);
        }
    }

    /// Reconcile the default list, then the others, then push local-only lists.
    ///
    /// Returns the links whose tasks should be synced.
    async fn sync_tasklists(
        &self,
        account: &account::Model,
        token: &AccessToken,
        report: &mut SyncReport,
        progress: &dyn ProgressReporter,
    ) -> Vec<tasklist::Model> {
        let mut links = Vec::new();

        let default_list = match self.backend.get_default_task_list(token).await {
            Ok(list) => Some(list),
            Err(e) => {
                report.record_error("default task-list", &SyncError::from(e));
                None
            }
        };
        report.advance(SyncPhase::DefaultListFetched);

        if let Some(default_list) = &default_list {
            self.reconcile_tasklist_into(account, token, default_list, true, &mut links, report)
                .await;
        }
        report.advance(SyncPhase::DefaultListReconciled);

        let remote_lists = match self.backend.list_task_lists(token).await {
            Ok(lists) => lists,
            Err(e) => {
                report.record_error("task-lists", &SyncError::from(e));
                RemoteItems::default()
            }
        };
        for malformed in &remote_lists.malformed {
            report.record_warning(format!(
                "Skipped malformed task-list {}: {}",
                malformed.id.as_deref().unwrap_or("<no id>"),
                malformed.reason
            ));
        }
        let default_id = default_list.as_ref().map(|l| l.id.as_str());
        let others: Vec<RemoteTaskList> = remote_lists
            .items
            .into_iter()
            .filter(|l| Some(l.id.as_str()) != default_id)
            .collect();
        report.advance(SyncPhase::OtherListsFetched);

        let list_count = others.len() + usize::from(default_list.is_some());
        Self::notify(progress, 0, list_count, "Task-lists fetched");

        for remote_list in &others {
            // Without the default id an unlinked list might be the default one.
            if default_list.is_none() && !self.is_linked_tasklist(account, remote_list, report).await {
                continue;
            }
            self.reconcile_tasklist_into(account, token, remote_list, false, &mut links, report)
                .await;
        }

        links.extend(self.push_unsynced_tasklists(account, token, report).await);
        report.advance(SyncPhase::ListsReconciled);
        Self::notify(progress, report.containers_processed, list_count, "Task-lists reconciled");

        links
    }

    async fn is_linked_tasklist(
        &self,
        account: &account::Model,
        remote_list: &RemoteTaskList,
        report: &mut SyncReport,
    ) -> bool {
        match TasklistRepository::get_by_google_id(&self.storage.conn, &account.id, &remote_list.id).await {
            Ok(Some(_)) => true,
            Ok(None) => {
                report.record_warning(format!(
                    "Skipped new task-list '{}' until the default task-list can be fetched",
                    remote_list.title
                ));
                false
            }
            Err(e) => {
                report.record_error(format!("task-list \"{}\"", remote_list.title), &SyncError::from(e));
                false
            }
        }
    }

    async fn reconcile_tasklist_into(
        &self,
        account: &account::Model,
        token: &AccessToken,
        remote_list: &RemoteTaskList,
        is_default: bool,
        links: &mut Vec<tasklist::Model>,
        report: &mut SyncReport,
    ) {
        match self.reconcile_tasklist(account, token, remote_list, is_default).await {
            Ok(link) => {
                report.containers_processed += 1;
                links.push(link);
            }
            Err(SyncError::MalformedPayload(reason)) => report.record_warning(reason),
            Err(e) => {
                error!("❌ Failed to sync task-list '{}': {}", remote_list.title, e);
                report.record_error(format!("task-list \"{}\"", remote_list.title), &e);
            }
        }
    }

    /// Fetch every linked list's tasks, reconcile them, then push local-only tasks.
    async fn sync_tasks(
        &self,
        account: &account::Model,
        token: &AccessToken,
        links: &[tasklist::Model],
        report: &mut SyncReport,
        progress: &dyn ProgressReporter,
    ) {
        let mut fetched: Vec<(&tasklist::Model, &str, RemoteItems<RemoteTask>)> = Vec::new();
        for link in links {
            let Some(list_gid) = link.google_id.as_deref() else {
                continue;
            };
            match self.backend.list_tasks(token, list_gid).await {
                Ok(items) => fetched.push((link, list_gid, items)),
                Err(e) => report.record_error(format!("tasks of task-list {}", list_gid), &SyncError::from(e)),
            }
        }
        report.advance(SyncPhase::TasksFetched);

        let task_count: usize = fetched.iter().map(|(_, _, items)| items.items.len()).sum();
        info!("✅ Fetched {} tasks from {} task-lists", task_count, fetched.len());
        Self::notify(progress, 0, task_count, "Tasks fetched");

        for (link, list_gid, items) in fetched {
            for malformed in &items.malformed {
                report.record_warning(format!(
                    "Skipped malformed task {} in task-list {}: {}",
                    malformed.id.as_deref().unwrap_or("<no id>"),
                    list_gid,
                    malformed.reason
                ));
            }

            let mut seen = HashSet::new();
            for remote_task in &items.items {
                match self.reconcile_task(account, token, list_gid, remote_task).await {
                    Ok(task_user) => {
                        seen.insert(task_user.task_id);
                        report.tasks_processed += 1;
                    }
                    Err(SyncError::MalformedPayload(reason)) => report.record_warning(reason),
                    Err(e) => {
                        error!("❌ Failed to sync task {}: {}", remote_task.id, e);
                        report.record_error(format!("task {}", remote_task.id), &e);
                    }
                }
            }

            self.push_local_only_tasks(account, token, link, &seen, report).await;
        }

        report.advance(SyncPhase::TasksReconciled);
        let done = report.tasks_processed;
        Self::notify(progress, done, task_count.max(done), "Tasks reconciled");
    }
}
