use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::{BackendError, RemoteTask, TaskPayload, TaskStatus};
use crate::credentials::AccessToken;
use crate::entities::{account, task, task_user, tasklist};
use crate::repositories::{ContainerRepository, TaskRepository, TaskUserRepository, TasklistRepository};
use crate::sync::tasklists::is_remote_newer;
use crate::sync::{SyncError, SyncReport, SyncService};

/// Completion timestamp to copy onto the task when a link goes from open to completed.
///
/// Only the unset to set transition cascades; re-completing with another
/// timestamp or reopening leaves the task alone.
pub(crate) fn completion_cascade(
    before: Option<DateTime<Utc>>,
    after: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match (before, after) {
        (None, Some(completed_at)) => Some(completed_at),
        _ => None,
    }
}

/// Body pushed to the remote for a local task.
pub fn task_payload(task: &task::Model) -> TaskPayload {
    TaskPayload {
        title: task.title.clone(),
        notes: task.notes.clone(),
        due: task.due,
        status: if task.completed_at.is_some() {
            TaskStatus::Completed
        } else {
            TaskStatus::NeedsAction
        },
        completed: task.completed_at,
        deleted: task.deleted,
    }
}

fn remote_ids(link: &task_user::Model) -> Result<(String, String), SyncError> {
    match (link.tasklist_gid.clone(), link.google_id.clone()) {
        (Some(list_gid), Some(task_gid)) => Ok((list_gid, task_gid)),
        _ => Err(SyncError::UnlinkedTask(link.task_id)),
    }
}

impl SyncService {
    /// Reconciles one remote task of the task-list `tasklist_gid`.
    ///
    /// Returns the account's link to the local task.
    pub async fn reconcile_task(
        &self,
        account: &account::Model,
        token: &AccessToken,
        tasklist_gid: &str,
        remote_task: &RemoteTask,
    ) -> Result<task_user::Model, SyncError> {
        if remote_task.title.trim().is_empty() {
            return Err(SyncError::MalformedPayload(format!(
                "Task {} in task-list {} has no title",
                remote_task.id, tasklist_gid
            )));
        }

        let conn = &self.storage.conn;
        let list_link = TasklistRepository::get_by_google_id(conn, &account.id, tasklist_gid)
            .await?
            .ok_or_else(|| SyncError::UnknownTasklist(tasklist_gid.to_string()))?;

        match TaskUserRepository::get_by_google_id(conn, &remote_task.id).await? {
            None => self.link_new_task(account, &list_link, tasklist_gid, remote_task).await,
            Some(link) if link.account_id != account.id => Err(SyncError::LocalConstraint(format!(
                "Remote task {} is linked to another account",
                remote_task.id
            ))),
            Some(link) if is_remote_newer(link.updated, remote_task.updated) => {
                self.pull_task(link, &list_link, tasklist_gid, remote_task).await
            }
            Some(link) => self.push_task(token, link, tasklist_gid).await,
        }
    }

    async fn link_new_task(
        &self,
        account: &account::Model,
        list_link: &tasklist::Model,
        tasklist_gid: &str,
        remote_task: &RemoteTask,
    ) -> Result<task_user::Model, SyncError> {
        let conn = &self.storage.conn;

        // A title match only counts if this account has not linked that task to another remote task.
        let mut candidate = TaskRepository::find_by_title(conn, &list_link.container_id, &remote_task.title).await?;
        let mut existing_link = None;
        if let Some(found_id) = candidate.as_ref().map(|t| t.id) {
            match TaskUserRepository::get_for(conn, &account.id, &found_id).await? {
                Some(link) if link.google_id.is_some() => candidate = None,
                link => existing_link = link,
            }
        }

        let is_new = candidate.is_none();
        let mut task = candidate.unwrap_or_else(|| task::Model {
            id: Uuid::new_v4(),
            container_id: Some(list_link.container_id),
            creator_id: account.id,
            owner_id: account.id,
            title: remote_task.title.clone(),
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
        });

        task.title = remote_task.title.clone();
        task.notes = remote_task.notes.clone();
        task.due = remote_task.due;
        task.deleted = remote_task.deleted;
        task.hidden = remote_task.hidden;
        task.parent_id = remote_task.parent.clone();
        task.position = remote_task.position.clone();
        if task.google_id.is_none() {
            task.google_id = Some(remote_task.id.clone());
        }
        let before = existing_link.as_ref().and_then(|l| l.completed_at);
        if let Some(completed_at) = completion_cascade(before, remote_task.completed) {
            task.completed_at = Some(completed_at);
        }

        let task = if is_new {
            info!("➕ New task '{}' from remote", task.title);
            TaskRepository::create(conn, task).await?
        } else {
            debug!("Matched remote task '{}' to local task {}", task.title, task.id);
            TaskRepository::update(conn, task).await?
        };

        let is_new_link = existing_link.is_none();
        let mut link = existing_link.unwrap_or_else(|| task_user::Model {
            id: Uuid::new_v4(),
            account_id: account.id,
            task_id: task.id,
            google_id: None,
            tasklist_gid: None,
            parent_id: None,
            position: None,
            completed_at: None,
            deleted: false,
            updated: None,
        });
        Self::stamp_link(&mut link, tasklist_gid, remote_task);

        if is_new_link {
            Ok(TaskUserRepository::create(conn, link).await?)
        } else {
            Ok(TaskUserRepository::update(conn, link).await?)
        }
    }

    async fn pull_task(
        &self,
        mut link: task_user::Model,
        list_link: &tasklist::Model,
        tasklist_gid: &str,
        remote_task: &RemoteTask,
    ) -> Result<task_user::Model, SyncError> {
        let conn = &self.storage.conn;
        let mut task = TaskRepository::get_by_id(conn, &link.task_id)
            .await?
            .ok_or_else(|| SyncError::Database(format!("Task {} missing for link {}", link.task_id, link.id)))?;

        task.title = remote_task.title.clone();
        task.notes = remote_task.notes.clone();
        task.due = remote_task.due;
        task.deleted = remote_task.deleted;
        task.hidden = remote_task.hidden;
        task.parent_id = remote_task.parent.clone();
        task.position = remote_task.position.clone();
        if link.tasklist_gid.as_deref() != Some(tasklist_gid) {
            task.container_id = Some(list_link.container_id);
        }
        if let Some(completed_at) = completion_cascade(link.completed_at, remote_task.completed) {
            info!("✔️ Task '{}' completed remotely", task.title);
            task.completed_at = Some(completed_at);
        }
        TaskRepository::update(conn, task).await?;

        Self::stamp_link(&mut link, tasklist_gid, remote_task);
        Ok(TaskUserRepository::update(conn, link).await?)
    }

    async fn push_task(
        &self,
        token: &AccessToken,
        mut link: task_user::Model,
        tasklist_gid: &str,
    ) -> Result<task_user::Model, SyncError> {
        let conn = &self.storage.conn;
        let task = TaskRepository::get_by_id(conn, &link.task_id)
            .await?
            .ok_or_else(|| SyncError::Database(format!("Task {} missing for link {}", link.task_id, link.id)))?;
        let task_gid = link.google_id.clone().ok_or(SyncError::UnlinkedTask(task.id))?;

        let updated = self
            .backend
            .update_task(token, tasklist_gid, &task_gid, &task_payload(&task))
            .await?;

        link.tasklist_gid = Some(tasklist_gid.to_string());
        link.completed_at = updated.completed;
        link.updated = Some(updated.updated);
        Ok(TaskUserRepository::update(conn, link).await?)
    }

    fn stamp_link(link: &mut task_user::Model, tasklist_gid: &str, remote_task: &RemoteTask) {
        link.google_id = Some(remote_task.id.clone());
        link.tasklist_gid = Some(tasklist_gid.to_string());
        link.parent_id = remote_task.parent.clone();
        link.position = remote_task.position.clone();
        link.completed_at = remote_task.completed;
        link.deleted = remote_task.deleted;
        link.updated = Some(remote_task.updated);
    }

    /// Inserts remotely every visible local task of the link's container that this
    /// account has never pushed and that was not part of the remote listing.
    pub(crate) async fn push_local_only_tasks(
        &self,
        account: &account::Model,
        token: &AccessToken,
        list_link: &tasklist::Model,
        seen: &HashSet<Uuid>,
        report: &mut SyncReport,
    ) {
        let Some(list_gid) = list_link.google_id.as_deref() else {
            return;
        };
        let conn = &self.storage.conn;

        let container = match ContainerRepository::get_by_id(conn, &list_link.container_id).await {
            Ok(Some(container)) => container,
            Ok(None) => return,
            Err(e) => {
                report.record_error(format!("container {}", list_link.container_id), &SyncError::from(e));
                return;
            }
        };
        if !container.is_visible_to(account.id) {
            return;
        }

        let tasks = match TaskRepository::get_for_container(conn, &container.id).await {
            Ok(tasks) => tasks,
            Err(e) => {
                report.record_error(format!("tasks of container '{}'", container.name), &SyncError::from(e));
                return;
            }
        };

        for task in tasks {
            if seen.contains(&task.id) {
                continue;
            }
            let existing = match TaskUserRepository::get_for(conn, &account.id, &task.id).await {
                Ok(existing) => existing,
                Err(e) => {
                    report.record_error(format!("task \"{}\"", task.title), &SyncError::from(e));
                    continue;
                }
            };
            if existing.as_ref().is_some_and(|l| l.google_id.is_some()) {
                continue;
            }

            let title = task.title.clone();
            match self.insert_remote_task(account, token, list_gid, task, existing).await {
                Ok(_) => report.tasks_processed += 1,
                Err(e) => {
                    error!("❌ Failed to push task '{}': {}", title, e);
                    report.record_error(format!("task \"{}\"", title), &e);
                }
            }
        }
    }

    async fn insert_remote_task(
        &self,
        account: &account::Model,
        token: &AccessToken,
        list_gid: &str,
        mut task: task::Model,
        existing: Option<task_user::Model>,
    ) -> Result<task_user::Model, SyncError> {
        let conn = &self.storage.conn;
        let created = self.backend.insert_task(token, list_gid, &task_payload(&task), None).await?;
        info!("⬆️ Pushed task '{}' as {}", task.title, created.id);

        let is_new_link = existing.is_none();
        let mut link = existing.unwrap_or_else(|| task_user::Model {
            id: Uuid::new_v4(),
            account_id: account.id,
            task_id: task.id,
            google_id: None,
            tasklist_gid: None,
            parent_id: None,
            position: None,
            completed_at: None,
            deleted: false,
            updated: None,
        });
        Self::stamp_link(&mut link, list_gid, &created);
        let link = if is_new_link {
            TaskUserRepository::create(conn, link).await?
        } else {
            TaskUserRepository::update(conn, link).await?
        };

        if task.google_id.is_none() || task.position.is_none() {
            task.google_id = task.google_id.or(Some(created.id));
            task.position = task.position.or(created.position);
            TaskRepository::update(conn, task).await?;
        }

        Ok(link)
    }

    /// Deletes a task remotely for an account and marks it deleted locally.
    pub async fn delete_remote_task(&self, account_id: &Uuid, task_id: &Uuid) -> Result<(), SyncError> {
        let _guard = self.sync_lock.lock().await;
        let (account, token) = self.authenticate(account_id).await?;
        let conn = &self.storage.conn;

        let mut link = TaskUserRepository::get_for(conn, &account.id, task_id)
            .await?
            .ok_or(SyncError::UnlinkedTask(*task_id))?;
        let (list_gid, task_gid) = remote_ids(&link)?;

        match self.backend.delete_task(&token, &list_gid, &task_gid).await {
            Ok(()) => info!("🗑️ Deleted remote task {}", task_gid),
            Err(BackendError::Api { status: 404 | 410, .. }) => {
                warn!("Remote task {} was already gone", task_gid)
            }
            Err(e) => return Err(e.into()),
        }

        link.deleted = true;
        TaskUserRepository::update(conn, link).await?;
        if let Some(mut task) = TaskRepository::get_by_id(conn, task_id).await? {
            task.deleted = true;
            TaskRepository::update(conn, task).await?;
        }
        Ok(())
    }

    /// Moves a task under `parent_id` and after `previous_id` in the account's remote list.
    pub async fn move_remote_task(
        &self,
        account_id: &Uuid,
        task_id: &Uuid,
        parent_id: Option<Uuid>,
        previous_id: Option<Uuid>,
    ) -> Result<task_user::Model, SyncError> {
        let _guard = self.sync_lock.lock().await;
        let (account, token) = self.authenticate(account_id).await?;
        let conn = &self.storage.conn;

        let mut link = TaskUserRepository::get_for(conn, &account.id, task_id)
            .await?
            .ok_or(SyncError::UnlinkedTask(*task_id))?;
        let (list_gid, task_gid) = remote_ids(&link)?;

        let parent_gid = self.linked_gid(&account.id, parent_id).await?;
        let previous_gid = self.linked_gid(&account.id, previous_id).await?;

        let moved = self
            .backend
            .move_task(&token, &list_gid, &task_gid, parent_gid.as_deref(), previous_gid.as_deref())
            .await?;

        link.parent_id = moved.parent.clone();
        link.position = moved.position.clone();
        link.updated = Some(moved.updated);
        let link = TaskUserRepository::update(conn, link).await?;

        if let Some(mut task) = TaskRepository::get_by_id(conn, task_id).await? {
            task.parent_id = moved.parent;
            task.position = moved.position;
            TaskRepository::update(conn, task).await?;
        }
        Ok(link)
    }

    async fn linked_gid(&self, account_id: &Uuid, task_id: Option<Uuid>) -> Result<Option<String>, SyncError> {
        let Some(task_id) = task_id else {
            return Ok(None);
        };
        let gid = TaskUserRepository::get_for(&self.storage.conn, account_id, &task_id)
            .await?
            .and_then(|l| l.google_id)
            .ok_or(SyncError::UnlinkedTask(task_id))?;
        Ok(Some(gid))
    }
}
