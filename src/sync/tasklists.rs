use chrono::{DateTime, Utc};
use log::{error, info, warn};
use uuid::Uuid;

use crate::backend::RemoteTaskList;
use crate::credentials::AccessToken;
use crate::entities::{account, container, tasklist};
use crate::repositories::{ContainerRepository, TasklistRepository};
use crate::sync::{SyncError, SyncReport, SyncService};

/// Whether the remote copy wins over the local one.
///
/// Strictly newer remote wins; ties go to the local side. A link that was never
/// stamped always pulls.
pub(crate) fn is_remote_newer(local: Option<DateTime<Utc>>, remote: DateTime<Utc>) -> bool {
    match local {
        Some(local) => local < remote,
        None => true,
    }
}

impl SyncService {
    /// Reconciles one remote task-list with its local container and link.
    ///
    /// New lists are matched to a container by name (or, for the default list, to
    /// the account's default container) and linked. Existing links are pulled or
    /// pushed by comparing the remote `updated` against the one stored on the link.
    /// The default list is never renamed in either direction. A list already linked
    /// to the account's default container counts as the default list even when
    /// `is_default` is false.
    pub async fn reconcile_tasklist(
        &self,
        account: &account::Model,
        token: &AccessToken,
        remote_list: &RemoteTaskList,
        is_default: bool,
    ) -> Result<tasklist::Model, SyncError> {
        let conn = &self.storage.conn;
        let existing = TasklistRepository::get_by_google_id(conn, &account.id, &remote_list.id).await?;
        let is_default = match &existing {
            Some(link) if !is_default => self.links_default_container(account, link).await?,
            _ => is_default,
        };

        if remote_list.title.trim().is_empty() && !is_default {
            return Err(SyncError::MalformedPayload(format!(
                "Task-list {} has no title",
                remote_list.id
            )));
        }

        match existing {
            None => self.link_new_tasklist(account, remote_list, is_default).await,
            Some(link) if is_remote_newer(link.updated, remote_list.updated) => {
                self.pull_tasklist(link, remote_list, is_default).await
            }
            Some(link) => self.push_tasklist(token, link, is_default).await,
        }
    }

    async fn links_default_container(&self, account: &account::Model, link: &tasklist::Model) -> Result<bool, SyncError> {
        let container = ContainerRepository::get_by_id(&self.storage.conn, &link.container_id).await?;
        Ok(container.is_some_and(|c| c.is_default && c.creator_id == account.id))
    }

    async fn link_new_tasklist(
        &self,
        account: &account::Model,
        remote_list: &RemoteTaskList,
        is_default: bool,
    ) -> Result<tasklist::Model, SyncError> {
        let conn = &self.storage.conn;
        let container = self.find_or_create_container(account, &remote_list.title, is_default).await?;

        match TasklistRepository::get_for(conn, &account.id, &container.id).await? {
            Some(existing) if existing.google_id.is_none() => {
                warn!(
                    "Recovering unlinked task-list for container '{}' as {}",
                    container.name, remote_list.id
                );
                Ok(TasklistRepository::set_remote(conn, existing, &remote_list.id, remote_list.updated).await?)
            }
            Some(existing) => Err(SyncError::LocalConstraint(format!(
                "Container '{}' is already linked to task-list {} for this account",
                container.name,
                existing.google_id.as_deref().unwrap_or_default()
            ))),
            None => {
                info!("🔗 Linking task-list '{}' to container '{}'", remote_list.title, container.name);
                let link = tasklist::Model {
                    id: Uuid::new_v4(),
                    account_id: account.id,
                    container_id: container.id,
                    google_id: Some(remote_list.id.clone()),
                    updated: Some(remote_list.updated),
                };
                Ok(TasklistRepository::create(conn, link).await?)
            }
        }
    }

    /// Default container of the account for the default list, otherwise a live
    /// container with the same name, otherwise a new one.
    async fn find_or_create_container(
        &self,
        account: &account::Model,
        name: &str,
        is_default: bool,
    ) -> Result<container::Model, SyncError> {
        let conn = &self.storage.conn;

        if is_default {
            if let Some(existing) = ContainerRepository::get_default_for(conn, &account.id).await? {
                return Ok(existing);
            }
        }

        let mut name = if name.trim().is_empty() {
            format!("{}'s tasks", account.name)
        } else {
            name.to_string()
        };

        if let Some(existing) = ContainerRepository::find_by_name(conn, &name).await? {
            let shared = existing.is_visible_to(account.id) && !existing.is_default;
            match (is_default, shared) {
                (false, true) => return Ok(existing),
                (false, false) => {
                    return Err(SyncError::LocalConstraint(format!(
                        "Container name '{}' is taken by a container this account cannot use",
                        name
                    )))
                }
                // Default lists usually share a title across accounts; keep them apart.
                (true, _) => name = format!("{} ({})", name, account.name),
            }
        }
        let container = container::Model {
            id: Uuid::new_v4(),
            name,
            creator_id: account.id,
            is_default,
            is_private: is_default,
            discarded_at: None,
        };
        Ok(ContainerRepository::create(conn, container).await?)
    }

    async fn pull_tasklist(
        &self,
        link: tasklist::Model,
        remote_list: &RemoteTaskList,
        is_default: bool,
    ) -> Result<tasklist::Model, SyncError> {
        let conn = &self.storage.conn;

        if !is_default {
            if let Some(container) = ContainerRepository::get_by_id(conn, &link.container_id).await? {
                if container.name != remote_list.title {
                    info!("✏️ Renaming container '{}' to '{}'", container.name, remote_list.title);
                    ContainerRepository::rename(conn, container, &remote_list.title).await?;
                }
            }
        }

        Ok(TasklistRepository::touch(conn, link, remote_list.updated).await?)
    }

    async fn push_tasklist(
        &self,
        token: &AccessToken,
        link: tasklist::Model,
        is_default: bool,
    ) -> Result<tasklist::Model, SyncError> {
        if is_default {
            return Ok(link);
        }
        let Some(list_gid) = link.google_id.clone() else {
            return Ok(link);
        };

        let conn = &self.storage.conn;
        let container = ContainerRepository::get_by_id(conn, &link.container_id)
            .await?
            .ok_or_else(|| SyncError::Database(format!("Container {} missing for link {}", link.container_id, link.id)))?;

        let updated = self.backend.update_task_list(token, &list_gid, &container.name).await?;
        Ok(TasklistRepository::touch(conn, link, updated.updated).await?)
    }

    /// Inserts a remote list for every link of the account that has none yet.
    ///
    /// Returns the links that now carry a remote id.
    pub(crate) async fn push_unsynced_tasklists(
        &self,
        account: &account::Model,
        token: &AccessToken,
        report: &mut SyncReport,
    ) -> Vec<tasklist::Model> {
        let conn = &self.storage.conn;
        let unsynced = match TasklistRepository::get_unsynced_for_account(conn, &account.id).await {
            Ok(links) => links,
            Err(e) => {
                report.record_error("local task-lists", &SyncError::from(e));
                return Vec::new();
            }
        };

        let mut pushed = Vec::new();
        for link in unsynced {
            match self.insert_remote_tasklist(token, link).await {
                Ok(link) => {
                    report.containers_processed += 1;
                    pushed.push(link);
                }
                Err(e) => {
                    error!("❌ Failed to create remote task-list: {}", e);
                    report.record_error("local task-list", &e);
                }
            }
        }
        pushed
    }

    async fn insert_remote_tasklist(&self, token: &AccessToken, link: tasklist::Model) -> Result<tasklist::Model, SyncError> {
        let conn = &self.storage.conn;
        let container = ContainerRepository::get_by_id(conn, &link.container_id)
            .await?
            .ok_or_else(|| SyncError::Database(format!("Container {} missing for link {}", link.container_id, link.id)))?;

        let created = self.backend.insert_task_list(token, &container.name).await?;
        info!("➕ Created remote task-list '{}' ({})", container.name, created.id);
        Ok(TasklistRepository::set_remote(conn, link, &created.id, created.updated).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_is_remote_newer() {
        let earlier = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap();

        assert!(is_remote_newer(Some(earlier), later));
        assert!(!is_remote_newer(Some(later), earlier));
        assert!(!is_remote_newer(Some(later), later));
        assert!(is_remote_newer(None, earlier));
    }
}
