use promisetasks::repositories::{AccountRepository, ContainerRepository};
use promisetasks::storage::LocalStorage;
use promisetasks::sync::SyncError;

use crate::common::{seed_account, seed_container};

#[tokio::test]
async fn test_local_storage_creation() {
    let result = LocalStorage::in_memory().await;
    assert!(result.is_ok(), "LocalStorage should be created successfully");
}

#[tokio::test]
async fn test_file_storage_keeps_data_between_connections() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("tasks.db").display());

    let storage = LocalStorage::new(&url).await.unwrap();
    let account = seed_account(&storage, "Dana").await;
    drop(storage);

    let reopened = LocalStorage::new(&url).await.unwrap();
    let found = AccountRepository::get_by_id(&reopened.conn, &account.id).await.unwrap();
    assert_eq!(found.map(|a| a.name), Some("Dana".to_string()));
}

#[tokio::test]
async fn test_live_container_names_are_unique() {
    let storage = LocalStorage::in_memory().await.unwrap();
    let account = seed_account(&storage, "Dana").await;
    let first = seed_container(&storage, "Maple St", &account, false).await;

    let mut duplicate = first.clone();
    duplicate.id = uuid::Uuid::new_v4();
    let error = ContainerRepository::create(&storage.conn, duplicate.clone())
        .await
        .unwrap_err();
    assert!(matches!(SyncError::from(error), SyncError::LocalConstraint(_)));

    // A discarded container frees its name.
    duplicate.discarded_at = Some(chrono::Utc::now());
    assert!(ContainerRepository::create(&storage.conn, duplicate).await.is_ok());
}
