use chrono::Utc;
use uuid::Uuid;

use promisetasks::entities::{account, container, task_user};
use promisetasks::repositories::{
    AccountRepository, ContainerRepository, TaskRepository, TaskUserRepository, TasklistRepository,
};
use promisetasks::storage::LocalStorage;

use crate::common::{at, seed_account, seed_container, seed_link, seed_task};

#[tokio::test]
async fn test_linked_accounts_only() {
    let storage = LocalStorage::in_memory().await.unwrap();
    seed_account(&storage, "Dana").await;
    AccountRepository::create(
        &storage.conn,
        account::Model {
            id: Uuid::new_v4(),
            name: "Unlinked".to_string(),
            oauth_id: None,
            oauth_token: None,
            oauth_refresh_token: None,
            oauth_expires_at: None,
        },
    )
    .await
    .unwrap();

    let linked = AccountRepository::get_linked(&storage.conn).await.unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].name, "Dana");
}

#[tokio::test]
async fn test_default_container_lookup() {
    let storage = LocalStorage::in_memory().await.unwrap();
    let dana = seed_account(&storage, "Dana").await;
    let eli = seed_account(&storage, "Eli").await;
    seed_container(&storage, "Maple St", &dana, false).await;

    let default = ContainerRepository::create(
        &storage.conn,
        container::Model {
            id: Uuid::new_v4(),
            name: "My Tasks".to_string(),
            creator_id: dana.id,
            is_default: true,
            is_private: true,
            discarded_at: None,
        },
    )
    .await
    .unwrap();

    let found = ContainerRepository::get_default_for(&storage.conn, &dana.id)
        .await
        .unwrap();
    assert_eq!(found.map(|c| c.id), Some(default.id));
    assert!(ContainerRepository::get_default_for(&storage.conn, &eli.id)
        .await
        .unwrap()
        .is_none());

    let renamed = ContainerRepository::rename(&storage.conn, default, "Dana's list").await.unwrap();
    assert_eq!(renamed.name, "Dana's list");
    assert!(ContainerRepository::find_by_name(&storage.conn, "My Tasks")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_tasklist_links() {
    let storage = LocalStorage::in_memory().await.unwrap();
    let dana = seed_account(&storage, "Dana").await;
    let maple = seed_container(&storage, "Maple St", &dana, false).await;
    let garage = seed_container(&storage, "Garage", &dana, false).await;

    seed_link(&storage, &dana, &maple, Some("list-maple"), Some(at(9))).await;
    let unsynced = seed_link(&storage, &dana, &garage, None, None).await;

    let pending = TasklistRepository::get_unsynced_for_account(&storage.conn, &dana.id)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, unsynced.id);

    let linked = TasklistRepository::set_remote(&storage.conn, unsynced, "list-garage", at(10))
        .await
        .unwrap();
    assert_eq!(linked.google_id.as_deref(), Some("list-garage"));

    let touched = TasklistRepository::touch(&storage.conn, linked, at(11)).await.unwrap();
    assert_eq!(touched.updated, Some(at(11)));

    let found = TasklistRepository::get_for(&storage.conn, &dana.id, &garage.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.google_id.as_deref(), Some("list-garage"));

    // One link per account and container.
    let duplicate = promisetasks::entities::tasklist::Model {
        id: Uuid::new_v4(),
        account_id: dana.id,
        container_id: garage.id,
        google_id: None,
        updated: None,
    };
    assert!(TasklistRepository::create(&storage.conn, duplicate).await.is_err());
}

#[tokio::test]
async fn test_task_writes_recompute_derived_fields() {
    let storage = LocalStorage::in_memory().await.unwrap();
    let dana = seed_account(&storage, "Dana").await;
    let maple = seed_container(&storage, "Maple St", &dana, false).await;

    let mut task = seed_task(&storage, &maple, &dana, "Fix gutter").await;
    assert!(task.needs_more_info);
    assert_eq!(task.position_int, 0);

    task.position = Some("00000000000000000042".to_string());
    task.due = Some(Utc::now());
    task.priority = Some("high".to_string());
    task.budget_cents = Some(25_000);
    let task = TaskRepository::update(&storage.conn, task).await.unwrap();

    assert_eq!(task.position_int, 42);
    assert!(!task.needs_more_info);

    let found = TaskRepository::find_by_title(&storage.conn, &maple.id, "Fix gutter")
        .await
        .unwrap();
    assert_eq!(found.map(|t| t.id), Some(task.id));
}

#[tokio::test]
async fn test_container_tasks_skip_deleted_and_sort_by_position() {
    let storage = LocalStorage::in_memory().await.unwrap();
    let dana = seed_account(&storage, "Dana").await;
    let maple = seed_container(&storage, "Maple St", &dana, false).await;

    let mut second = seed_task(&storage, &maple, &dana, "Paint fence").await;
    second.position = Some("00000000000000000002".to_string());
    TaskRepository::update(&storage.conn, second).await.unwrap();

    let mut first = seed_task(&storage, &maple, &dana, "Fix gutter").await;
    first.position = Some("00000000000000000001".to_string());
    TaskRepository::update(&storage.conn, first).await.unwrap();

    let mut gone = seed_task(&storage, &maple, &dana, "Old chore").await;
    gone.deleted = true;
    TaskRepository::update(&storage.conn, gone).await.unwrap();

    let titles: Vec<String> = TaskRepository::get_for_container(&storage.conn, &maple.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["Fix gutter", "Paint fence"]);
    assert_eq!(TaskRepository::count(&storage.conn).await.unwrap(), 3);
}

#[tokio::test]
async fn test_task_user_links() {
    let storage = LocalStorage::in_memory().await.unwrap();
    let dana = seed_account(&storage, "Dana").await;
    let maple = seed_container(&storage, "Maple St", &dana, false).await;
    let task = seed_task(&storage, &maple, &dana, "Fix gutter").await;

    let link = TaskUserRepository::create(
        &storage.conn,
        task_user::Model {
            id: Uuid::new_v4(),
            account_id: dana.id,
            task_id: task.id,
            google_id: Some("t-1".to_string()),
            tasklist_gid: Some("list-maple".to_string()),
            parent_id: None,
            position: None,
            completed_at: None,
            deleted: false,
            updated: Some(at(9)),
        },
    )
    .await
    .unwrap();

    let found = TaskUserRepository::get_by_google_id(&storage.conn, "t-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, link.id);

    let mut link = TaskUserRepository::get_for(&storage.conn, &dana.id, &task.id)
        .await
        .unwrap()
        .unwrap();
    link.deleted = true;
    link.updated = Some(at(10));
    let link = TaskUserRepository::update(&storage.conn, link).await.unwrap();
    assert!(link.deleted);
    assert_eq!(link.updated, Some(at(10)));

    // One link per account and task.
    let mut duplicate = link.clone();
    duplicate.id = Uuid::new_v4();
    duplicate.google_id = None;
    assert!(TaskUserRepository::create(&storage.conn, duplicate).await.is_err());
}
