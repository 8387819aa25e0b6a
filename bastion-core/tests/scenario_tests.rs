//! End-to-end scenarios through the user manager

use bastion_core::config::BastionConfig;
use bastion_core::rbac::{RbacError, Session};
use bastion_core::store::{MemoryUserStore, RoleRecord, StoreSnapshot, UserRecord};
use bastion_core::UserManager;
use std::sync::Arc;

fn manager_with(store: MemoryUserStore) -> UserManager {
    UserManager::with_store(&BastionConfig::default(), Arc::new(store)).unwrap()
}

#[test]
fn editor_alice_scenario() {
    let manager = manager_with(MemoryUserStore::new());
    manager.create_role("editor", &["READ", "Write"], "manage-users").unwrap();
    manager.create_user("alice", "editor").unwrap();

    let alice = Session::authenticated("alice");
    assert!(manager.authorize(&alice, "read").unwrap());
    assert!(manager.authorize(&alice, "write").unwrap());
    assert!(!manager.authorize(&alice, "manage-users").unwrap());
    assert_eq!(manager.universe().names(manager.effective_rights(&alice)), vec!["read", "write"]);
}

#[test]
fn anonymous_read_scenario() {
    let manager = manager_with(MemoryUserStore::new());
    manager.set_anonymous_rights(&["read"]).unwrap();

    let anonymous = Session::anonymous();
    assert!(manager.authorize(&anonymous, "read").unwrap());
    assert!(!manager.authorize(&anonymous, "write").unwrap());
}

#[test]
fn duplicate_role_grows_registry_once() {
    let manager = manager_with(MemoryUserStore::new());
    manager.create_role("editor", &["read"], "manage-users").unwrap();
    let size = manager.snapshot().role_count();

    let err = manager.create_role("editor", &["write"], "manage-users").unwrap_err();
    assert_eq!(err, RbacError::DuplicateName("editor".to_string()));
    assert_eq!(manager.snapshot().role_count(), size);
}

#[test]
fn unknown_role_leaves_users_unchanged() {
    let manager = manager_with(MemoryUserStore::new());
    let before = manager.snapshot();

    let err = manager.create_user("bob", "ghost").unwrap_err();
    assert_eq!(err, RbacError::UnknownRole("ghost".to_string()));
    assert_eq!(manager.snapshot().user_count(), 0);
    assert_eq!(manager.snapshot().version(), before.version());
}

#[test]
fn invalid_right_name_is_rejected() {
    let manager = manager_with(MemoryUserStore::new());
    let err = manager.create_role("pilot", &["fly"], "manage-users").unwrap_err();
    assert_eq!(err, RbacError::InvalidRight("fly".to_string()));
}

#[tokio::test]
async fn unload_roles_fails_closed() {
    let manager = manager_with(MemoryUserStore::new());
    manager.create_role("editor", &["read", "write"], "manage-users").unwrap();
    manager.create_user("alice", "editor").unwrap();
    let alice = Session::authenticated("alice");
    assert!(!manager.effective_rights(&alice).is_empty());

    let snapshot = manager.unload_roles().await;

    assert_eq!(snapshot.dangling_users().count(), 1);
    assert!(manager.effective_rights(&alice).is_empty());
    assert!(!manager.authorize(&alice, "read").unwrap());
}

#[tokio::test]
async fn failed_reload_keeps_previous_rights() {
    let store = MemoryUserStore::new();
    store.add_role(RoleRecord::new("editor", ["read", "write"], "manage-users"));
    store.add_user(UserRecord::new("alice", "editor"));
    let manager = manager_with(store.clone());
    manager.load_user().await.unwrap();

    let alice = Session::authenticated("alice");
    let before = manager.effective_rights(&alice);

    store.set_contents(StoreSnapshot {
        roles: vec![RoleRecord::new("viewer", ["read"], "manage-users")],
        users: vec![UserRecord::new("alice", "editor")],
    });
    assert!(matches!(manager.load_user().await, Err(RbacError::ValidationError(_))));
    assert_eq!(manager.effective_rights(&alice), before);

    store.set_available(false);
    assert!(matches!(manager.load_user().await, Err(RbacError::LoadError(_))));
    assert_eq!(manager.effective_rights(&alice), before);
}

#[tokio::test]
async fn reload_from_json_file() {
    let tmp = tempfile::tempdir().unwrap();
    let database = tmp.path().join("users.json");
    std::fs::write(
        &database,
        r#"{
            "roles": [
                {"name": "editor", "rights": ["read", "write"], "manage_right": "manage-users"},
                {"name": "admin", "rights": ["read", "write", "manage-users", "manage-roles", "superuser"], "manage_right": "superuser"}
            ],
            "users": [{"name": "alice", "role": "editor"}, {"name": "root", "role": "admin"}]
        }"#,
    )
    .unwrap();

    let mut config = BastionConfig::default();
    config.storage.user_database = database.display().to_string();
    let manager = UserManager::from_config(&config).unwrap();

    let report = manager.load_user().await.unwrap();
    assert_eq!((report.roles, report.users), (2, 2));
    assert!(manager.authorize(&Session::authenticated("root"), "superuser").unwrap());
    assert!(!manager.authorize(&Session::authenticated("alice"), "superuser").unwrap());
}
