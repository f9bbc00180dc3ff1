//! Credential file tests.

use super::{mock_manager, temp_store};
use chat_db::connection::{ConnectionDescriptor, ConnectionManager};
use chat_db::db::MockConnector;
use chat_db::persistence::CredentialStore;
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[test]
fn test_load_missing_file_is_none() {
    let (store, _dir) = temp_store();
    assert_eq!(store.load().unwrap(), None);
    assert_eq!(store.load_or_warn(), None);
}

#[test]
fn test_default_descriptor() {
    let desc = ConnectionDescriptor::default();
    assert_eq!(desc.db_type, "MySQL");
    assert_eq!(desc.username, "root");
    assert_eq!(desc.port, "3306");
    assert_eq!(desc.host, "localhost");
    assert_eq!(desc.password, "");
    assert_eq!(desc.database, "rag_test");
}

#[test]
fn test_save_then_load() {
    let (store, _dir) = temp_store();
    let desc = ConnectionDescriptor::new("Oracle", "scott", "1521", "ora", "tiger", "orcl");

    store.save(&desc).unwrap();
    assert_eq!(store.load().unwrap(), Some(desc));
}

#[test]
fn test_save_replaces_previous_record() {
    let (store, _dir) = temp_store();
    store.save(&ConnectionDescriptor::default()).unwrap();

    let next = ConnectionDescriptor::new("PostgreSQL", "alice", "5432", "db", "", "sales");
    store.save(&next).unwrap();
    assert_eq!(store.load().unwrap(), Some(next));
}

#[test]
fn test_corrupt_file_is_an_error() {
    let (store, _dir) = temp_store();
    std::fs::write(store.path(), "{not json").unwrap();

    assert!(store.load().is_err());
    assert_eq!(store.load_or_warn(), None);

    // The manager starts from the form defaults instead of failing
    let manager = ConnectionManager::new(Arc::new(MockConnector::new()), store);
    assert_eq!(manager.last_known(), None);
    assert_eq!(manager.form_defaults(), ConnectionDescriptor::default());
}

#[test]
fn test_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::new(dir.path().join("nested").join("connection_info.json"));

    store.save(&ConnectionDescriptor::default()).unwrap();
    assert!(store.path().exists());
}

#[cfg(unix)]
#[test]
fn test_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let (store, _dir) = temp_store();
    store.save(&ConnectionDescriptor::default()).unwrap();

    let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);

    std::fs::set_permissions(store.path(), std::fs::Permissions::from_mode(0o644)).unwrap();
    store.save(&ConnectionDescriptor::default()).unwrap();
    let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test]
async fn test_successful_connect_persists_exact_fields() {
    let (mut manager, dir) = mock_manager(MockConnector::new());
    let desc = ConnectionDescriptor::new("MySQL", "app", "3307", "10.0.0.5", "pw", "shop");

    manager.connect_from_fields(desc.clone()).await.unwrap();

    // A new manager over the same file starts from the saved fields
    let store = CredentialStore::new(dir.path().join("connection_info.json"));
    let reopened = ConnectionManager::new(Arc::new(MockConnector::new()), store);
    assert_eq!(reopened.form_defaults(), desc);
}
