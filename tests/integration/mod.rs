//! Integration tests for chat-db.

pub mod connection_test;
pub mod live_postgres_test;
pub mod persistence_test;
pub mod pipeline_test;
pub mod session_test;

use chat_db::chat::ChatRole;
use chat_db::connection::ConnectionManager;
use chat_db::db::MockConnector;
use chat_db::persistence::CredentialStore;
use chat_db::session::{Renderer, Status};
use std::sync::Arc;
use tempfile::TempDir;

/// Collects everything a session shows.
#[derive(Debug, Default)]
pub struct Recorder {
    pub messages: Vec<(ChatRole, String)>,
    pub statuses: Vec<(Status, String)>,
}

impl Renderer for Recorder {
    fn display_message(&mut self, role: ChatRole, text: &str) {
        self.messages.push((role, text.to_string()));
    }

    fn display_status(&mut self, status: Status, text: &str) {
        self.statuses.push((status, text.to_string()));
    }
}

/// A credential store inside a fresh temp directory.
pub fn temp_store() -> (CredentialStore, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::new(dir.path().join("connection_info.json"));
    (store, dir)
}

/// A manager over `connector` with a temp credential store.
pub fn mock_manager(connector: MockConnector) -> (ConnectionManager, TempDir) {
    let (store, dir) = temp_store();
    (ConnectionManager::new(Arc::new(connector), store), dir)
}
