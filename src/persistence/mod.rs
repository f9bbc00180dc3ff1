//! Persistence layer for chat-db.
//!
//! The only persisted state is the last connection made from discrete
//! fields, stored as a single JSON record.

mod credentials;

pub use credentials::{CredentialStore, CREDENTIALS_FILE_NAME};
