//! Connection manager for the live database handle.
//!
//! Holds at most one open client. Connecting replaces it; a failed connect
//! leaves the previous client in place.

use std::sync::Arc;

use tracing::{info, warn};

use super::descriptor::{redact_url, ConnectionDescriptor, DatabaseKind};
use crate::db::{Connector, DatabaseClient};
use crate::error::{ChatDbError, Result};
use crate::persistence::CredentialStore;

/// Returned in place of a schema or a result when no database is connected.
pub const NOT_CONNECTED: &str = "Please connect to the database";

/// Default number of sample rows shown per table in the schema description.
pub const DEFAULT_SAMPLE_ROWS: usize = 3;

/// An open database client with the URL it was opened from.
pub struct ActiveConnection {
    /// Connection URL with the password redacted.
    pub display_url: String,
    /// Database client.
    pub db: Box<dyn DatabaseClient>,
}

/// Outcome of a successful connect from discrete fields.
#[derive(Debug)]
pub struct ConnectOutcome {
    /// Kind of the database that was connected.
    pub kind: DatabaseKind,
    /// Set when the connection succeeded but the credential file could not be written.
    pub save_error: Option<ChatDbError>,
}

/// Manages the live database connection and the last-known descriptor.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    store: CredentialStore,
    active: Option<ActiveConnection>,
    last_known: Option<ConnectionDescriptor>,
    sample_rows: usize,
}

impl ConnectionManager {
    /// Creates a manager with no connection. The last-known descriptor is
    /// read from the credential store; an unreadable file is logged and ignored.
    pub fn new(connector: Arc<dyn Connector>, store: CredentialStore) -> Self {
        let last_known = store.load_or_warn();

        Self {
            connector,
            store,
            active: None,
            last_known,
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }

    /// Sets how many sample rows per table `describe_schema` includes.
    pub fn with_sample_rows(mut self, sample_rows: usize) -> Self {
        self.sample_rows = sample_rows;
        self
    }

    /// Opens a client from a connection URL and makes it the live connection.
    ///
    /// On failure the previous connection (if any) is left untouched.
    pub async fn connect_from_url(&mut self, url: &str) -> Result<DatabaseKind> {
        let display_url = redact_url(url);
        let db = self.connector.open(url).await?;
        let kind = db.kind();

        let previous = self.active.replace(ActiveConnection {
            display_url: display_url.clone(),
            db,
        });
        if let Some(old) = previous {
            if let Err(e) = old.db.close().await {
                warn!("Failed to close previous connection: {e}");
            }
        }

        info!("Connected to {}", display_url);
        Ok(kind)
    }

    /// Renders the descriptor to a URL, connects, and on success persists it.
    ///
    /// An unrecognized `db_type` fails with `UnsupportedKind` before any
    /// connection is attempted. A failure to persist does not fail the
    /// connect; it is reported in `ConnectOutcome::save_error`.
    pub async fn connect_from_fields(
        &mut self,
        mut descriptor: ConnectionDescriptor,
    ) -> Result<ConnectOutcome> {
        let url = descriptor.to_url()?;
        let kind = self.connect_from_url(&url).await?;

        // Persist the canonical name ("PostgreSQL"), not an accepted alias
        descriptor.db_type = kind.as_str().to_string();

        let save_error = self.store.save(&descriptor).err();
        if let Some(e) = &save_error {
            warn!("Connected, but failed to save connection info: {e}");
        }
        self.last_known = Some(descriptor);

        Ok(ConnectOutcome { kind, save_error })
    }

    /// Returns a text description of all tables, or `NOT_CONNECTED`.
    pub async fn describe_schema(&self) -> Result<String> {
        let Some(active) = &self.active else {
            return Ok(NOT_CONNECTED.to_string());
        };

        let mut schema = active.db.introspect_schema().await?;
        if self.sample_rows > 0 {
            for table in &mut schema.tables {
                match active.db.sample_rows(&table.name, self.sample_rows).await {
                    Ok(sample) => table.sample = Some(sample),
                    Err(e) => warn!("Skipping sample rows for {}: {e}", table.name),
                }
            }
        }

        Ok(schema.format_for_llm())
    }

    /// Runs a query and returns its rows as text, or `NOT_CONNECTED`.
    ///
    /// Execution errors are returned to the caller unchanged.
    pub async fn execute(&self, query: &str) -> Result<String> {
        let Some(active) = &self.active else {
            return Ok(NOT_CONNECTED.to_string());
        };

        let result = active.db.execute_query(query).await?;
        if result.was_truncated() {
            warn!(
                "Query returned {} rows, truncated to {}",
                result.total_rows,
                result.rows.len()
            );
        }
        Ok(result.to_result_text())
    }

    /// Check if there's an active connection.
    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Returns the kind of the live connection.
    pub fn connected_kind(&self) -> Option<DatabaseKind> {
        self.active.as_ref().map(|c| c.db.kind())
    }

    /// Returns the redacted URL of the live connection.
    pub fn display_url(&self) -> Option<&str> {
        self.active.as_ref().map(|c| c.display_url.as_str())
    }

    /// Returns the descriptor from the last successful fields connect, or
    /// the one loaded from the credential file at startup.
    pub fn last_known(&self) -> Option<&ConnectionDescriptor> {
        self.last_known.as_ref()
    }

    /// Returns the values a connection form should start from.
    pub fn form_defaults(&self) -> ConnectionDescriptor {
        self.last_known.clone().unwrap_or_default()
    }

    /// Returns the credential store.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Close the active connection.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.active.take() {
            conn.db.close().await?;
        }
        Ok(())
    }
}
