//! Database abstraction layer for chat-db.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends to be used interchangeably, and a
//! `Connector` that opens a client from a connection URL.

mod mock;
mod mysql;
mod postgres;
mod schema;
mod types;

pub use mock::{MockConnector, MockDatabaseClient};
pub use mysql::MySqlClient;
pub use postgres::PostgresClient;
pub use schema::{Column, ForeignKey, Schema, Table};
pub use types::{ColumnInfo, QueryResult, Row, Value, MAX_ROWS};

use crate::connection::{redact_url, DatabaseKind};
use crate::error::{ChatDbError, Result};
use async_trait::async_trait;
use tracing::debug;

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with ChatDbError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Returns the kind of database behind this client.
    fn kind(&self) -> DatabaseKind;

    /// Introspects the database schema, returning table and relationship information.
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Fetches up to `limit` rows from a table.
    async fn sample_rows(&self, table: &str, limit: usize) -> Result<QueryResult>;

    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

/// Opens database clients from connection URLs.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a client for the given URL.
    async fn open(&self, url: &str) -> Result<Box<dyn DatabaseClient>>;
}

/// Connector backed by sqlx drivers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlxConnector;

#[async_trait]
impl Connector for SqlxConnector {
    async fn open(&self, url: &str) -> Result<Box<dyn DatabaseClient>> {
        let target = DriverUrl::parse(url)?;
        debug!("Opening {} connection to {}", target.kind, redact_url(url));

        match target.kind {
            DatabaseKind::PostgreSql => {
                let client = PostgresClient::connect(&target.driver_url("postgres")).await?;
                Ok(Box::new(client))
            }
            DatabaseKind::MySql => {
                let client = MySqlClient::connect(&target.driver_url("mysql")).await?;
                Ok(Box::new(client))
            }
            DatabaseKind::Oracle => Err(ChatDbError::connection(
                "No driver available for Oracle databases",
            )),
        }
    }
}

/// A connection URL split into its database kind and the scheme-less remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DriverUrl {
    pub kind: DatabaseKind,
    pub rest: String,
}

impl DriverUrl {
    /// Parses `dialect[+driver]://rest`.
    pub fn parse(url: &str) -> Result<Self> {
        let (scheme, rest) = url
            .trim()
            .split_once("://")
            .ok_or_else(|| ChatDbError::connection("Malformed connection URL: missing scheme"))?;

        let kind = DatabaseKind::from_url_scheme(scheme).ok_or_else(|| {
            ChatDbError::connection(format!("Unsupported database driver '{scheme}'"))
        })?;

        Ok(Self {
            kind,
            rest: rest.to_string(),
        })
    }

    /// Rebuilds the URL with the scheme the sqlx driver expects.
    pub fn driver_url(&self, scheme: &str) -> String {
        format!("{}://{}", scheme, self.rest)
    }
}
