//! Mock database client and connector.
//!
//! Provides an in-memory database implementation for tests and for running
//! the front end without a server (`--mock-db`).

use super::{ColumnInfo, Connector, DatabaseClient, DriverUrl, QueryResult, Schema, Value};
use crate::connection::DatabaseKind;
use crate::db::{Column, ForeignKey, Table};
use crate::error::{ChatDbError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Statement keywords the mock accepts; anything else is a syntax error.
const KNOWN_KEYWORDS: [&str; 7] = ["SELECT", "WITH", "SHOW", "INSERT", "UPDATE", "DELETE", "EXPLAIN"];

/// A mock database client that returns predefined results.
#[derive(Debug, Clone)]
pub struct MockDatabaseClient {
    kind: DatabaseKind,
    schema: Schema,
    responses: Vec<(String, QueryResult)>,
    closed: Arc<Mutex<bool>>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with an empty schema.
    pub fn new() -> Self {
        Self {
            kind: DatabaseKind::PostgreSql,
            schema: Schema::default(),
            responses: Vec::new(),
            closed: Arc::new(Mutex::new(false)),
        }
    }

    /// Creates a new mock database client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::new()
        }
    }

    /// Sets the reported database kind.
    pub fn with_kind(mut self, kind: DatabaseKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns `result` for any query containing `pattern` (case-insensitive).
    pub fn with_result(mut self, pattern: impl Into<String>, result: QueryResult) -> Self {
        self.responses.push((pattern.into().to_lowercase(), result));
        self
    }

    /// Returns a handle that reports whether `close` has been called.
    pub fn closed_flag(&self) -> Arc<Mutex<bool>> {
        Arc::clone(&self.closed)
    }

    /// A small shop schema with users and orders.
    pub fn sample_schema() -> Schema {
        Schema {
            tables: vec![
                Table::new("users")
                    .with_column(Column::new("id", "integer").nullable(false))
                    .with_column(Column::new("email", "varchar(255)").nullable(false))
                    .with_column(Column::new("name", "varchar(100)"))
                    .with_primary_key(&["id"]),
                Table::new("orders")
                    .with_column(Column::new("id", "integer").nullable(false))
                    .with_column(Column::new("user_id", "integer").nullable(false))
                    .with_column(Column::new("total", "numeric(10,2)").nullable(false))
                    .with_primary_key(&["id"]),
            ],
            foreign_keys: vec![ForeignKey::new(
                "orders",
                vec!["user_id".to_string()],
                "users",
                vec!["id".to_string()],
            )],
        }
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    fn kind(&self) -> DatabaseKind {
        self.kind
    }

    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn sample_rows(&self, table: &str, _limit: usize) -> Result<QueryResult> {
        if self.schema.table(table).is_none() {
            return Err(ChatDbError::execution(format!(
                "relation \"{table}\" does not exist"
            )));
        }
        Ok(QueryResult::new())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let sql_lower = sql.to_lowercase();
        if let Some((_, result)) = self
            .responses
            .iter()
            .find(|(pattern, _)| sql_lower.contains(pattern.as_str()))
        {
            return Ok(result.clone());
        }

        let sql_upper = sql.trim_start().to_uppercase();
        if !KNOWN_KEYWORDS.iter().any(|kw| sql_upper.starts_with(kw)) {
            let near = sql.split_whitespace().next().unwrap_or("");
            return Err(ChatDbError::execution(format!(
                "syntax error at or near \"{near}\""
            )));
        }

        if sql_upper.starts_with("SELECT") || sql_upper.starts_with("WITH") {
            let columns = vec![ColumnInfo::new("result", "TEXT")];
            let rows = vec![vec![Value::String(format!("Mock result for: {}", sql))]];
            Ok(QueryResult::with_data(columns, rows).with_execution_time(Duration::from_millis(1)))
        } else {
            Ok(QueryResult::new().with_execution_time(Duration::from_millis(1)))
        }
    }

    async fn close(&self) -> Result<()> {
        if let Ok(mut closed) = self.closed.lock() {
            *closed = true;
        }
        Ok(())
    }
}

/// A connector that hands out mock clients and records every URL it is asked to open.
#[derive(Debug, Clone)]
pub struct MockConnector {
    client: MockDatabaseClient,
    failure: Option<String>,
    opened: Arc<Mutex<Vec<String>>>,
}

impl MockConnector {
    /// Creates a connector whose clients use the sample shop schema.
    pub fn new() -> Self {
        Self::with_client(MockDatabaseClient::with_schema(MockDatabaseClient::sample_schema()))
    }

    /// Creates a connector that hands out clones of `client`.
    pub fn with_client(client: MockDatabaseClient) -> Self {
        Self {
            client,
            failure: None,
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Makes every `open` fail with a connection error carrying `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Returns the URLs passed to `open`, in call order.
    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().map(|urls| urls.clone()).unwrap_or_default()
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, url: &str) -> Result<Box<dyn DatabaseClient>> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(url.to_string());
        }

        if let Some(message) = &self.failure {
            return Err(ChatDbError::connection(message.clone()));
        }

        let target = DriverUrl::parse(url)?;
        Ok(Box::new(self.client.clone().with_kind(target.kind)))
    }
}
