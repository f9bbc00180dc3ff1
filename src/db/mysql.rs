//! MySQL database client implementation.
//!
//! Mirrors `PostgresClient`, introspecting the schema of the database named
//! in the connection URL.

use crate::connection::DatabaseKind;
use crate::db::schema::group_foreign_keys;
use crate::db::{Column, ColumnInfo, DatabaseClient, QueryResult, Row, Schema, Table, Value};
use crate::error::{ChatDbError, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use std::time::{Duration, Instant};
use tracing::debug;

/// MySQL database client.
#[derive(Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
}

impl MySqlClient {
    /// Connects to the database at the given `mysql://` URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(map_connection_error)?;

        debug!("Successfully connected to MySQL");
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::MySql
    }

    async fn introspect_schema(&self) -> Result<Schema> {
        let tables = self.fetch_tables().await?;
        let foreign_keys = self.fetch_foreign_keys().await?;

        Ok(Schema {
            tables,
            foreign_keys,
        })
    }

    async fn sample_rows(&self, table: &str, limit: usize) -> Result<QueryResult> {
        let sql = format!(
            "SELECT * FROM `{}` LIMIT {}",
            table.replace('`', "``"),
            limit
        );
        self.execute_query(&sql).await
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        // Text protocol (COM_QUERY): every cell arrives as text.
        let rows = sqlx::raw_sql(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(format_query_error)?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let rows: Vec<Row> = rows.iter().map(convert_row).collect();

        Ok(QueryResult::with_data(columns, rows).with_execution_time(execution_time))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

impl MySqlClient {
    /// Fetches all base tables in the current database.
    async fn fetch_tables(&self) -> Result<Vec<Table>> {
        let table_names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT CAST(table_name AS CHAR)
            FROM information_schema.tables
            WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatDbError::execution(format!("Failed to fetch tables: {e}")))?;

        let mut tables = Vec::with_capacity(table_names.len());

        for table_name in table_names {
            let (columns, primary_key) = self.fetch_columns(&table_name).await?;

            tables.push(Table {
                name: table_name,
                columns,
                primary_key,
                sample: None,
            });
        }

        Ok(tables)
    }

    /// Fetches columns and primary key columns for a specific table.
    async fn fetch_columns(&self, table_name: &str) -> Result<(Vec<Column>, Vec<String>)> {
        let rows: Vec<(String, String, String, Option<String>, String)> = sqlx::query_as(
            r#"
            SELECT
                CAST(column_name AS CHAR),
                CAST(column_type AS CHAR),
                CAST(is_nullable AS CHAR),
                CAST(column_default AS CHAR),
                CAST(column_key AS CHAR)
            FROM information_schema.columns
            WHERE table_schema = DATABASE() AND table_name = ?
            ORDER BY ordinal_position
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            ChatDbError::execution(format!("Failed to fetch columns for {table_name}: {e}"))
        })?;

        let primary_key = rows
            .iter()
            .filter(|(_, _, _, _, key)| key == "PRI")
            .map(|(name, ..)| name.clone())
            .collect();

        let columns = rows
            .into_iter()
            .map(|(name, data_type, is_nullable, default, _)| Column {
                name,
                data_type,
                is_nullable: is_nullable == "YES",
                default,
            })
            .collect();

        Ok((columns, primary_key))
    }

    /// Fetches all foreign key relationships in the current database.
    async fn fetch_foreign_keys(&self) -> Result<Vec<crate::db::ForeignKey>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT
                CAST(table_name AS CHAR),
                CAST(column_name AS CHAR),
                CAST(referenced_table_name AS CHAR),
                CAST(referenced_column_name AS CHAR)
            FROM information_schema.key_column_usage
            WHERE table_schema = DATABASE()
                AND referenced_table_name IS NOT NULL
            ORDER BY table_name, ordinal_position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatDbError::execution(format!("Failed to fetch foreign keys: {e}")))?;

        Ok(group_foreign_keys(rows))
    }
}

/// Converts a text-protocol MySqlRow to our Row type.
///
/// Binary cells that are not valid UTF-8 are kept as bytes.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| match row.try_get_unchecked::<Option<String>, _>(i) {
            Ok(text) => Value::from_text(col.type_info().name(), text),
            Err(_) => row
                .try_get_unchecked::<Option<Vec<u8>>, _>(i)
                .ok()
                .flatten()
                .map(Value::Bytes)
                .unwrap_or(Value::Null),
        })
        .collect()
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error) -> ChatDbError {
    if let Some(db_error) = error.as_database_error() {
        // SQLSTATE 28000: access denied
        return match db_error.code().as_deref() {
            Some("28000") => ChatDbError::connection(format!(
                "Authentication failed: {}. Check your credentials.",
                db_error.message()
            )),
            _ => ChatDbError::connection(db_error.message().to_string()),
        };
    }
    ChatDbError::connection(error.to_string())
}

/// Formats a query error as `ERROR <code>: <message>`.
fn format_query_error(error: sqlx::Error) -> ChatDbError {
    match error.as_database_error() {
        Some(db_error) => match db_error.code() {
            Some(code) => ChatDbError::execution(format!("ERROR {}: {}", code, db_error.message())),
            None => ChatDbError::execution(db_error.message().to_string()),
        },
        None => ChatDbError::execution(error.to_string()),
    }
}
