//! PostgreSQL client over a single-connection sqlx pool.
//!
//! Generated queries run through the simple-query protocol, so every cell is
//! read as text and typed afterwards from the column's type name.

use crate::connection::DatabaseKind;
use crate::db::schema::group_foreign_keys;
use crate::db::{
    Column, ColumnInfo, DatabaseClient, ForeignKey, QueryResult, Row, Schema, Table, Value,
};
use crate::error::{ChatDbError, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connects to the database at the given `postgres://` URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(|e| map_connection_error(e, url))?;

        debug!("Successfully connected to PostgreSQL");
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::PostgreSql
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
            "SELECT * FROM \"{}\" LIMIT {}",
            table.replace('"', "\"\""),
            limit
        );
        self.execute_query(&sql).await
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let rows = sqlx::raw_sql(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ChatDbError::execution(format_query_error(e)))?;

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

/// `(table, column, data_type, is_nullable, default, in_primary_key)`
type ColumnRow = (String, String, String, String, Option<String>, bool);

impl PostgresClient {
    /// Reads every column of every base table in `public` in one round trip.
    async fn fetch_tables(&self) -> Result<Vec<Table>> {
        let rows: Vec<ColumnRow> = sqlx::query_as(
            r#"
            SELECT
                c.table_name::text,
                c.column_name::text,
                c.data_type::text,
                c.is_nullable::text,
                c.column_default::text,
                EXISTS (
                    SELECT 1
                    FROM information_schema.table_constraints tc
                    JOIN information_schema.key_column_usage kcu
                        ON kcu.constraint_name = tc.constraint_name
                        AND kcu.table_schema = tc.table_schema
                    WHERE tc.constraint_type = 'PRIMARY KEY'
                        AND tc.table_schema = c.table_schema
                        AND tc.table_name = c.table_name
                        AND kcu.column_name = c.column_name
                )
            FROM information_schema.columns c
            JOIN information_schema.tables t
                ON t.table_schema = c.table_schema AND t.table_name = c.table_name
            WHERE c.table_schema = 'public' AND t.table_type = 'BASE TABLE'
            ORDER BY c.table_name, c.ordinal_position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatDbError::execution(format!("Failed to read table columns: {e}")))?;

        Ok(group_columns(rows))
    }

    async fn fetch_foreign_keys(&self) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT
                src.relname::text,
                src_col.attname::text,
                dst.relname::text,
                dst_col.attname::text
            FROM pg_constraint con
            JOIN pg_class src ON src.oid = con.conrelid
            JOIN pg_class dst ON dst.oid = con.confrelid
            JOIN pg_namespace ns ON ns.oid = src.relnamespace
            CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(src_num, dst_num, pos)
            JOIN pg_attribute src_col ON src_col.attrelid = con.conrelid AND src_col.attnum = k.src_num
            JOIN pg_attribute dst_col ON dst_col.attrelid = con.confrelid AND dst_col.attnum = k.dst_num
            WHERE con.contype = 'f' AND ns.nspname = 'public'
            ORDER BY src.relname, con.conname, k.pos
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatDbError::execution(format!("Failed to read foreign keys: {e}")))?;

        Ok(group_foreign_keys(rows))
    }
}

/// Folds column rows, ordered by table, into tables.
fn group_columns(rows: Vec<ColumnRow>) -> Vec<Table> {
    let mut tables: Vec<Table> = Vec::new();
    for (table, name, data_type, is_nullable, default, in_key) in rows {
        if tables.last().map_or(true, |t| t.name != table) {
            tables.push(Table::new(table));
        }
        if let Some(current) = tables.last_mut() {
            if in_key {
                current.primary_key.push(name.clone());
            }
            current.columns.push(Column {
                name,
                data_type,
                is_nullable: is_nullable == "YES",
                default,
            });
        }
    }
    tables
}

/// Converts a text-protocol PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let text = row.try_get_unchecked::<Option<String>, _>(i).ok().flatten();
            Value::from_text(col.type_info().name(), text)
        })
        .collect()
}

/// Turns a failed connect into a Connection error naming the server, never the password.
fn map_connection_error(error: sqlx::Error, url: &str) -> ChatDbError {
    let server = Url::parse(url)
        .ok()
        .and_then(|u| {
            let host = u.host_str()?.to_string();
            Some(format!("{host}:{}", u.port().unwrap_or(5432)))
        })
        .unwrap_or_else(|| "the server".to_string());

    match &error {
        sqlx::Error::Database(db_error) => match db_error.code().as_deref() {
            // invalid_password, invalid_authorization_specification
            Some("28P01") | Some("28000") => ChatDbError::connection(format!(
                "Authentication failed: {}. Check your credentials.",
                db_error.message()
            )),
            _ => ChatDbError::connection(db_error.message().to_string()),
        },
        sqlx::Error::Io(io) => ChatDbError::connection(format!(
            "Cannot connect to {server}: {io}. Check that the server is running."
        )),
        sqlx::Error::PoolTimedOut => {
            ChatDbError::connection(format!("Connection to {server} timed out."))
        }
        _ => ChatDbError::connection(error.to_string()),
    }
}

/// Formats a query error with PostgreSQL detail and hint if available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }

    result
}
