//! Query result types for chat-db.
//!
//! Defines the structures used to represent query results from the database
//! and their text rendering for the answer prompt.

use std::fmt;
use std::time::Duration;

/// Maximum rows kept from a single query.
pub const MAX_ROWS: usize = 1000;

/// Represents the result of executing a SQL query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Column metadata for the result set.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,

    /// Time taken to execute the query.
    pub execution_time: Duration,

    /// Total number of rows before truncation.
    pub total_rows: usize,
}

impl QueryResult {
    /// Creates a new empty query result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query result with the given columns and rows, keeping at
    /// most `MAX_ROWS` rows.
    pub fn with_data(columns: Vec<ColumnInfo>, mut rows: Vec<Row>) -> Self {
        let total_rows = rows.len();
        rows.truncate(MAX_ROWS);
        Self {
            columns,
            rows,
            execution_time: Duration::ZERO,
            total_rows,
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true if rows were dropped to stay under `MAX_ROWS`.
    pub fn was_truncated(&self) -> bool {
        self.total_rows > self.rows.len()
    }

    /// Renders the rows as a list of tuples, e.g. `[(1, 'Alice'), (2, NULL)]`.
    ///
    /// This is the "result" handed to the answer prompt.
    pub fn to_result_text(&self) -> String {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let values = row.iter().map(Value::to_literal).collect::<Vec<_>>();
                if values.len() == 1 {
                    format!("({},)", values[0])
                } else {
                    format!("({})", values.join(", "))
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("[{}]", rows)
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type, as reported by the driver.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents a single value from a database query.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Builds a typed value from a text-protocol cell and the column's type name.
    ///
    /// Cells that do not parse as their declared type are kept as strings.
    pub fn from_text(type_name: &str, text: Option<String>) -> Self {
        let Some(text) = text else {
            return Value::Null;
        };

        let type_upper = type_name.to_uppercase();
        match type_upper.as_str() {
            "BOOL" | "BOOLEAN" => match text.as_str() {
                "t" | "true" | "1" => Value::Bool(true),
                "f" | "false" | "0" => Value::Bool(false),
                _ => Value::String(text),
            },
            "INT2" | "INT4" | "INT8" | "SMALLINT" | "INT" | "INTEGER" | "BIGINT" | "TINYINT"
            | "MEDIUMINT" | "SMALLINT UNSIGNED" | "INT UNSIGNED" | "TINYINT UNSIGNED"
            | "MEDIUMINT UNSIGNED" | "BIGINT UNSIGNED" | "YEAR" => text
                .parse::<i64>()
                .map(Value::Int)
                .unwrap_or(Value::String(text)),
            "FLOAT4" | "FLOAT8" | "REAL" | "DOUBLE PRECISION" | "FLOAT" | "DOUBLE" => text
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or(Value::String(text)),
            _ => Value::String(text),
        }
    }

    /// Attempts to convert the value to a string representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }

    /// Renders the value as it appears inside a result tuple: strings are
    /// single-quoted, everything else is bare.
    pub fn to_literal(&self) -> String {
        match self {
            Value::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_display_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

// Conversion implementations for common types
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
