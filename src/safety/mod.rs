//! Read-only guard for generated queries.
//!
//! Parses a query with sqlparser and decides whether running it could change
//! the database. Only consulted when read-only mode is enabled.

mod guard;

pub use guard::ReadOnlyGuard;

use std::fmt;

/// Category of a parsed SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// SELECT, SHOW, plain EXPLAIN and read-only CTEs.
    Read,
    Insert,
    Update,
    Delete,
    Merge,
    /// A query whose CTEs modify data.
    DataModifyingCte,
    /// SELECT ... INTO, which creates a table.
    SelectInto,
    /// SELECT ... FOR UPDATE / FOR SHARE.
    LockingRead,
    /// DDL and privilege changes (CREATE, ALTER, DROP, TRUNCATE, GRANT, REVOKE).
    Schema,
    /// Anything the guard does not recognize.
    Other,
}

impl StatementKind {
    /// Returns true if the statement cannot modify data or schema.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Read)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read-only query"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Merge => write!(f, "MERGE"),
            Self::DataModifyingCte => write!(f, "data-modifying WITH query"),
            Self::SelectInto => write!(f, "SELECT INTO"),
            Self::LockingRead => write!(f, "locking SELECT"),
            Self::Schema => write!(f, "schema change"),
            Self::Other => write!(f, "unrecognized statement"),
        }
    }
}
