//! Connection descriptors and URL rendering.
//!
//! A descriptor is the discrete-field form of a connection target. Each
//! supported database kind renders a descriptor into exactly one URL.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ChatDbError, Result};

/// Database kinds that have a connection URL template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    MySql,
    PostgreSql,
    Oracle,
}

impl DatabaseKind {
    /// Returns the display name, which is also the persisted `db_type` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::PostgreSql => "PostgreSQL",
            Self::Oracle => "Oracle",
        }
    }

    /// Returns the dialect half of the URL scheme.
    pub fn dialect(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
            Self::Oracle => "oracle",
        }
    }

    /// Returns the adapter token that selects the wire driver.
    pub fn driver(&self) -> &'static str {
        match self {
            Self::MySql | Self::PostgreSql => "sqlx",
            Self::Oracle => "odpi",
        }
    }

    /// Returns the full `dialect+driver` URL scheme.
    pub fn url_scheme(&self) -> String {
        format!("{}+{}", self.dialect(), self.driver())
    }

    /// Parses a kind from its display name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Some(Self::MySql),
            "postgresql" | "postgres" => Some(Self::PostgreSql),
            "oracle" => Some(Self::Oracle),
            _ => None,
        }
    }

    /// Resolves a kind from a URL scheme, with or without a `+driver` suffix.
    pub fn from_url_scheme(scheme: &str) -> Option<Self> {
        let dialect = scheme.split('+').next().unwrap_or(scheme);
        match dialect.to_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::MySql),
            "postgres" | "postgresql" => Some(Self::PostgreSql),
            "oracle" => Some(Self::Oracle),
            _ => None,
        }
    }
}

impl FromStr for DatabaseKind {
    type Err = ChatDbError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ChatDbError::unsupported_kind(s))
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_db_type() -> String {
    DatabaseKind::MySql.as_str().to_string()
}

/// Discrete connection fields, as submitted by a connection form and as
/// persisted in the credential file.
///
/// `db_type` stays a string so that an unrecognized value can be carried
/// through to `to_url`, which rejects it. `port` is not validated.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    #[serde(default = "default_db_type")]
    pub db_type: String,
    pub username: String,
    pub port: String,
    pub host: String,
    pub password: String,
    pub database: String,
}

impl ConnectionDescriptor {
    /// Creates a descriptor from its fields.
    pub fn new(
        db_type: impl Into<String>,
        username: impl Into<String>,
        port: impl Into<String>,
        host: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            db_type: db_type.into(),
            username: username.into(),
            port: port.into(),
            host: host.into(),
            password: password.into(),
            database: database.into(),
        }
    }

    /// Returns the database kind, or `UnsupportedKind` if `db_type` is not recognized.
    pub fn kind(&self) -> Result<DatabaseKind> {
        self.db_type.parse()
    }

    /// Renders the descriptor into its connection URL.
    ///
    /// Fields are substituted verbatim: `{scheme}://{user}:{pass}@{host}:{port}/{db}`.
    pub fn to_url(&self) -> Result<String> {
        let kind = self.kind()?;
        Ok(format!(
            "{}://{}:{}@{}:{}/{}",
            kind.url_scheme(),
            self.username,
            self.password,
            self.host,
            self.port,
            self.database
        ))
    }

    /// Returns a display-safe string (no password) for UI purposes.
    pub fn display_string(&self) -> String {
        format!(
            "{} @ {}:{} ({})",
            self.database, self.host, self.port, self.db_type
        )
    }
}

impl Default for ConnectionDescriptor {
    /// The form defaults used when no credential file exists.
    fn default() -> Self {
        Self::new(default_db_type(), "root", "3306", "localhost", "", "rag_test")
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("db_type", &self.db_type)
            .field("username", &self.username)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Returns the URL with its password replaced, for logging.
///
/// Strings that do not parse as URLs are returned as `<unparseable url>` since
/// they may still embed credentials.
pub fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => "<unparseable url>".to_string(),
    }
}
