//! Error types for chat-db.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for chat-db operations.
#[derive(Error, Debug)]
pub enum ChatDbError {
    /// Database connection errors (malformed URL, host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// A connection form named a database type with no URL template.
    #[error("Unsupported database type: {0}")]
    UnsupportedKind(String),

    /// LLM transport or inference errors.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Query execution errors (syntax errors, permission denied, etc.)
    #[error("Execution error: {0}")]
    Execution(String),

    /// Credential file errors (unwritable path, invalid JSON).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration errors (invalid config file, bad CLI values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A generated query was rejected by the read-only guard.
    #[error("Unsafe query rejected: {0}")]
    Unsafe(String),
}

impl ChatDbError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates an unsupported-kind error for the given database type.
    pub fn unsupported_kind(kind: impl Into<String>) -> Self {
        Self::UnsupportedKind(kind.into())
    }

    /// Creates a generation error with the given message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a persistence error with the given message.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an unsafe-query error with the given message.
    pub fn unsafe_query(msg: impl Into<String>) -> Self {
        Self::Unsafe(msg.into())
    }

    /// Returns true for errors raised while establishing a connection.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::UnsupportedKind(_))
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) | Self::UnsupportedKind(_) => "Connection Error",
            Self::Generation(_) => "Generation Error",
            Self::Execution(_) => "Execution Error",
            Self::Persistence(_) => "Persistence Error",
            Self::Config(_) => "Configuration Error",
            Self::Unsafe(_) => "Safety Error",
        }
    }
}

/// Result type alias using ChatDbError.
pub type Result<T> = std::result::Result<T, ChatDbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_connection() {
        let err = ChatDbError::connection("Cannot connect to localhost:3306");
        assert_eq!(
            err.to_string(),
            "Connection error: Cannot connect to localhost:3306"
        );
        assert_eq!(err.category(), "Connection Error");
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_error_display_unsupported_kind() {
        let err = ChatDbError::unsupported_kind("SQLite");
        assert_eq!(err.to_string(), "Unsupported database type: SQLite");
        assert_eq!(err.category(), "Connection Error");
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_error_display_execution() {
        let err = ChatDbError::execution("Table 'rag_test.ordrs' doesn't exist");
        assert_eq!(
            err.to_string(),
            "Execution error: Table 'rag_test.ordrs' doesn't exist"
        );
        assert_eq!(err.category(), "Execution Error");
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_error_display_generation() {
        let err = ChatDbError::generation("Failed to connect to Ollama");
        assert_eq!(
            err.to_string(),
            "Generation error: Failed to connect to Ollama"
        );
        assert_eq!(err.category(), "Generation Error");
    }

    #[test]
    fn test_error_display_persistence() {
        let err = ChatDbError::persistence("permission denied");
        assert_eq!(err.to_string(), "Persistence error: permission denied");
        assert_eq!(err.category(), "Persistence Error");
    }

    #[test]
    fn test_error_display_unsafe() {
        let err = ChatDbError::unsafe_query("DELETE statements are not allowed");
        assert_eq!(
            err.to_string(),
            "Unsafe query rejected: DELETE statements are not allowed"
        );
        assert_eq!(err.category(), "Safety Error");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChatDbError>();
    }
}
