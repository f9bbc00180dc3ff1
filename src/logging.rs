//! Logging configuration for chat-db.
//!
//! The REPL owns stdout, so logs go to a file by default. `--log-stderr`
//! sends them to stderr instead.

use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initializes logging to the log file or to stderr.
pub fn init(log_stderr: bool) {
    if log_stderr {
        init_stderr_logging();
    } else {
        init_file_logging();
    }
}

/// Initializes logging to `get_log_path()`.
///
/// Falls back to no logging if the file cannot be created.
pub fn init_file_logging() {
    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            return;
        }
    }

    // Truncated on each run
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Returns the path for the log file.
///
/// Uses the XDG state directory on Linux (`~/.local/state/chat-db/chat-db.log`),
/// then the config directory, then the temp directory.
pub fn get_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("chat-db").join("chat-db.log");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("chat-db").join("chat-db.log");
    }

    std::env::temp_dir().join("chat-db.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_is_absolute() {
        assert!(get_log_path().is_absolute());
    }

    #[test]
    fn test_log_path_file_name() {
        assert!(get_log_path().ends_with("chat-db.log"));
    }
}
