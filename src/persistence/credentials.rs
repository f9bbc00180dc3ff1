//! Last-used connection persistence.
//!
//! A single JSON object in a flat file, overwritten on every save.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::connection::ConnectionDescriptor;
use crate::error::{ChatDbError, Result};

/// File name of the credential record inside the config directory.
pub const CREDENTIALS_FILE_NAME: &str = "connection_info.json";

/// Reads and writes the persisted connection record.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Creates a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the default credential file path for the current platform.
    ///
    /// - Linux: `~/.config/chat-db/connection_info.json`
    /// - macOS: `~/Library/Application Support/chat-db/connection_info.json`
    /// - Windows: `%APPDATA%\chat-db\connection_info.json`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ChatDbError::persistence("Could not determine config directory")
        })?;
        Ok(config_dir.join("chat-db").join(CREDENTIALS_FILE_NAME))
    }

    /// Returns the path of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the record, replacing any previous content.
    ///
    /// The password is stored in plain text. On Unix the file is created
    /// with mode 0600.
    pub fn save(&self, record: &ConnectionDescriptor) -> Result<()> {
        self.ensure_parent_dirs()?;

        let json = serde_json::to_string(record)
            .map_err(|e| ChatDbError::persistence(format!("Failed to serialize record: {e}")))?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).map_err(|e| {
            ChatDbError::persistence(format!(
                "Failed to open {} for writing: {e}",
                self.path.display()
            ))
        })?;
        // The mode above only applies when the file is created
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| {
                    ChatDbError::persistence(format!(
                        "Failed to restrict permissions on {}: {e}",
                        self.path.display()
                    ))
                })?;
        }
        file.write_all(json.as_bytes()).map_err(|e| {
            ChatDbError::persistence(format!("Failed to write {}: {e}", self.path.display()))
        })?;

        if !record.password.is_empty() {
            warn!(
                "Connection password stored in plain text at {}",
                self.path.display()
            );
        }
        info!("Saved connection info to {}", self.path.display());
        Ok(())
    }

    /// Reads the record. A missing file is `Ok(None)`, not an error.
    pub fn load(&self) -> Result<Option<ConnectionDescriptor>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No credential file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(ChatDbError::persistence(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        serde_json::from_str(&content).map(Some).map_err(|e| {
            ChatDbError::persistence(format!(
                "Invalid connection info in {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Reads the record for startup use: a missing file is `None`, and an
    /// unreadable or unparsable file is logged and treated as missing.
    pub fn load_or_warn(&self) -> Option<ConnectionDescriptor> {
        self.load().unwrap_or_else(|e| {
            warn!("{e}. Using default connection settings.");
            None
        })
    }

    fn ensure_parent_dirs(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if parent.as_os_str().is_empty() {
                return Ok(());
            }
            fs::create_dir_all(parent).map_err(|e| {
                ChatDbError::persistence(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        Ok(())
    }
}
