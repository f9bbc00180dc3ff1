//! Configuration management for chat-db.
//!
//! Handles loading configuration from a TOML file and environment variables.
//! Precedence is CLI flags, then the file, then environment defaults.

use crate::error::{ChatDbError, Result};
use crate::llm::{LlmProvider, Prompts, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL};
use crate::persistence::CredentialStore;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Where the last connection descriptor is stored.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Prompt template overrides.
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Schema description settings.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Query safety settings.
    #[serde(default)]
    pub safety: SafetyConfig,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// LLM provider: "ollama" or "mock".
    #[serde(default)]
    pub provider: LlmProvider,

    /// Model name. Falls back to `OLLAMA_MODEL`, then the provider default.
    pub model: Option<String>,

    /// API base URL. Falls back to `OLLAMA_URL` for Ollama.
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl LlmConfig {
    /// Returns the model to use, consulting the environment when unset.
    pub fn resolved_model(&self) -> String {
        if let Some(model) = &self.model {
            return model.clone();
        }
        match self.provider {
            LlmProvider::Ollama => env_or("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
            LlmProvider::Mock => "mock".to_string(),
        }
    }

    /// Returns the base URL to use, consulting the environment when unset.
    pub fn resolved_base_url(&self) -> Option<String> {
        if self.base_url.is_some() {
            return self.base_url.clone();
        }
        match self.provider {
            LlmProvider::Ollama => Some(env_or("OLLAMA_URL", DEFAULT_OLLAMA_URL)),
            LlmProvider::Mock => None,
        }
    }
}

/// Credential file settings.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path of the JSON credential file.
    pub credentials_path: Option<PathBuf>,
}

/// Prompt template overrides.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PromptConfig {
    /// Query-synthesis template (`{{ question }}`, `{{ schema }}`).
    pub query: Option<String>,
    /// Result-narration template (`{{ question }}`, `{{ schema }}`, `{{ query }}`, `{{ result }}`).
    pub answer: Option<String>,
}

/// Schema description settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// Sample rows shown per table (0 disables sampling).
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
}

fn default_sample_rows() -> usize {
    crate::connection::DEFAULT_SAMPLE_ROWS
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            sample_rows: default_sample_rows(),
        }
    }
}

/// Query safety settings.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SafetyConfig {
    /// Reject generated queries that are not read-only.
    #[serde(default)]
    pub read_only: bool,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chat-db")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ChatDbError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ChatDbError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Builds the prompt templates, validating any overrides.
    pub fn prompts(&self) -> Result<Prompts> {
        Prompts::from_overrides(self.prompts.query.as_deref(), self.prompts.answer.as_deref())
    }

    /// Returns the credential store at the configured or default location.
    pub fn credential_store(&self) -> Result<CredentialStore> {
        match &self.storage.credentials_path {
            Some(path) => Ok(CredentialStore::new(path.clone())),
            None => Ok(CredentialStore::new(CredentialStore::default_path()?)),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
