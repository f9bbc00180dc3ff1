//! LLM integration for chat-db.
//!
//! Provides the `LlmClient` trait, provider implementations, and the
//! `Gateway` the pipeline calls with filled prompts.

mod factory;
mod mock;
mod ollama;
pub mod prompt;
mod types;

pub use factory::create_client;
pub use mock::MockLlmClient;
pub use ollama::{OllamaClient, OllamaConfig, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL};
pub use prompt::Prompts;
pub use types::{Message, Role};

use async_trait::async_trait;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages.
    ///
    /// Returns the complete response as a single string.
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Returns the model the client sends requests to.
    fn model_name(&self) -> &str;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Local Ollama instance
    #[default]
    Ollama,
    /// Mock client for testing (no server required)
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sends a filled prompt to a model and returns the generated text.
///
/// Each call is independent: the prompt is sent as a single user message.
#[derive(Clone)]
pub struct Gateway {
    client: Arc<dyn LlmClient>,
}

impl Gateway {
    /// Wraps an LLM client.
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Generates text for a filled prompt.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(
            "Generating with {} ({} prompt chars)",
            self.client.model_name(),
            prompt.len()
        );
        self.client.complete(&[Message::user(prompt)]).await
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("model", &self.client.model_name())
            .finish()
    }
}
