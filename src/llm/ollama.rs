//! Client for a local Ollama server.
//!
//! Sends non-streaming requests to `/api/chat` and returns the reply text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatDbError, Result};
use crate::llm::types::Message;
use crate::llm::LlmClient;

/// Default Ollama server address.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default model name.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

/// Local models can take a while to load on first use.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Where and how to reach the Ollama server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl OllamaConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Uses a different server address. A trailing slash is dropped.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_MODEL)
    }
}

/// An `LlmClient` backed by Ollama's chat endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatDbError::generation(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}/api/chat", config.base_url),
            model: config.model,
        })
    }

    fn transport_error(&self, error: reqwest::Error) -> ChatDbError {
        if error.is_timeout() {
            ChatDbError::generation(format!("Ollama did not answer in time ({})", self.endpoint))
        } else if error.is_connect() {
            ChatDbError::generation(format!(
                "Cannot reach Ollama at {}. Start it with `ollama serve`.",
                self.endpoint
            ))
        } else {
            ChatDbError::generation(format!("Ollama request failed: {error}"))
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };
        debug!("POST {} ({} messages)", self.endpoint, messages.len());

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(ChatDbError::generation(format!(
                "Ollama returned {status}: {text}"
            )));
        }

        parse_reply(&text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatReply {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

fn parse_reply(body: &str) -> Result<String> {
    serde_json::from_str::<ChatReply>(body)
        .map(|reply| reply.message.content)
        .map_err(|e| ChatDbError::generation(format!("Unexpected reply from Ollama: {e}")))
}
