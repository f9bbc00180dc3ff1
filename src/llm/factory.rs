//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::Result;
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OllamaClient, OllamaConfig};

/// Creates an LLM client for the configured provider.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let model = config.resolved_model();

    match config.provider {
        LlmProvider::Ollama => {
            let mut ollama = OllamaConfig::new(model);
            if let Some(url) = config.resolved_base_url() {
                ollama = ollama.with_url(url);
            }
            if let Some(timeout) = config.timeout_secs {
                ollama = ollama.with_timeout(timeout);
            }
            Ok(Arc::new(OllamaClient::new(ollama)?))
        }
        LlmProvider::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}
