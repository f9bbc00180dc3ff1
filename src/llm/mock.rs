//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{ChatDbError, Result};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Prompts that carry an `SQL result:` line are treated as narration requests
/// and answered with a sentence quoting the result. Anything else is treated
/// as query synthesis and answered with a bare SQL statement.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// Error message returned by every call when set.
    failure: Option<String>,
    /// Prompts received, in call order.
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the input contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Makes every call fail with a generation error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Returns the prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Generates a mock response based on the input.
    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if let Some(result) = line_value(input, "SQL result:") {
            return format!("According to the database, the result is {}.", result);
        }

        let question = line_value(input, "Question:")
            .unwrap_or(input)
            .to_lowercase();

        if question.contains("count") || question.contains("how many") {
            if question.contains("orders") {
                return "SELECT COUNT(*) FROM orders".to_string();
            }
            if question.contains("users") {
                return "SELECT COUNT(*) FROM users".to_string();
            }
        }

        if question.contains("all users") || question.contains("show users") {
            return "SELECT * FROM users".to_string();
        }

        if question.contains("orders") && question.contains("user") {
            return "SELECT o.* FROM orders o JOIN users u ON o.user_id = u.id".to_string();
        }

        if question.contains("delete") && question.contains("user") {
            return "DELETE FROM users WHERE id = 1".to_string();
        }

        "SELECT 1".to_string()
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

/// Returns the trimmed text after `prefix` on the first line that starts with it.
fn line_value<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    input
        .lines()
        .find_map(|line| line.trim_start().strip_prefix(prefix))
        .map(str::trim)
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let input = Self::extract_user_input(messages);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(input.clone());
        }

        if let Some(message) = &self.failure {
            return Err(ChatDbError::generation(message.clone()));
        }

        Ok(self.mock_response(&input))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
