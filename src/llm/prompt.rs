//! Prompt templates for the two pipeline stages.
//!
//! Templates are rendered with minijinja: values are referenced as
//! `{{ question }}`, `{{ schema }}` and so on. Substituted values are never
//! rendered again, and referencing a name the stage does not provide is an
//! error.

use std::collections::BTreeMap;

use minijinja::{context, Environment, UndefinedBehavior};

use crate::error::{ChatDbError, Result};

/// Values available to the query-synthesis template.
pub const QUERY_PLACEHOLDERS: &[&str] = &["question", "schema"];

/// Values available to the result-narration template.
pub const ANSWER_PLACEHOLDERS: &[&str] = &["question", "schema", "query", "result"];

/// Default template for turning a question into a query.
pub const QUERY_TEMPLATE: &str = r#"You are a SQL expert. Based on the database schema below, write the SQL query that answers the user's question.

{{ schema }}

Question: {{ question }}

Return ONLY the SQL query. Do not wrap it in code fences and do not add any explanation."#;

/// Default template for narrating a query result.
pub const ANSWER_TEMPLATE: &str = r#"You are a helpful data analyst. Using the database schema, the question, the SQL query that was run and its result, write a short natural-language answer for the user.

{{ schema }}

Question: {{ question }}
SQL query: {{ query }}
SQL result: {{ result }}

Answer:"#;

/// The pair of templates the pipeline uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    query: String,
    answer: String,
}

impl Prompts {
    /// Builds the templates, replacing the defaults with any overrides.
    ///
    /// Each template is test-rendered so that syntax errors and unknown
    /// names fail here instead of mid-question.
    pub fn from_overrides(query: Option<&str>, answer: Option<&str>) -> Result<Self> {
        let prompts = Self {
            query: query.unwrap_or(QUERY_TEMPLATE).to_string(),
            answer: answer.unwrap_or(ANSWER_TEMPLATE).to_string(),
        };
        validate("query", &prompts.query, QUERY_PLACEHOLDERS)?;
        validate("answer", &prompts.answer, ANSWER_PLACEHOLDERS)?;
        Ok(prompts)
    }

    /// Renders the query-synthesis template.
    pub fn query_prompt(&self, question: &str, schema: &str) -> Result<String> {
        render(
            "query",
            &self.query,
            context! { question => question, schema => schema },
        )
    }

    /// Renders the result-narration template.
    pub fn answer_prompt(
        &self,
        question: &str,
        schema: &str,
        query: &str,
        result: &str,
    ) -> Result<String> {
        render(
            "answer",
            &self.answer,
            context! { question => question, schema => schema, query => query, result => result },
        )
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            query: QUERY_TEMPLATE.to_string(),
            answer: ANSWER_TEMPLATE.to_string(),
        }
    }
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env
}

fn render<S: serde::Serialize>(stage: &str, source: &str, ctx: S) -> Result<String> {
    environment()
        .render_str(source, ctx)
        .map_err(|e| ChatDbError::config(format!("Failed to render {stage} prompt: {e}")))
}

fn validate(stage: &str, source: &str, allowed: &[&str]) -> Result<()> {
    let sample: BTreeMap<&str, &str> = allowed.iter().map(|name| (*name, "")).collect();
    environment().render_str(source, &sample).map_err(|e| {
        ChatDbError::config(format!(
            "Invalid {stage} prompt template: {e} (available values: {})",
            allowed.join(", ")
        ))
    })?;
    Ok(())
}
