//! Question answering over the connected database.
//!
//! A question goes through two model calls: one that writes a query from the
//! question and schema, and one that explains the query's result. The
//! generated text is executed as-is unless read-only mode is enabled.

use tracing::{debug, info};

use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::llm::{Gateway, Prompts};
use crate::safety::ReadOnlyGuard;

/// Everything produced while answering one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Query text returned by the model.
    pub query: String,
    /// Stringified execution result, or the not-connected placeholder.
    pub result: String,
    /// Narrated answer shown to the user.
    pub text: String,
}

/// Two-stage question → query → answer pipeline.
#[derive(Debug, Clone)]
pub struct QueryPipeline {
    gateway: Gateway,
    prompts: Prompts,
    read_only: bool,
}

impl QueryPipeline {
    /// Creates a pipeline with the default prompts and no read-only check.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            prompts: Prompts::default(),
            read_only: false,
        }
    }

    /// Replaces the prompt templates.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Rejects generated queries that are not read-only before executing them.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Answers a question and returns the narrated text.
    ///
    /// With no live connection the placeholder text stands in for both the
    /// schema and the result, and is narrated like any other result.
    pub async fn ask(&self, manager: &ConnectionManager, question: &str) -> Result<String> {
        Ok(self.answer(manager, question).await?.text)
    }

    /// Answers a question, returning the generated query and raw result too.
    ///
    /// Fails with the first generation, execution, or read-only error.
    pub async fn answer(&self, manager: &ConnectionManager, question: &str) -> Result<Answer> {
        let schema = manager.describe_schema().await?;

        let query_prompt = self.prompts.query_prompt(question, &schema)?;
        let query = self.gateway.generate(&query_prompt).await?;
        info!("Generated query: {}", query);

        if self.read_only {
            if let Some(kind) = manager.connected_kind() {
                ReadOnlyGuard::new(kind).check(&query)?;
            }
        }

        let result = manager.execute(&query).await?;
        debug!("Query result: {} chars", result.len());

        let answer_prompt = self
            .prompts
            .answer_prompt(question, &schema, &query, &result)?;
        let text = self.gateway.generate(&answer_prompt).await?;

        Ok(Answer {
            query,
            result,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::NOT_CONNECTED;
    use crate::db::{ColumnInfo, MockConnector, MockDatabaseClient, QueryResult, Value};
    use crate::error::ChatDbError;
    use crate::llm::MockLlmClient;
    use crate::persistence::CredentialStore;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn manager(client: MockDatabaseClient) -> (ConnectionManager, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("connection_info.json"));
        let connector = MockConnector::with_client(client);
        (ConnectionManager::new(Arc::new(connector), store), dir)
    }

    fn shop_client() -> MockDatabaseClient {
        MockDatabaseClient::with_schema(MockDatabaseClient::sample_schema()).with_result(
            "count(*) from orders",
            QueryResult::with_data(
                vec![ColumnInfo::new("count", "INT8")],
                vec![vec![Value::Int(42)]],
            ),
        )
    }

    #[tokio::test]
    async fn test_ask_runs_both_stages() {
        let (mut manager, _dir) = manager(shop_client());
        manager.connect_from_url("postgres://a@h/shop").await.unwrap();

        let llm = MockLlmClient::new();
        let pipeline = QueryPipeline::new(Gateway::new(Arc::new(llm.clone())));

        let answer = pipeline
            .answer(&manager, "How many orders are there?")
            .await
            .unwrap();

        assert_eq!(answer.query, "SELECT COUNT(*) FROM orders");
        assert_eq!(answer.result, "[(42,)]");
        assert_eq!(answer.text, "According to the database, the result is [(42,)].");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Table: orders"));
        assert!(prompts[0].contains("How many orders are there?"));
        assert!(prompts[1].contains("SQL query: SELECT COUNT(*) FROM orders"));
        assert!(prompts[1].contains("Table: orders"));
    }

    #[tokio::test]
    async fn test_ask_without_connection_narrates_placeholder() {
        let (manager, _dir) = manager(shop_client());
        let pipeline = QueryPipeline::new(Gateway::new(Arc::new(MockLlmClient::new())));

        let answer = pipeline
            .answer(&manager, "how many rows in orders?")
            .await
            .unwrap();

        assert_eq!(answer.result, NOT_CONNECTED);
        assert!(answer.text.contains(NOT_CONNECTED));
    }

    #[tokio::test]
    async fn test_execution_error_propagates() {
        let (mut manager, _dir) = manager(shop_client());
        manager.connect_from_url("postgres://a@h/shop").await.unwrap();

        let llm = MockLlmClient::new().with_response("Question: broken", "SELEC oops");
        let pipeline = QueryPipeline::new(Gateway::new(Arc::new(llm.clone())));

        let err = pipeline.ask(&manager, "broken").await.unwrap_err();
        assert!(matches!(err, ChatDbError::Execution(_)));
        // No narration call after a failed execution
        assert_eq!(llm.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_generation_error_propagates() {
        let (mut manager, _dir) = manager(shop_client());
        manager.connect_from_url("postgres://a@h/shop").await.unwrap();

        let pipeline = QueryPipeline::new(Gateway::new(Arc::new(
            MockLlmClient::new().failing("model not found"),
        )));

        let err = pipeline.ask(&manager, "anything").await.unwrap_err();
        assert!(matches!(err, ChatDbError::Generation(_)));
    }

    #[tokio::test]
    async fn test_generated_text_is_executed_verbatim() {
        let client = shop_client().with_result(
            "select name from users -- trailing",
            QueryResult::with_data(
                vec![ColumnInfo::new("name", "TEXT")],
                vec![vec![Value::from("Alice")]],
            ),
        );
        let (mut manager, _dir) = manager(client);
        manager.connect_from_url("postgres://a@h/shop").await.unwrap();

        let llm = MockLlmClient::new().with_response(
            "Question: names",
            "  SELECT name FROM users -- trailing",
        );
        let pipeline = QueryPipeline::new(Gateway::new(Arc::new(llm)));

        let answer = pipeline.answer(&manager, "names").await.unwrap();
        assert_eq!(answer.query, "  SELECT name FROM users -- trailing");
        assert_eq!(answer.result, "[('Alice',)]");
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let (mut manager, _dir) = manager(shop_client());
        manager.connect_from_url("postgres://a@h/shop").await.unwrap();

        let pipeline = QueryPipeline::new(Gateway::new(Arc::new(MockLlmClient::new())))
            .with_read_only(true);

        let err = pipeline
            .ask(&manager, "delete the first user")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatDbError::Unsafe(_)));

        let ok = pipeline.ask(&manager, "How many orders?").await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_custom_prompts() {
        let (mut manager, _dir) = manager(shop_client());
        manager.connect_from_url("postgres://a@h/shop").await.unwrap();

        let llm = MockLlmClient::new();
        let prompts = Prompts::from_overrides(
            Some("Question: {{ question }}"),
            Some("SQL result: {{ result }} for {{ query }}"),
        )
        .unwrap();
        let pipeline = QueryPipeline::new(Gateway::new(Arc::new(llm.clone()))).with_prompts(prompts);

        pipeline.ask(&manager, "count orders").await.unwrap();
        assert_eq!(
            llm.prompts(),
            vec![
                "Question: count orders".to_string(),
                "SQL result: [(42,)] for SELECT COUNT(*) FROM orders".to_string(),
            ]
        );
    }
}
