//! Question pipeline tests with the mock model and mock database.

use super::mock_manager;
use chat_db::connection::NOT_CONNECTED;
use chat_db::db::{ColumnInfo, MockConnector, MockDatabaseClient, QueryResult, Value};
use chat_db::error::ChatDbError;
use chat_db::llm::{Gateway, MockLlmClient};
use chat_db::pipeline::QueryPipeline;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn pipeline(llm: &MockLlmClient) -> QueryPipeline {
    QueryPipeline::new(Gateway::new(Arc::new(llm.clone())))
}

#[tokio::test]
async fn test_ask_without_connection_does_not_fail() {
    let (manager, _dir) = mock_manager(MockConnector::new());
    let llm = MockLlmClient::new();

    let text = pipeline(&llm).ask(&manager, "How many users?").await.unwrap();

    assert!(text.contains(NOT_CONNECTED));
    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains(NOT_CONNECTED));
}

#[tokio::test]
async fn test_ask_counts_users() {
    let client = MockDatabaseClient::with_schema(MockDatabaseClient::sample_schema()).with_result(
        "count(*) from users",
        QueryResult::with_data(
            vec![ColumnInfo::new("count", "INT8")],
            vec![vec![Value::Int(7)]],
        ),
    );
    let (mut manager, _dir) = mock_manager(MockConnector::with_client(client));
    manager
        .connect_from_url("postgresql+sqlx://a:b@h:5432/shop")
        .await
        .unwrap();
    let llm = MockLlmClient::new();

    let answer = pipeline(&llm).answer(&manager, "How many users are there?").await.unwrap();

    assert_eq!(answer.query, "SELECT COUNT(*) FROM users");
    assert_eq!(answer.result, "[(7,)]");
    assert_eq!(answer.text, "According to the database, the result is [(7,)].");
}

#[tokio::test]
async fn test_invalid_generated_sql_propagates_execution_error() {
    let (mut manager, _dir) = mock_manager(MockConnector::new());
    manager.connect_from_url("mysql://root@localhost/shop").await.unwrap();
    let llm = MockLlmClient::new().with_response("Question: garbage", "I cannot answer that");

    let err = pipeline(&llm).ask(&manager, "garbage").await.unwrap_err();

    assert!(matches!(err, ChatDbError::Execution(_)));
    assert_eq!(llm.prompts().len(), 1);
}

#[tokio::test]
async fn test_read_only_mode_blocks_delete_before_execution() {
    let (mut manager, _dir) = mock_manager(MockConnector::new());
    manager.connect_from_url("mysql://root@localhost/shop").await.unwrap();
    let llm = MockLlmClient::new();

    let err = pipeline(&llm)
        .with_read_only(true)
        .ask(&manager, "delete the user with id 1")
        .await
        .unwrap_err();

    assert!(matches!(err, ChatDbError::Unsafe(_)));
    assert!(err.to_string().contains("DELETE is not allowed"));
    assert_eq!(llm.prompts().len(), 1);
}

#[tokio::test]
async fn test_unrestricted_mode_runs_delete() {
    let (mut manager, _dir) = mock_manager(MockConnector::new());
    manager.connect_from_url("mysql://root@localhost/shop").await.unwrap();
    let llm = MockLlmClient::new();

    let answer = pipeline(&llm)
        .answer(&manager, "delete the user with id 1")
        .await
        .unwrap();

    assert_eq!(answer.query, "DELETE FROM users WHERE id = 1");
    assert_eq!(answer.result, "[]");
}
