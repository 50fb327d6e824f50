//! Tool contract tests: every outcome reaches the agent as rows.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use quarry_core::{QueryRequest, Record};
use quarry_graph::{GraphBackend, GraphError, ReadOnlyExecutor, SCHEMA_QUERY};
use quarry_tools::research::INVESTORS_QUERY;
use quarry_tools::{ResearchTools, ToolCall, ToolResponse};

#[derive(Default)]
struct FakeBackend {
    records: Vec<Record>,
    failure: Option<String>,
    seen: Mutex<Vec<QueryRequest>>,
}

impl FakeBackend {
    fn calls(&self) -> Vec<QueryRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphBackend for FakeBackend {
    async fn fetch(&self, request: &QueryRequest) -> Result<Vec<Record>, GraphError> {
        self.seen.lock().unwrap().push(request.clone());
        match &self.failure {
            Some(message) => Err(GraphError::Serialization(message.clone())),
            None => Ok(self.records.clone()),
        }
    }
}

fn tools(backend: FakeBackend) -> (Arc<FakeBackend>, ResearchTools) {
    let backend = Arc::new(backend);
    let tools = ResearchTools::new(ReadOnlyExecutor::new(backend.clone()));
    (backend, tools)
}

fn as_json(response: ToolResponse) -> serde_json::Value {
    serde_json::to_value(&response).unwrap()
}

#[tokio::test]
async fn test_write_query_returns_error_row_without_touching_database() {
    let (backend, tools) = tools(FakeBackend::default());

    let response = tools.execute_read_query("MERGE (n) RETURN n", None).await;

    assert!(response.is_error());
    let rows = response.into_rows();
    assert_eq!(rows.len(), 1);
    assert!(rows[0]["error"]
        .as_str()
        .unwrap()
        .starts_with("Write queries are not supported"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_literal_query_returns_single_row() {
    let (_, tools) = tools(FakeBackend {
        records: vec![Record::new().with("x", 1i64)],
        ..Default::default()
    });

    let response = tools.execute_read_query("RETURN 1 as x", None).await;
    assert_eq!(as_json(response), json!([{"x": 1}]));
}

#[tokio::test]
async fn test_database_failure_becomes_error_row() {
    let (_, tools) = tools(FakeBackend {
        failure: Some("Invalid input 'RETUR'".to_string()),
        ..Default::default()
    });

    let response = tools.execute_read_query("RETUR 1", None).await;
    let value = as_json(response);
    assert_eq!(value.as_array().unwrap().len(), 1);
    assert!(value[0]["error"]
        .as_str()
        .unwrap()
        .contains("Invalid input 'RETUR'"));
}

#[tokio::test]
async fn test_schema_tool_returns_label_rows() {
    let meta = |label: &str, property: &str, kind: &str, other: Vec<&str>| {
        Record::new()
            .with("label", label)
            .with("property", property)
            .with("type", kind)
            .with("other", other)
            .with("unique", false)
            .with("index", false)
            .with("elementType", "node")
    };
    let (backend, tools) = tools(FakeBackend {
        records: vec![
            meta("Organization", "name", "STRING", vec![]),
            meta("Organization", "HAS_INVESTOR", "RELATIONSHIP", vec!["Person"]),
            meta("_Bloom_Scene_", "data", "STRING", vec![]),
        ],
        ..Default::default()
    });

    let value = as_json(tools.get_schema().await);

    assert_eq!(backend.calls()[0].query, SCHEMA_QUERY);
    assert_eq!(
        value,
        json!([{
            "label": "Organization",
            "attributes": {"name": "STRING"},
            "relationships": {"HAS_INVESTOR": "Person"}
        }])
    );
}

#[tokio::test]
async fn test_call_unknown_tool_is_error_row() {
    let (backend, tools) = tools(FakeBackend::default());

    let response = tools.call(ToolCall::new("drop_database", json!({}))).await;

    assert!(response.is_error());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_call_with_bad_arguments_is_error_row() {
    let (backend, tools) = tools(FakeBackend::default());

    let response = tools
        .call(ToolCall::new("execute_read_query", json!({"params": {}})))
        .await;

    assert!(response.is_error());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_call_execute_read_query_forwards_params() {
    let (backend, tools) = tools(FakeBackend::default());

    let response = tools
        .call(ToolCall::new(
            "execute_read_query",
            json!({"query": "MATCH (o:Organization {id: $id}) RETURN o", "params": {"id": "E7xz"}}),
        ))
        .await;

    assert_eq!(as_json(response), json!([]));
    assert_eq!(backend.calls()[0].params["id"], json!("E7xz"));
}

#[tokio::test]
async fn test_call_get_investors_binds_company() {
    let (backend, tools) = tools(FakeBackend {
        records: vec![Record::new()
            .with("id", "I1")
            .with("name", "Accel")
            .with("type", "Organization")],
        ..Default::default()
    });

    let response = tools
        .call(ToolCall::new("get_investors", json!({"company": "Neo4j"})))
        .await;

    assert_eq!(
        as_json(response),
        json!([{"id": "I1", "name": "Accel", "type": "Organization"}])
    );
    let calls = backend.calls();
    assert_eq!(calls[0].query, INVESTORS_QUERY);
    assert_eq!(calls[0].params["company"], json!("Neo4j"));
}
