//! quarry-tools: Agent-facing research tools over the read-only graph layer.
//!
//! Wraps a `ReadOnlyExecutor` in the tool contract expected by LLM agent
//! frameworks: every tool returns rows, and any failure becomes a single
//! `{"error": ...}` row instead of an error reaching the agent loop. Also
//! generates the declarative toolbox configuration for the external
//! tool-hosting service.

pub mod error;
pub mod research;
pub mod toolbox;
pub mod types;

pub use error::ToolsError;
pub use types::{ToolCall, ToolParameter, ToolResponse, ToolSpec};

use std::sync::Arc;

use serde::Deserialize;

use quarry_core::{LabelSchema, Neo4jSettings, QueryRequest, ResultRow, ResultSet};
use quarry_graph::{GraphClient, GraphConfig, ReadOnlyExecutor};

/// Name of the schema tool.
pub const GET_SCHEMA: &str = "get_schema";
/// Name of the free-form read query tool.
pub const EXECUTE_READ_QUERY: &str = "execute_read_query";
/// Name of the investor lookup tool.
pub const GET_INVESTORS: &str = "get_investors";

/// The research tool set exposed to agents.
#[derive(Clone)]
pub struct ResearchTools {
    executor: ReadOnlyExecutor,
}

impl ResearchTools {
    pub fn new(executor: ReadOnlyExecutor) -> Self {
        Self { executor }
    }

    /// Connect to Neo4j and build the tool set.
    ///
    /// This is the only fallible step: an unreachable database is fatal.
    pub async fn connect(settings: &Neo4jSettings) -> error::Result<Self> {
        let client = GraphClient::connect(&GraphConfig::from(settings)).await?;
        Ok(Self::new(ReadOnlyExecutor::new(Arc::new(client))))
    }

    pub fn executor(&self) -> &ReadOnlyExecutor {
        &self.executor
    }

    /// Descriptors for every tool `call` can dispatch to.
    pub fn catalogue() -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: GET_SCHEMA.to_string(),
                description: "Get the schema of the graph database: node labels with their \
                              attribute types and outgoing relationship types with target labels. \
                              Takes no arguments."
                    .to_string(),
                parameters: Vec::new(),
            },
            ToolSpec {
                name: EXECUTE_READ_QUERY.to_string(),
                description: "Execute a read-only Cypher query with named `$parameter` \
                              placeholders and return the rows as a list of objects. Write \
                              statements are rejected."
                    .to_string(),
                parameters: vec![
                    ToolParameter::required("query", "string", "The Cypher query to execute"),
                    ToolParameter::optional(
                        "params",
                        "object",
                        "Named parameters for the query, may be empty",
                    ),
                ],
            },
            ToolSpec {
                name: GET_INVESTORS.to_string(),
                description: "Investors (id, name, type Organization or Person) in the company \
                              with this exact name or id."
                    .to_string(),
                parameters: vec![ToolParameter::required(
                    "company",
                    "string",
                    "Exact name or id of the company",
                )],
            },
        ]
    }

    /// Schema document as rows, one per label.
    pub async fn get_schema(&self) -> ToolResponse {
        self.respond(GET_SCHEMA, self.schema_rows().await)
    }

    /// Run a read-only query. `None` parameters mean none.
    pub async fn execute_read_query(
        &self,
        query: &str,
        params: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> ToolResponse {
        let request = QueryRequest::new(query).with_params(params);
        let result: error::Result<ResultSet> = self.executor.execute(&request).await.map_err(Into::into);
        self.respond(EXECUTE_READ_QUERY, result)
    }

    /// Dispatch a tool call by name.
    pub async fn call(&self, call: ToolCall) -> ToolResponse {
        match call.tool.as_str() {
            GET_SCHEMA => self.get_schema().await,
            EXECUTE_READ_QUERY => match parse_args::<QueryRequest>(&call) {
                Ok(request) => {
                    self.execute_read_query(&request.query, Some(request.params))
                        .await
                }
                Err(e) => self.respond(EXECUTE_READ_QUERY, Err(e)),
            },
            GET_INVESTORS => match parse_args::<InvestorArgs>(&call) {
                Ok(args) => self.get_investors(&args.company).await,
                Err(e) => self.respond(GET_INVESTORS, Err(e)),
            },
            other => {
                let err = ToolsError::UnknownTool {
                    name: other.to_string(),
                };
                self.respond(other, Err(err))
            }
        }
    }

    async fn schema_rows(&self) -> error::Result<ResultSet> {
        let schema = self.executor.schema().await?;
        Ok(schema.into_iter().map(schema_row).collect())
    }

    /// Fold an outcome into the row contract, logging failures.
    fn respond(&self, tool: &str, result: error::Result<ResultSet>) -> ToolResponse {
        match &result {
            Ok(rows) => tracing::info!(tool, rows = rows.len(), "Tool call succeeded"),
            Err(e) => tracing::warn!(tool, error = %e, "Tool call failed"),
        }
        ToolResponse::from(result)
    }
}

#[derive(Debug, Deserialize)]
struct InvestorArgs {
    company: String,
}

fn parse_args<T: serde::de::DeserializeOwned>(call: &ToolCall) -> error::Result<T> {
    let args = match &call.args {
        serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(args).map_err(|e| ToolsError::InvalidArguments {
        tool: call.tool.clone(),
        reason: e.to_string(),
    })
}

/// `{"label": ..., "attributes": {...}, "relationships": {...}}`
fn schema_row(entry: LabelSchema) -> ResultRow {
    let strings = |map: std::collections::BTreeMap<String, String>| {
        serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect(),
        )
    };

    let mut row = ResultRow::new();
    row.insert("label".to_string(), serde_json::Value::String(entry.label));
    row.insert("attributes".to_string(), strings(entry.attributes));
    row.insert("relationships".to_string(), strings(entry.relationships));
    row
}
