//! Neo4j connection management and the shared graph client.

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query};

use quarry_core::{Neo4jSettings, QueryRequest, Record};

use crate::backend::GraphBackend;
use crate::bolt;

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::from(&Neo4jSettings::default())
    }
}

impl From<&Neo4jSettings> for GraphConfig {
    fn from(settings: &Neo4jSettings) -> Self {
        Self {
            uri: settings.uri.clone(),
            user: settings.username.clone(),
            password: settings.password.clone(),
            max_connections: settings.max_connections,
            fetch_size: settings.fetch_size,
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Clone is cheap (inner Arc). The client itself does not police writes;
/// wrap it in a `ReadOnlyExecutor` before exposing it to an agent.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j and verify the server answers before returning.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let client = Self { graph };
        client.verify_connectivity().await?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(client)
    }

    /// Round-trip a trivial statement so an unreachable server fails here
    /// rather than on the first tool call.
    pub async fn verify_connectivity(&self) -> Result<(), GraphError> {
        self.query_one(neo4rs::query("RETURN 1 AS ok"))
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?
            .ok_or_else(|| GraphError::Connection("server returned no rows".to_string()))?;
        Ok(())
    }

    /// Execute a query and collect all rows.
    pub async fn query_rows(&self, query: Query) -> Result<Vec<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a query and return the first row, if any.
    pub async fn query_one(&self, query: Query) -> Result<Option<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        Ok(stream.next().await?)
    }
}

#[async_trait]
impl GraphBackend for GraphClient {
    async fn fetch(&self, request: &QueryRequest) -> Result<Vec<Record>, GraphError> {
        let mut q = neo4rs::query(&request.query);
        for (key, value) in &request.params {
            q = q.param(key, bolt::json_to_bolt(value));
        }

        let rows = self.query_rows(q).await?;
        rows.iter().map(bolt::row_to_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_config_from_settings() {
        let mut settings = Neo4jSettings::default();
        settings.uri = "bolt://graph:7687".to_string();
        settings.max_connections = 4;

        let config = GraphConfig::from(&settings);
        assert_eq!(config.uri, "bolt://graph:7687");
        assert_eq!(config.user, "companies");
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.fetch_size, 256);
    }
}
