//! The seam between the executor and whatever actually runs Cypher.

use async_trait::async_trait;

use quarry_core::{QueryRequest, Record};

use crate::client::GraphError;

/// Something that can run a parameterized Cypher statement and hand back
/// driver-independent records in database return order.
///
/// `GraphClient` is the Neo4j implementation. Tests substitute in-memory
/// doubles. Implementations must not filter writes themselves; that is the
/// executor's job.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    async fn fetch(&self, request: &QueryRequest) -> Result<Vec<Record>, GraphError>;
}
