//! The read-only query executor.
//!
//! Every statement is classified before it reaches the backend. Writes are
//! refused without contacting the database; reads are executed with their
//! parameters and every record is normalized into a plain JSON row.

use std::sync::Arc;

use quarry_core::{QueryRequest, ResultSet};

use crate::backend::GraphBackend;
use crate::classifier::{QueryKind, WriteGuard};
use crate::client::GraphError;
use crate::normalize::normalize_record;

/// Why a statement produced no rows.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Write queries are not supported by this agent (found {keyword})")]
    WriteRejected { keyword: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type Result<T> = std::result::Result<T, QueryError>;

/// Executes read-only Cypher against an injected backend.
///
/// Clone is cheap: the backend is shared.
#[derive(Clone)]
pub struct ReadOnlyExecutor {
    backend: Arc<dyn GraphBackend>,
    guard: WriteGuard,
}

impl ReadOnlyExecutor {
    /// Create an executor with the default write deny-list.
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        Self {
            backend,
            guard: WriteGuard::default(),
        }
    }

    /// Use a custom write deny-list.
    pub fn with_guard(mut self, guard: WriteGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn guard(&self) -> &WriteGuard {
        &self.guard
    }

    /// Run a read statement and return normalized rows in database order.
    pub async fn execute(&self, request: &QueryRequest) -> Result<ResultSet> {
        if let QueryKind::Write { keyword } = self.guard.classify(&request.query) {
            tracing::warn!(
                keyword = %keyword,
                query = %preview(&request.query),
                "Rejected write query"
            );
            return Err(QueryError::WriteRejected { keyword });
        }

        tracing::debug!(
            query = %preview(&request.query),
            params = request.params.len(),
            "Executing read query"
        );

        let records = self.backend.fetch(request).await.map_err(|e| {
            tracing::warn!(error = %e, query = %preview(&request.query), "Read query failed");
            e
        })?;

        let rows: ResultSet = records.into_iter().map(normalize_record).collect();
        tracing::debug!(rows = rows.len(), "Read query complete");
        Ok(rows)
    }

    /// Convenience form of [`execute`](Self::execute) taking text and optional parameters.
    pub async fn execute_query(
        &self,
        query: &str,
        params: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<ResultSet> {
        let request = QueryRequest::new(query).with_params(params);
        self.execute(&request).await
    }
}

/// Whitespace-compacted statement, capped, for log fields.
fn preview(query: &str) -> String {
    const MAX: usize = 120;
    let compact = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() <= MAX {
        compact
    } else {
        let cut: String = compact.chars().take(MAX).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_compacts_whitespace() {
        assert_eq!(preview("MATCH (n)\n   RETURN n"), "MATCH (n) RETURN n");
    }

    #[test]
    fn test_preview_truncates_long_queries() {
        let long = "x".repeat(500);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 121);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn test_write_rejection_message_names_keyword() {
        let err = QueryError::WriteRejected {
            keyword: "MERGE".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Write queries are not supported by this agent (found MERGE)"
        );
    }
}
