//! Fixed-query research helpers built on the read-only executor.

use quarry_core::QueryRequest;

use crate::error;
use crate::types::ToolResponse;
use crate::{ResearchTools, GET_INVESTORS};

/// Investors of an organization matched by exact name or id.
///
/// `AND` binds tighter than `OR`, so the subsidiary exclusion only applies
/// to the id match.
pub const INVESTORS_QUERY: &str = "\
MATCH p=(o:Organization)<-[r:HAS_INVESTOR]-(i)
WHERE o.name=$company OR o.id=$company
  AND NOT exists { (o)<-[:SUBSIDARY_OF]-() }
RETURN i.id as id, i.name as name, head(labels(i)) as type";

/// Connectivity smoke check used by the CLI.
pub const NODE_COUNT_QUERY: &str = "MATCH () RETURN count(*) as nodes";

impl ResearchTools {
    /// Investors (id, name, type) in the company with this exact name or id.
    pub async fn get_investors(&self, company: &str) -> ToolResponse {
        let request = QueryRequest::new(INVESTORS_QUERY).param("company", company);
        let result: error::Result<_> = self.executor().execute(&request).await.map_err(Into::into);
        self.respond(GET_INVESTORS, result)
    }

    pub async fn node_count(&self) -> ToolResponse {
        let result: error::Result<_> = self
            .executor()
            .execute_query(NODE_COUNT_QUERY, None)
            .await
            .map_err(Into::into);
        self.respond("node_count", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_graph::WriteGuard;

    #[test]
    fn test_fixed_queries_are_read_only() {
        let guard = WriteGuard::default();
        assert!(!guard.is_write(INVESTORS_QUERY));
        assert!(!guard.is_write(NODE_COUNT_QUERY));
    }

    #[test]
    fn test_investors_query_binds_company_parameter() {
        assert_eq!(INVESTORS_QUERY.matches("$company").count(), 2);
        assert!(INVESTORS_QUERY.contains("head(labels(i)) as type"));
    }
}
