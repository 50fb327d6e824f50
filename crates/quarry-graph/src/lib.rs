//! quarry-graph: Read-only access to the Neo4j knowledge graph.
//!
//! Every read issued by the research tools flows through this crate. Queries
//! are screened by the write guard, executed through a `GraphBackend`, and
//! their records normalized into plain JSON rows before leaving the crate.

pub mod backend;
pub mod bolt;
pub mod classifier;
pub mod client;
pub mod executor;
pub mod normalize;
pub mod schema;

pub use backend::GraphBackend;
pub use classifier::{QueryKind, WriteGuard, WRITE_KEYWORDS};
pub use client::{GraphClient, GraphConfig, GraphError};
pub use executor::{QueryError, ReadOnlyExecutor};
pub use normalize::{normalize, normalize_record};
pub use schema::{build_schema, SCHEMA_QUERY};
