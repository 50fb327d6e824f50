//! quarry-core: Shared types, configuration, and error handling for Quarry.
//!
//! This crate provides the foundational types used across all Quarry components:
//! - Driver-independent graph values (`GraphValue`) and result rows
//! - Query requests and the label-centric schema document
//! - Configuration management (file, `QUARRY__` env, legacy `NEO4J_*` env)
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{AgentSettings, Neo4jSettings, QuarryConfig};
pub use error::QuarryError;
pub use types::{
    GraphDuration, GraphNode, GraphPath, GraphPoint, GraphRelationship, GraphValue, LabelSchema,
    QueryRequest, Record, ResultRow, ResultSet, SchemaDocument,
};
