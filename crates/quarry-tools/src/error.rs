//! Error types for the quarry-tools crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolsError {
    #[error("{0}")]
    Query(#[from] quarry_graph::QueryError),

    #[error("Graph error: {0}")]
    Graph(#[from] quarry_graph::GraphError),

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ToolsError>;
