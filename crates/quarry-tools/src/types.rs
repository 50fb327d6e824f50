//! Tool call, tool response, and tool catalogue types.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

use quarry_core::{ResultRow, ResultSet};

/// What every tool hands back to the agent framework.
///
/// Callers always receive rows. A failure is rendered as a single row
/// `{"error": "<description>"}`; a write rejection and a broken query look
/// the same apart from the text.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResponse {
    Rows(ResultSet),
    Error { error: String },
}

impl ToolResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The rows the framework sees.
    pub fn into_rows(self) -> ResultSet {
        match self {
            Self::Rows(rows) => rows,
            Self::Error { error } => {
                let mut row = ResultRow::new();
                row.insert("error".to_string(), serde_json::Value::String(error));
                vec![row]
            }
        }
    }
}

impl<E: std::fmt::Display> From<Result<ResultSet, E>> for ToolResponse {
    fn from(result: Result<ResultSet, E>) -> Self {
        match result {
            Ok(rows) => Self::Rows(rows),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

impl Serialize for ToolResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Rows(rows) => rows.serialize(serializer),
            Self::Error { error } => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(&ErrorRow(error))?;
                seq.end()
            }
        }
    }
}

struct ErrorRow<'a>(&'a str);

impl Serialize for ErrorRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("error", self.0)?;
        map.end()
    }
}

/// A tool invocation as sent by the agent framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl ToolCall {
    pub fn new(tool: &str, args: serde_json::Value) -> Self {
        Self {
            tool: tool.to_string(),
            args,
        }
    }
}

/// Describes a tool so a host framework can register it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub description: String,
    pub required: bool,
}

impl ToolParameter {
    pub fn required(name: &str, param_type: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type: param_type.to_string(),
            description: description.to_string(),
            required: true,
        }
    }

    pub fn optional(name: &str, param_type: &str, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_response_is_single_error_row() {
        let response = ToolResponse::error("Write queries are not supported");
        assert!(response.is_error());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!([{"error": "Write queries are not supported"}])
        );

        let rows = response.into_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["error"], json!("Write queries are not supported"));
    }

    #[test]
    fn rows_response_serializes_as_list() {
        let mut row = ResultRow::new();
        row.insert("x".to_string(), json!(1));
        let response = ToolResponse::Rows(vec![row]);
        assert!(!response.is_error());
        assert_eq!(serde_json::to_value(&response).unwrap(), json!([{"x": 1}]));
    }

    #[test]
    fn result_conversion() {
        let ok: Result<ResultSet, String> = Ok(vec![]);
        assert_eq!(ToolResponse::from(ok), ToolResponse::Rows(vec![]));

        let err: Result<ResultSet, String> = Err("boom".to_string());
        assert_eq!(ToolResponse::from(err), ToolResponse::error("boom"));
    }

    #[test]
    fn tool_call_args_default_to_null() {
        let call: ToolCall = serde_json::from_value(json!({"tool": "get_schema"})).unwrap();
        assert_eq!(call.tool, "get_schema");
        assert!(call.args.is_null());
    }
}
