//! Core value types shared by the graph client and the agent tools.
//!
//! `GraphValue` is the driver-independent form of everything a Cypher query
//! can return. It is what a `GraphBackend` hands to the executor; nothing
//! driver-specific crosses that seam. Result rows leaving the executor are
//! plain JSON maps.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

// ── Result Rows ───────────────────────────────────────────────────

/// One normalized result row: column alias → JSON value, in column order.
pub type ResultRow = serde_json::Map<String, serde_json::Value>;

/// Rows in database return order.
pub type ResultSet = Vec<ResultRow>;

// ── Query Request ─────────────────────────────────────────────────

/// A Cypher statement plus its named parameters.
///
/// Parameters are never absent: a missing or `null` mapping becomes empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            params: serde_json::Map::new(),
        }
    }

    /// Add a single named parameter.
    pub fn param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Replace the parameter mapping; `None` means no parameters.
    pub fn with_params(mut self, params: Option<serde_json::Map<String, serde_json::Value>>) -> Self {
        self.params = params.unwrap_or_default();
        self
    }
}

fn null_as_empty<'de, D>(
    deserializer: D,
) -> Result<serde_json::Map<String, serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<serde_json::Map<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

// ── Graph Values ──────────────────────────────────────────────────

/// A value as returned by the graph store, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<GraphValue>),
    /// Ordered key/value pairs.
    Map(Vec<(String, GraphValue)>),
    Node(GraphNode),
    Relationship(GraphRelationship),
    Path(GraphPath),
    Point(GraphPoint),
    Date(NaiveDate),
    /// Time of day with a UTC offset.
    Time(NaiveTime, FixedOffset),
    LocalTime(NaiveTime),
    DateTime(DateTime<FixedOffset>),
    LocalDateTime(NaiveDateTime),
    /// Local date-time in a named time zone, e.g. `Europe/Berlin`.
    ZonedDateTime(NaiveDateTime, String),
    Duration(GraphDuration),
}

impl GraphValue {
    /// Build a map value from anything yielding key/value pairs.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, GraphValue)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for GraphValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for GraphValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for GraphValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for GraphValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for GraphValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<GraphValue>> From<Vec<T>> for GraphValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Plain JSON maps onto the primitive subset of `GraphValue`.
///
/// Numbers that fit `i64` stay integers; everything else becomes a float.
impl From<serde_json::Value> for GraphValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// A node: internal id, labels, properties.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: Vec<(String, GraphValue)>,
}

/// A relationship between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRelationship {
    pub id: i64,
    pub start_node_id: i64,
    pub end_node_id: i64,
    pub rel_type: String,
    pub properties: Vec<(String, GraphValue)>,
}

/// An alternating node/relationship path.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<GraphRelationship>,
}

/// A spatial point in 2D or 3D.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPoint {
    pub srid: i64,
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

// ── Duration ──────────────────────────────────────────────────────

/// A Cypher duration. Months and days are kept apart from seconds because
/// their length in seconds depends on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphDuration {
    pub months: i64,
    pub days: i64,
    pub seconds: i64,
    pub nanoseconds: i32,
}

impl GraphDuration {
    pub fn new(months: i64, days: i64, seconds: i64, nanoseconds: i32) -> Self {
        Self {
            months,
            days,
            seconds,
            nanoseconds,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0 && self.seconds == 0 && self.nanoseconds == 0
    }
}

/// ISO-8601 duration text, e.g. `P1Y2M3DT4H5M6.5S`. Zero is `PT0S`.
impl fmt::Display for GraphDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }

        f.write_str("P")?;
        let years = self.months / 12;
        let months = self.months % 12;
        if years != 0 {
            write!(f, "{years}Y")?;
        }
        if months != 0 {
            write!(f, "{months}M")?;
        }
        if self.days != 0 {
            write!(f, "{}D", self.days)?;
        }

        // Fold nanoseconds into the seconds component so the sign stays consistent.
        let total_nanos = i128::from(self.seconds) * 1_000_000_000 + i128::from(self.nanoseconds);
        if total_nanos == 0 {
            return Ok(());
        }

        f.write_str("T")?;
        let negative = total_nanos < 0;
        let abs = total_nanos.unsigned_abs();
        let whole_secs = abs / 1_000_000_000;
        let frac = abs % 1_000_000_000;
        let hours = whole_secs / 3600;
        let minutes = (whole_secs % 3600) / 60;
        let secs = whole_secs % 60;
        let sign = if negative { "-" } else { "" };

        if hours != 0 {
            write!(f, "{sign}{hours}H")?;
        }
        if minutes != 0 {
            write!(f, "{sign}{minutes}M")?;
        }
        if secs != 0 || frac != 0 {
            if frac == 0 {
                write!(f, "{sign}{secs}S")?;
            } else {
                let digits = format!("{frac:09}");
                write!(f, "{sign}{secs}.{}S", digits.trim_end_matches('0'))?;
            }
        }
        Ok(())
    }
}

// ── Records ───────────────────────────────────────────────────────

/// A raw result record: column aliases with their values, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, GraphValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Later columns with the same alias replace earlier ones.
    pub fn push(&mut self, column: impl Into<String>, value: GraphValue) {
        let column = column.into();
        match self.fields.iter_mut().find(|(k, _)| *k == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<GraphValue>) -> Self {
        self.push(column, value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&GraphValue> {
        self.fields.iter().find(|(k, _)| k == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> Vec<(String, GraphValue)> {
        self.fields
    }
}

impl FromIterator<(String, GraphValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, GraphValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.push(k, v);
        }
        record
    }
}

// ── Schema Document ───────────────────────────────────────────────

/// Schema summary for one node label.
///
/// `attributes` maps property name to its type descriptor, e.g.
/// `"STRING unique indexed"`. `relationships` maps an outgoing relationship
/// type to the label at its far end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSchema {
    pub label: String,
    pub attributes: BTreeMap<String, String>,
    pub relationships: BTreeMap<String, String>,
}

impl LabelSchema {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
        }
    }
}

/// One entry per visible node label.
pub type SchemaDocument = Vec<LabelSchema>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_request_null_params_become_empty() {
        let req: QueryRequest =
            serde_json::from_value(json!({"query": "RETURN 1", "params": null})).unwrap();
        assert!(req.params.is_empty());

        let req: QueryRequest = serde_json::from_value(json!({"query": "RETURN 1"})).unwrap();
        assert!(req.params.is_empty());
        assert_eq!(req.query, "RETURN 1");
    }

    #[test]
    fn query_request_builder() {
        let req = QueryRequest::new("MATCH (o {id: $id}) RETURN o.name")
            .param("id", "E123")
            .param("limit", 5);
        assert_eq!(req.params.len(), 2);
        assert_eq!(req.params["id"], json!("E123"));

        let req = req.with_params(None);
        assert!(req.params.is_empty());
    }

    #[test]
    fn duration_iso_format() {
        assert_eq!(GraphDuration::default().to_string(), "PT0S");
        assert_eq!(GraphDuration::new(14, 3, 0, 0).to_string(), "P1Y2M3D");
        assert_eq!(GraphDuration::new(0, 0, 3723, 0).to_string(), "PT1H2M3S");
        assert_eq!(
            GraphDuration::new(1, 0, 6, 500_000_000).to_string(),
            "P1MT6.5S"
        );
        assert_eq!(GraphDuration::new(0, 0, -90, 0).to_string(), "PT-1M-30S");
        assert_eq!(GraphDuration::new(0, 0, 0, 7).to_string(), "PT0.000000007S");
    }

    #[test]
    fn graph_value_from_json_keeps_key_order() {
        let value = GraphValue::from(json!({"b": 1, "a": [true, null, 2.5]}));
        assert_eq!(
            value,
            GraphValue::Map(vec![
                ("b".to_string(), GraphValue::Integer(1)),
                (
                    "a".to_string(),
                    GraphValue::List(vec![
                        GraphValue::Boolean(true),
                        GraphValue::Null,
                        GraphValue::Float(2.5)
                    ])
                ),
            ])
        );
    }

    #[test]
    fn record_push_replaces_duplicate_column() {
        let mut record = Record::new().with("x", 1i64).with("y", "a");
        record.push("x", GraphValue::Integer(2));
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("x"), Some(&GraphValue::Integer(2)));
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn label_schema_serializes_in_tool_shape() {
        let mut person = LabelSchema::new("Person");
        person
            .attributes
            .insert("id".to_string(), "STRING unique indexed".to_string());
        person
            .relationships
            .insert("HAS_PARENT".to_string(), "Person".to_string());

        let value = serde_json::to_value(&person).unwrap();
        assert_eq!(
            value,
            json!({
                "label": "Person",
                "attributes": {"id": "STRING unique indexed"},
                "relationships": {"HAS_PARENT": "Person"}
            })
        );
    }
}
