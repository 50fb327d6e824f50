//! Normalization of graph values into plain JSON.
//!
//! Output contains only null, booleans, numbers, strings, arrays and
//! string-keyed objects. Temporal values become ISO-8601 strings, durations
//! ISO-8601 duration strings. Graph structures become objects.

use chrono::SecondsFormat;
use serde_json::{json, Map, Number, Value};

use quarry_core::{GraphNode, GraphRelationship, GraphValue, Record, ResultRow};

/// Normalize a single value, recursing through containers.
pub fn normalize(value: GraphValue) -> Value {
    match value {
        GraphValue::Null => Value::Null,
        GraphValue::Boolean(b) => Value::Bool(b),
        GraphValue::Integer(i) => Value::Number(i.into()),
        GraphValue::Float(f) => normalize_float(f),
        GraphValue::String(s) => Value::String(s),
        GraphValue::Bytes(bytes) => Value::Array(bytes.into_iter().map(Value::from).collect()),
        GraphValue::List(items) => Value::Array(items.into_iter().map(normalize).collect()),
        GraphValue::Map(entries) => Value::Object(normalize_entries(entries)),
        GraphValue::Node(node) => normalize_node(node),
        GraphValue::Relationship(rel) => normalize_relationship(rel),
        GraphValue::Path(path) => json!({
            "nodes": path.nodes.into_iter().map(normalize_node).collect::<Vec<_>>(),
            "relationships": path
                .relationships
                .into_iter()
                .map(normalize_relationship)
                .collect::<Vec<_>>(),
        }),
        GraphValue::Point(point) => {
            let mut obj = Map::new();
            obj.insert("srid".to_string(), Value::from(point.srid));
            obj.insert("x".to_string(), normalize_float(point.x));
            obj.insert("y".to_string(), normalize_float(point.y));
            if let Some(z) = point.z {
                obj.insert("z".to_string(), normalize_float(z));
            }
            Value::Object(obj)
        }
        GraphValue::Date(date) => Value::String(date.format("%Y-%m-%d").to_string()),
        GraphValue::Time(time, offset) => {
            Value::String(format!("{}{}", time.format("%H:%M:%S%.f"), offset))
        }
        GraphValue::LocalTime(time) => Value::String(time.format("%H:%M:%S%.f").to_string()),
        GraphValue::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
        GraphValue::LocalDateTime(dt) => {
            Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
        GraphValue::ZonedDateTime(dt, zone) => {
            Value::String(format!("{}[{zone}]", dt.format("%Y-%m-%dT%H:%M:%S%.f")))
        }
        GraphValue::Duration(d) => Value::String(d.to_string()),
    }
}

/// Normalize a whole record into a result row, keeping column order.
pub fn normalize_record(record: Record) -> ResultRow {
    normalize_entries(record.into_fields())
}

fn normalize_entries(entries: Vec<(String, GraphValue)>) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k, normalize(v)))
        .collect()
}

/// JSON has no NaN or infinity; those are rendered as text.
fn normalize_float(f: f64) -> Value {
    match Number::from_f64(f) {
        Some(n) => Value::Number(n),
        None => Value::String(f.to_string()),
    }
}

fn normalize_node(node: GraphNode) -> Value {
    json!({
        "id": node.id,
        "labels": node.labels,
        "properties": normalize_entries(node.properties),
    })
}

fn normalize_relationship(rel: GraphRelationship) -> Value {
    json!({
        "id": rel.id,
        "type": rel.rel_type,
        "start": rel.start_node_id,
        "end": rel.end_node_id,
        "properties": normalize_entries(rel.properties),
    })
}
