//! Schema introspection via `apoc.meta.data()`.
//!
//! The metadata procedure yields one flat row per (label, property) pair;
//! relationships appear as properties of type `RELATIONSHIP` whose `other`
//! column lists the target labels. Those rows are regrouped here into one
//! `LabelSchema` per label.

use std::collections::HashMap;

use quarry_core::{LabelSchema, QueryRequest, ResultRow, SchemaDocument};

use crate::executor::{ReadOnlyExecutor, Result};

/// Metadata query. Routed through the write guard like any other read.
pub const SCHEMA_QUERY: &str = "\
CALL apoc.meta.data() YIELD label, property, type, other, unique, index, elementType
WHERE elementType = 'node' AND NOT label STARTS WITH '_'
RETURN label, property, type, other, unique, index, elementType";

const RELATIONSHIP_TYPE: &str = "RELATIONSHIP";

impl ReadOnlyExecutor {
    /// Fetch a fresh schema document. Nothing is cached.
    pub async fn schema(&self) -> Result<SchemaDocument> {
        let rows = self.execute(&QueryRequest::new(SCHEMA_QUERY)).await?;
        let schema = build_schema(&rows);
        tracing::debug!(labels = schema.len(), "Schema introspected");
        Ok(schema)
    }
}

/// Group flat metadata rows into label entries, in first-seen label order.
///
/// Rows for non-node elements, labels starting with `_`, or rows missing a
/// label or property are skipped. The first descriptor seen for a property
/// or relationship type wins.
pub fn build_schema(rows: &[ResultRow]) -> SchemaDocument {
    let mut schema: SchemaDocument = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let Some(label) = str_field(row, "label") else {
            continue;
        };
        if label.starts_with('_') {
            continue;
        }
        if let Some(element_type) = str_field(row, "elementType") {
            if element_type != "node" {
                continue;
            }
        }
        let Some(property) = str_field(row, "property") else {
            continue;
        };
        let kind = str_field(row, "type").unwrap_or_default();

        let index = *positions.entry(label.to_string()).or_insert_with(|| {
            schema.push(LabelSchema::new(label));
            schema.len() - 1
        });
        let entry = &mut schema[index];

        if kind == RELATIONSHIP_TYPE {
            if let Some(target) = first_target(row) {
                entry
                    .relationships
                    .entry(property.to_string())
                    .or_insert(target);
            }
        } else {
            entry
                .attributes
                .entry(property.to_string())
                .or_insert_with(|| describe_attribute(kind, row));
        }
    }

    schema
}

/// `TYPE`, then ` unique` and ` indexed` when flagged.
fn describe_attribute(kind: &str, row: &ResultRow) -> String {
    let mut descriptor = kind.to_string();
    if bool_field(row, "unique") {
        descriptor.push_str(" unique");
    }
    if bool_field(row, "index") {
        descriptor.push_str(" indexed");
    }
    descriptor
}

fn first_target(row: &ResultRow) -> Option<String> {
    row.get("other")?
        .as_array()?
        .first()?
        .as_str()
        .map(str::to_string)
}

fn str_field<'a>(row: &'a ResultRow, key: &str) -> Option<&'a str> {
    row.get(key).and_then(|v| v.as_str())
}

fn bool_field(row: &ResultRow, key: &str) -> bool {
    row.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::WriteGuard;
    use serde_json::json;

    fn row(value: serde_json::Value) -> ResultRow {
        value.as_object().cloned().unwrap()
    }

    fn meta(
        label: &str,
        property: &str,
        kind: &str,
        other: &[&str],
        unique: bool,
        index: bool,
    ) -> ResultRow {
        row(json!({
            "label": label,
            "property": property,
            "type": kind,
            "other": other,
            "unique": unique,
            "index": index,
            "elementType": "node",
        }))
    }

    #[test]
    fn test_schema_query_is_read_only() {
        assert!(!WriteGuard::default().is_write(SCHEMA_QUERY));
    }

    #[test]
    fn test_person_schema_shape() {
        let rows = vec![
            meta("Person", "id", "STRING", &[], true, true),
            meta("Person", "name", "STRING", &[], false, true),
            meta("Person", "summary", "STRING", &[], false, false),
            meta("Person", "HAS_PARENT", "RELATIONSHIP", &["Person"], false, false),
            meta("Person", "HAS_CHILD", "RELATIONSHIP", &["Person"], false, false),
        ];

        let schema = build_schema(&rows);
        assert_eq!(schema.len(), 1);
        assert_eq!(
            serde_json::to_value(&schema[0]).unwrap(),
            json!({
                "label": "Person",
                "attributes": {
                    "id": "STRING unique indexed",
                    "name": "STRING indexed",
                    "summary": "STRING"
                },
                "relationships": {"HAS_CHILD": "Person", "HAS_PARENT": "Person"}
            })
        );
    }

    #[test]
    fn test_underscore_labels_are_excluded() {
        let rows = vec![
            meta("_Bloom_Perspective_", "data", "STRING", &[], false, false),
            meta("Organization", "name", "STRING", &[], false, true),
        ];
        let schema = build_schema(&rows);
        assert_eq!(schema.len(), 1);
        assert_eq!(schema[0].label, "Organization");
    }

    #[test]
    fn test_non_node_rows_are_skipped() {
        let mut rel_row = meta("HAS_CEO", "since", "DATE", &[], false, false);
        rel_row.insert("elementType".to_string(), json!("relationship"));
        let schema = build_schema(&[rel_row]);
        assert!(schema.is_empty());
    }

    #[test]
    fn test_first_relationship_target_wins() {
        let rows = vec![
            meta(
                "Organization",
                "HAS_INVESTOR",
                "RELATIONSHIP",
                &["Person", "Organization"],
                false,
                false,
            ),
            meta("Organization", "HAS_INVESTOR", "RELATIONSHIP", &["Fund"], false, false),
            meta("Organization", "MENTIONS", "RELATIONSHIP", &[], false, false),
        ];
        let schema = build_schema(&rows);
        assert_eq!(schema[0].relationships.len(), 1);
        assert_eq!(schema[0].relationships["HAS_INVESTOR"], "Person");
    }

    #[test]
    fn test_labels_keep_first_seen_order() {
        let rows = vec![
            meta("Organization", "name", "STRING", &[], false, false),
            meta("Article", "title", "STRING", &[], false, false),
            meta("Organization", "id", "STRING", &[], true, true),
        ];
        let schema = build_schema(&rows);
        let labels: Vec<&str> = schema.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Organization", "Article"]);
        assert_eq!(schema[0].attributes.len(), 2);
    }

    #[test]
    fn test_rows_without_label_or_property_are_ignored() {
        let rows = vec![
            row(json!({"property": "x", "type": "STRING"})),
            row(json!({"label": "City", "type": "STRING"})),
        ];
        assert!(build_schema(&rows).is_empty());
    }
}
