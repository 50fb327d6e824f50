//! Conversion between neo4rs Bolt values and driver-independent values.
//!
//! Inbound: JSON query parameters become `BoltType`s. Outbound: every value
//! in a `neo4rs::Row` is read straight into a `GraphValue`, so nothing from
//! neo4rs leaks past `GraphClient`.
//!
//! neo4rs only exposes row values through serde. Its own `BoltType` visitor
//! flattens durations into `[seconds, nanos]` lists and cannot rebuild
//! points, so rows are read with [`WireValue`], which walks the driver's
//! enum access directly and keeps every Bolt kind.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use neo4rs::{BoltList, BoltMap, BoltNull, BoltString, BoltType};
use serde::de::{
    self, Deserialize, Deserializer, EnumAccess, IgnoredAny, MapAccess, SeqAccess, VariantAccess,
    Visitor,
};

use quarry_core::{
    GraphDuration, GraphNode, GraphPath, GraphPoint, GraphRelationship, GraphValue, Record,
};

use crate::client::GraphError;

// ── Parameters ───────────────────────────────────────────────────

/// Convert a JSON parameter value into a Bolt value.
pub fn json_to_bolt(value: &serde_json::Value) -> BoltType {
    match value {
        serde_json::Value::Null => BoltType::Null(BoltNull),
        serde_json::Value::Bool(b) => BoltType::from(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => BoltType::from(i),
            None => BoltType::from(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => BoltType::from(s.as_str()),
        serde_json::Value::Array(items) => {
            let mut list = BoltList::with_capacity(items.len());
            for item in items {
                list.push(json_to_bolt(item));
            }
            BoltType::List(list)
        }
        serde_json::Value::Object(map) => {
            let mut bolt_map = BoltMap::with_capacity(map.len());
            for (key, item) in map {
                bolt_map.put(BoltString::from(key.as_str()), json_to_bolt(item));
            }
            BoltType::Map(bolt_map)
        }
    }
}

// ── Rows ─────────────────────────────────────────────────────────

/// Convert a result row into a `Record`.
///
/// neo4rs keeps row fields in a hash map, so the original column order is
/// not recoverable; columns are emitted sorted by alias for stable output.
pub fn row_to_record(row: &neo4rs::Row) -> Result<Record, GraphError> {
    let fields: HashMap<String, WireValue> = row
        .to()
        .map_err(|e| GraphError::Serialization(format!("Failed to read row: {e}")))?;

    let mut columns: Vec<(String, GraphValue)> =
        fields.into_iter().map(|(k, v)| (k, v.0)).collect();
    columns.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(columns.into_iter().collect())
}

/// Bolt kind tags, in the order neo4rs announces them through `EnumAccess`.
mod kind {
    pub const NULL: u8 = 0;
    pub const STRING: u8 = 1;
    pub const BOOLEAN: u8 = 2;
    pub const MAP: u8 = 3;
    pub const INTEGER: u8 = 4;
    pub const FLOAT: u8 = 5;
    pub const LIST: u8 = 6;
    pub const NODE: u8 = 7;
    pub const RELATION: u8 = 8;
    pub const UNBOUNDED_RELATION: u8 = 9;
    pub const POINT_2D: u8 = 10;
    pub const POINT_3D: u8 = 11;
    pub const BYTES: u8 = 12;
    pub const PATH: u8 = 13;
    pub const DURATION: u8 = 14;
    pub const DATE: u8 = 15;
    pub const TIME: u8 = 16;
    pub const LOCAL_TIME: u8 = 17;
    pub const DATE_TIME: u8 = 18;
    pub const LOCAL_DATE_TIME: u8 = 19;
    pub const DATE_TIME_ZONE_ID: u8 = 20;
}

/// One Bolt value read off a row, already converted.
struct WireValue(GraphValue);

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_enum(std::any::type_name::<BoltType>(), &[], WireVisitor)
            .map(WireValue)
    }
}

struct WireVisitor;

impl<'de> Visitor<'de> for WireVisitor {
    type Value = GraphValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a Bolt value")
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<GraphValue, A::Error> {
        let (tag, variant): (u8, A::Variant) = data.variant()?;
        match tag {
            kind::NULL
            | kind::STRING
            | kind::BOOLEAN
            | kind::MAP
            | kind::INTEGER
            | kind::FLOAT
            | kind::LIST
            | kind::BYTES => variant.tuple_variant(1, self),
            kind::NODE => variant
                .tuple_variant(1, ElementVisitor)?
                .into_node()
                .map(GraphValue::Node),
            kind::RELATION | kind::UNBOUNDED_RELATION => variant
                .tuple_variant(1, ElementVisitor)?
                .into_relationship()
                .map(GraphValue::Relationship),
            kind::PATH => variant
                .tuple_variant(1, ElementVisitor)?
                .into_path()
                .map(GraphValue::Path),
            kind::POINT_2D => variant
                .tuple_variant(3, PointVisitor { with_z: false })
                .map(GraphValue::Point),
            kind::POINT_3D => variant
                .tuple_variant(4, PointVisitor { with_z: true })
                .map(GraphValue::Point),
            kind::DURATION => variant
                .tuple_variant(1, DurationVisitor)
                .map(GraphValue::Duration),
            kind::DATE
            | kind::TIME
            | kind::LOCAL_TIME
            | kind::DATE_TIME
            | kind::LOCAL_DATE_TIME
            | kind::DATE_TIME_ZONE_ID => variant
                .tuple_variant(1, TemporalVisitor)?
                .into_value(tag),
            other => {
                tracing::warn!(kind = other, "Unrecognized Bolt kind, reading it structurally");
                variant.tuple_variant(1, self)
            }
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<GraphValue, E> {
        Ok(GraphValue::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<GraphValue, E> {
        Ok(GraphValue::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<GraphValue, E> {
        Ok(GraphValue::Integer(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<GraphValue, E> {
        Ok(GraphValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<GraphValue, E> {
        Ok(GraphValue::String(v.to_string()))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<GraphValue, E> {
        Ok(GraphValue::Bytes(v.to_vec()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<GraphValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(WireValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(GraphValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<GraphValue, A::Error> {
        PropertiesVisitor.visit_map(map).map(GraphValue::Map)
    }
}

/// A map key or struct field name, whichever way the driver presents it.
struct Key(String);

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = Key;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a field name")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Key, E> {
                Ok(Key(v.to_string()))
            }
        }

        deserializer.deserialize_identifier(KeyVisitor)
    }
}

/// Map entries sorted by key; Bolt maps carry no order of their own.
struct Properties(Vec<(String, GraphValue)>);

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PropertiesVisitor).map(Properties)
    }
}

struct PropertiesVisitor;

impl<'de> Visitor<'de> for PropertiesVisitor {
    type Value = Vec<(String, GraphValue)>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a Bolt map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((Key(key), WireValue(value))) = map.next_entry()? {
            entries.push((key, value));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

// ── Graph structures ─────────────────────────────────────────────

/// Fields of a node, relationship or path as the driver lists them.
#[derive(Default)]
struct Element {
    id: Option<i64>,
    start_node_id: Option<i64>,
    end_node_id: Option<i64>,
    rel_type: Option<String>,
    labels: Vec<String>,
    properties: Vec<(String, GraphValue)>,
    nodes: Vec<GraphValue>,
    relationships: Vec<GraphValue>,
    indices: Vec<i64>,
}

struct ElementVisitor;

impl<'de> Visitor<'de> for ElementVisitor {
    type Value = Element;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a Bolt node, relationship or path")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Element, A::Error> {
        let mut element = Element::default();
        while let Some(Key(field)) = map.next_key()? {
            match field.as_str() {
                "id" => element.id = Some(map.next_value()?),
                "start_node_id" => element.start_node_id = Some(map.next_value()?),
                "end_node_id" => element.end_node_id = Some(map.next_value()?),
                "type" => element.rel_type = Some(map.next_value()?),
                "labels" => element.labels = map.next_value()?,
                "properties" => element.properties = map.next_value::<Properties>()?.0,
                "nodes" => element.nodes = unwrap_all(map.next_value()?),
                "relationships" => element.relationships = unwrap_all(map.next_value()?),
                "indices" => element.indices = map.next_value()?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(element)
    }
}

fn unwrap_all(values: Vec<WireValue>) -> Vec<GraphValue> {
    values.into_iter().map(|v| v.0).collect()
}

impl Element {
    fn into_node<E: de::Error>(self) -> Result<GraphNode, E> {
        Ok(GraphNode {
            id: self.id.ok_or_else(|| E::missing_field("id"))?,
            labels: self.labels,
            properties: self.properties,
        })
    }

    /// Unbounded relationships (inside paths) have no endpoints yet; they
    /// carry `-1` until the path walk fills them in.
    fn into_relationship<E: de::Error>(self) -> Result<GraphRelationship, E> {
        Ok(GraphRelationship {
            id: self.id.ok_or_else(|| E::missing_field("id"))?,
            start_node_id: self.start_node_id.unwrap_or(-1),
            end_node_id: self.end_node_id.unwrap_or(-1),
            rel_type: self.rel_type.ok_or_else(|| E::missing_field("type"))?,
            properties: self.properties,
        })
    }

    /// Walk a Bolt path.
    ///
    /// `indices` alternates (relationship index, node index). Relationship
    /// indices are 1-based and negative when the relationship is traversed
    /// against its direction.
    fn into_path<E: de::Error>(self) -> Result<GraphPath, E> {
        let nodes = self
            .nodes
            .into_iter()
            .map(|n| match n {
                GraphValue::Node(node) => Ok(node),
                other => Err(E::custom(format!("expected node in path, got {other:?}"))),
            })
            .collect::<Result<Vec<_>, E>>()?;
        let rels = self
            .relationships
            .into_iter()
            .map(|r| match r {
                GraphValue::Relationship(rel) => Ok(rel),
                other => Err(E::custom(format!(
                    "expected relationship in path, got {other:?}"
                ))),
            })
            .collect::<Result<Vec<_>, E>>()?;

        let Some(first) = nodes.first() else {
            return Ok(GraphPath {
                nodes: Vec::new(),
                relationships: Vec::new(),
            });
        };

        let mut walked_nodes = vec![first.clone()];
        let mut walked_rels = Vec::with_capacity(self.indices.len() / 2);
        let mut previous_id = first.id;

        for pair in self.indices.chunks_exact(2) {
            let (rel_index, node_index) = (pair[0], pair[1]);
            let rel = usize::try_from(rel_index.unsigned_abs())
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| rels.get(i));
            let node = usize::try_from(node_index).ok().and_then(|i| nodes.get(i));
            let (Some(rel), Some(node)) = (rel, node) else {
                return Err(E::custom(format!(
                    "path index out of range: ({rel_index}, {node_index})"
                )));
            };

            let mut rel = rel.clone();
            if rel_index > 0 {
                rel.start_node_id = previous_id;
                rel.end_node_id = node.id;
            } else {
                rel.start_node_id = node.id;
                rel.end_node_id = previous_id;
            }
            previous_id = node.id;
            walked_rels.push(rel);
            walked_nodes.push(node.clone());
        }

        Ok(GraphPath {
            nodes: walked_nodes,
            relationships: walked_rels,
        })
    }
}

// ── Spatial and temporal values ──────────────────────────────────

/// Reads `(srid, x, y[, z])`.
struct PointVisitor {
    with_z: bool,
}

impl<'de> Visitor<'de> for PointVisitor {
    type Value = GraphPoint;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a Bolt point")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<GraphPoint, A::Error> {
        let srid = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let x = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        let y = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(2, &self))?;
        let z = if self.with_z {
            Some(
                seq.next_element()?
                    .ok_or_else(|| de::Error::invalid_length(3, &self))?,
            )
        } else {
            None
        };
        Ok(GraphPoint { srid, x, y, z })
    }
}

/// Reads `(seconds, nanoseconds)`.
///
/// The driver folds months and days into the signed seconds total before
/// handing the duration out, so only the seconds part survives.
struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = GraphDuration;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a Bolt duration")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<GraphDuration, A::Error> {
        let seconds: i64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let nanoseconds: i64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        let nanoseconds = i32::try_from(nanoseconds).map_err(|_| {
            <A::Error as de::Error>::custom(format!(
                "duration nanoseconds out of range: {nanoseconds}"
            ))
        })?;
        Ok(GraphDuration::new(0, 0, seconds, nanoseconds))
    }
}

/// Raw temporal fields. Which ones are present depends on the kind.
#[derive(Default)]
struct Temporal {
    days: Option<i64>,
    seconds: Option<i64>,
    nanoseconds: Option<i64>,
    tz_offset_seconds: Option<i64>,
    tz_id: Option<String>,
}

struct TemporalVisitor;

impl<'de> Visitor<'de> for TemporalVisitor {
    type Value = Temporal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a Bolt temporal value")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Temporal, A::Error> {
        let mut temporal = Temporal::default();
        while let Some(Key(field)) = map.next_key()? {
            match field.as_str() {
                "days" => temporal.days = Some(map.next_value()?),
                "seconds" => temporal.seconds = Some(map.next_value()?),
                "nano_seconds" => temporal.nanoseconds = Some(map.next_value()?),
                "tz_offset_seconds" => temporal.tz_offset_seconds = Some(map.next_value()?),
                "tz_info" => temporal.tz_id = Some(map.next_value()?),
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(temporal)
    }
}

/// 1970-01-01 counted from 0001-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

impl Temporal {
    fn into_value<E: de::Error>(self, tag: u8) -> Result<GraphValue, E> {
        let value = match tag {
            kind::DATE => GraphValue::Date(date(require(self.days, "days")?)?),
            kind::TIME => GraphValue::Time(
                time_of_day(require(self.nanoseconds, "nano_seconds")?)?,
                offset(require(self.tz_offset_seconds, "tz_offset_seconds")?)?,
            ),
            kind::LOCAL_TIME => {
                GraphValue::LocalTime(time_of_day(require(self.nanoseconds, "nano_seconds")?)?)
            }
            kind::DATE_TIME => {
                // Seconds are wall-clock seconds at the given offset.
                let offset_secs = require(self.tz_offset_seconds, "tz_offset_seconds")?;
                let local = require(self.seconds, "seconds")?;
                let utc = timestamp(
                    local.saturating_sub(offset_secs),
                    self.nanoseconds.unwrap_or(0),
                )?;
                GraphValue::DateTime(utc.and_utc().with_timezone(&offset(offset_secs)?))
            }
            kind::LOCAL_DATE_TIME => GraphValue::LocalDateTime(timestamp(
                require(self.seconds, "seconds")?,
                self.nanoseconds.unwrap_or(0),
            )?),
            kind::DATE_TIME_ZONE_ID => GraphValue::ZonedDateTime(
                timestamp(require(self.seconds, "seconds")?, self.nanoseconds.unwrap_or(0))?,
                require(self.tz_id, "tz_info")?,
            ),
            other => return Err(E::custom(format!("Bolt kind {other} is not temporal"))),
        };
        Ok(value)
    }
}

fn require<T, E: de::Error>(field: Option<T>, name: &'static str) -> Result<T, E> {
    field.ok_or_else(|| E::missing_field(name))
}

fn date<E: de::Error>(days: i64) -> Result<NaiveDate, E> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(|d| i32::try_from(d).ok())
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| E::custom(format!("date out of range: {days} days")))
}

fn time_of_day<E: de::Error>(nanos: i64) -> Result<NaiveTime, E> {
    let secs = u32::try_from(nanos.div_euclid(1_000_000_000)).ok();
    let frac = u32::try_from(nanos.rem_euclid(1_000_000_000)).ok();
    secs.zip(frac)
        .and_then(|(s, n)| NaiveTime::from_num_seconds_from_midnight_opt(s, n))
        .ok_or_else(|| E::custom(format!("time out of range: {nanos} ns")))
}

fn offset<E: de::Error>(seconds: i64) -> Result<FixedOffset, E> {
    i32::try_from(seconds)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| E::custom(format!("invalid UTC offset: {seconds} s")))
}

fn timestamp<E: de::Error>(seconds: i64, nanos: i64) -> Result<NaiveDateTime, E> {
    u32::try_from(nanos)
        .ok()
        .and_then(|n| DateTime::from_timestamp(seconds, n))
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| E::custom(format!("timestamp out of range: {seconds} s")))
}
