//! Caller-facing values.
//!
//! Wire values ([`crate::packstream::Value`]) carry domain entities as raw
//! structures. This module lifts them into typed values: graph entities with
//! converted property maps, and the temporal/spatial structures as-is, with
//! chrono accessors where a calendar type exists for them.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime as ChronoDateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::BoltError;
use crate::packstream::marker::*;
use crate::packstream::structures;
use crate::packstream::{self, PackStreamError, Structure};

pub use crate::packstream::structures::{
    Crs, Date, DateTime, DateTimeZoneId, Duration, LocalDateTime, LocalTime, Point, Time,
};

/// A decoded database value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null
    Null,
    /// Boolean
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Byte array
    Bytes(Vec<u8>),
    /// List of values
    List(Vec<Value>),
    /// Map with string keys
    Map(HashMap<String, Value>),
    /// Graph node
    Node(Node),
    /// Graph relationship
    Relationship(Relationship),
    /// Relationship without endpoint ids, as found in paths
    UnboundRelationship(UnboundRelationship),
    /// Graph path
    Path(Path),
    /// Spatial point
    Point(Point),
    /// Date
    Date(Date),
    /// Time with UTC offset
    Time(Time),
    /// Time without timezone
    LocalTime(LocalTime),
    /// Datetime with UTC offset
    DateTime(DateTime),
    /// Datetime with named timezone
    DateTimeZoneId(DateTimeZoneId),
    /// Datetime without timezone
    LocalDateTime(LocalDateTime),
    /// Duration
    Duration(Duration),
}

/// A graph node with converted properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node id
    pub id: i64,
    /// Labels attached to the node
    pub labels: Vec<String>,
    /// Node properties
    pub properties: HashMap<String, Value>,
    /// Element id (Bolt >= 5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl Node {
    /// Whether the node carries `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Property by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Property converted to a concrete type.
    pub fn get_as<T: TryFrom<Value, Error = BoltError>>(&self, key: &str) -> Result<T, BoltError> {
        self.properties
            .get(key)
            .cloned()
            .ok_or_else(|| BoltError::type_conversion(format!("property '{}' not found", key)))
            .and_then(T::try_from)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = if self.labels.is_empty() {
            String::new()
        } else {
            format!(":{}", self.labels.join(":"))
        };
        write!(f, "({}{})", self.id, labels)
    }
}

/// A graph relationship with converted properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship id
    pub id: i64,
    /// Start node id
    pub start_node_id: i64,
    /// End node id
    pub end_node_id: i64,
    /// Relationship type
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Relationship properties
    pub properties: HashMap<String, Value>,
    /// Element id (Bolt >= 5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// Start node element id (Bolt >= 5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_node_element_id: Option<String>,
    /// End node element id (Bolt >= 5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_node_element_id: Option<String>,
}

impl Relationship {
    /// Property by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({})-[:{}]->({})",
            self.start_node_id, self.rel_type, self.end_node_id
        )
    }
}

/// A relationship inside a path, without endpoint ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnboundRelationship {
    /// Relationship id
    pub id: i64,
    /// Relationship type
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Relationship properties
    pub properties: HashMap<String, Value>,
    /// Element id (Bolt >= 5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

/// A graph path with converted nodes and relationships.
///
/// `sequence` keeps the wire traversal encoding: alternating 1-based signed
/// relationship indices (negative = traversed in reverse) and 0-based node
/// indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// Distinct nodes on the path; the first is the start node
    pub nodes: Vec<Node>,
    /// Distinct relationships on the path
    pub relationships: Vec<UnboundRelationship>,
    /// Alternating (rel_index, node_index) traversal sequence
    pub sequence: Vec<i64>,
}

impl Path {
    /// Number of hops.
    pub fn len(&self) -> usize {
        self.sequence.len() / 2
    }

    /// Whether the path has no hops.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Start node.
    pub fn start(&self) -> Option<&Node> {
        self.nodes.first()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<path: {} nodes, {} relationships>",
            self.nodes.len(),
            self.relationships.len()
        )
    }
}

impl Date {
    /// As a chrono date; `None` when out of chrono's range.
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        // 719163 days from 0001-01-01 (CE) to the Unix epoch.
        let days = i32::try_from(self.days).ok()?.checked_add(719_163)?;
        NaiveDate::from_num_days_from_ce_opt(days)
    }
}

impl LocalTime {
    /// As a chrono time; `None` when out of range.
    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        to_naive_time(self.nanoseconds)
    }
}

impl Time {
    /// Clock reading as a chrono time; the offset is kept separately in
    /// `tz_offset_seconds`.
    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        to_naive_time(self.nanoseconds)
    }
}

impl LocalDateTime {
    /// As a chrono datetime; `None` when out of range.
    pub fn to_naive_date_time(&self) -> Option<NaiveDateTime> {
        ChronoDateTime::from_timestamp(self.seconds, u32::try_from(self.nanoseconds).ok()?)
            .map(|dt| dt.naive_utc())
    }
}

impl DateTime {
    /// As a chrono datetime in its offset; `None` when out of range.
    pub fn to_fixed_offset(&self) -> Option<ChronoDateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.tz_offset_seconds)?;
        let utc = ChronoDateTime::from_timestamp(
            self.epoch_seconds(),
            u32::try_from(self.nanoseconds).ok()?,
        )?;
        Some(utc.with_timezone(&offset))
    }
}

fn to_naive_time(nanoseconds: i64) -> Option<NaiveTime> {
    let seconds = u32::try_from(nanoseconds / 1_000_000_000).ok()?;
    let nanos = u32::try_from(nanoseconds % 1_000_000_000).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos)
}

impl Value {
    /// Whether this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean content, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer content, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Float content; integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// String content, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// List content, if any.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Map content, if any.
    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Node content, if any.
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Relationship content, if any.
    pub fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            Value::Relationship(r) => Some(r),
            _ => None,
        }
    }

    /// Path content, if any.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Value::Path(p) => Some(p),
            _ => None,
        }
    }

    /// Name of the value kind, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Node(_) => "Node",
            Value::Relationship(_) => "Relationship",
            Value::UnboundRelationship(_) => "UnboundRelationship",
            Value::Path(_) => "Path",
            Value::Point(_) => "Point",
            Value::Date(_) => "Date",
            Value::Time(_) => "Time",
            Value::LocalTime(_) => "LocalTime",
            Value::DateTime(_) => "DateTime",
            Value::DateTimeZoneId(_) => "DateTimeZoneId",
            Value::LocalDateTime(_) => "LocalDateTime",
            Value::Duration(_) => "Duration",
        }
    }

    /// Lift a wire value into a typed value.
    ///
    /// Structures are dispatched on their signature byte; a signature
    /// outside the catalog is a codec error.
    pub fn from_wire(wire: packstream::Value) -> Result<Self, PackStreamError> {
        Ok(match wire {
            packstream::Value::Null => Value::Null,
            packstream::Value::Boolean(b) => Value::Boolean(b),
            packstream::Value::Integer(i) => Value::Integer(i),
            packstream::Value::Float(f) => Value::Float(f),
            packstream::Value::String(s) => Value::String(s),
            packstream::Value::Bytes(b) => Value::Bytes(b),
            packstream::Value::List(l) => Value::List(
                l.into_iter()
                    .map(Value::from_wire)
                    .collect::<Result<_, _>>()?,
            ),
            packstream::Value::Map(m) => Value::Map(convert_map(m)?),
            packstream::Value::Structure(s) => Self::from_wire_structure(s)?,
        })
    }

    fn from_wire_structure(s: Structure) -> Result<Self, PackStreamError> {
        let wire = packstream::Value::Structure(s);
        let signature = wire.as_structure().map(|s| s.signature).unwrap_or(0);
        Ok(match signature {
            SIG_NODE => {
                let node = structures::Node::from_value(&wire)?;
                Value::Node(Node {
                    id: node.id,
                    labels: node.labels,
                    properties: convert_map(node.properties)?,
                    element_id: node.element_id,
                })
            }
            SIG_RELATIONSHIP => {
                let rel = structures::Relationship::from_value(&wire)?;
                Value::Relationship(Relationship {
                    id: rel.id,
                    start_node_id: rel.start_node_id,
                    end_node_id: rel.end_node_id,
                    rel_type: rel.rel_type,
                    properties: convert_map(rel.properties)?,
                    element_id: rel.element_id,
                    start_node_element_id: rel.start_node_element_id,
                    end_node_element_id: rel.end_node_element_id,
                })
            }
            SIG_UNBOUND_RELATIONSHIP => {
                let rel = structures::UnboundRelationship::from_value(&wire)?;
                Value::UnboundRelationship(convert_unbound(rel)?)
            }
            SIG_PATH => {
                let path = structures::Path::from_value(&wire)?;
                Value::Path(Path {
                    nodes: path
                        .nodes
                        .into_iter()
                        .map(|n| {
                            Ok(Node {
                                id: n.id,
                                labels: n.labels,
                                properties: convert_map(n.properties)?,
                                element_id: n.element_id,
                            })
                        })
                        .collect::<Result<_, PackStreamError>>()?,
                    relationships: path
                        .relationships
                        .into_iter()
                        .map(convert_unbound)
                        .collect::<Result<_, _>>()?,
                    sequence: path.sequence,
                })
            }
            SIG_POINT_2D | SIG_POINT_3D => Value::Point(Point::from_value(&wire)?),
            SIG_DATE => Value::Date(Date::from_value(&wire)?),
            SIG_TIME => Value::Time(Time::from_value(&wire)?),
            SIG_LOCAL_TIME => Value::LocalTime(LocalTime::from_value(&wire)?),
            SIG_DATE_TIME | SIG_DATE_TIME_LEGACY => Value::DateTime(DateTime::from_value(&wire)?),
            SIG_DATE_TIME_ZONE_ID | SIG_DATE_TIME_ZONE_ID_LEGACY => {
                Value::DateTimeZoneId(DateTimeZoneId::from_value(&wire)?)
            }
            SIG_LOCAL_DATE_TIME => Value::LocalDateTime(LocalDateTime::from_value(&wire)?),
            other => {
                return Err(PackStreamError::InvalidStructure(format!(
                    "unrecognized structure signature 0x{:02X}",
                    other
                )))
            }
        })
    }

    /// Lower a typed value back to the wire form.
    pub fn into_wire(self) -> packstream::Value {
        match self {
            Value::Null => packstream::Value::Null,
            Value::Boolean(b) => packstream::Value::Boolean(b),
            Value::Integer(i) => packstream::Value::Integer(i),
            Value::Float(f) => packstream::Value::Float(f),
            Value::String(s) => packstream::Value::String(s),
            Value::Bytes(b) => packstream::Value::Bytes(b),
            Value::List(l) => {
                packstream::Value::List(l.into_iter().map(Value::into_wire).collect())
            }
            Value::Map(m) => packstream::Value::Map(
                m.into_iter().map(|(k, v)| (k, v.into_wire())).collect(),
            ),
            Value::Node(n) => structures::Node {
                id: n.id,
                labels: n.labels,
                properties: lower_map(n.properties),
                element_id: n.element_id,
            }
            .to_value(),
            Value::Relationship(r) => structures::Relationship {
                id: r.id,
                start_node_id: r.start_node_id,
                end_node_id: r.end_node_id,
                rel_type: r.rel_type,
                properties: lower_map(r.properties),
                element_id: r.element_id,
                start_node_element_id: r.start_node_element_id,
                end_node_element_id: r.end_node_element_id,
            }
            .to_value(),
            Value::UnboundRelationship(r) => lower_unbound(r).to_value(),
            Value::Path(p) => structures::Path {
                nodes: p
                    .nodes
                    .into_iter()
                    .map(|n| structures::Node {
                        id: n.id,
                        labels: n.labels,
                        properties: lower_map(n.properties),
                        element_id: n.element_id,
                    })
                    .collect(),
                relationships: p.relationships.into_iter().map(lower_unbound).collect(),
                sequence: p.sequence,
            }
            .to_value(),
            Value::Point(p) => p.to_value(),
            Value::Date(d) => d.to_value(),
            Value::Time(t) => t.to_value(),
            Value::LocalTime(t) => t.to_value(),
            Value::DateTime(dt) => dt.to_value(),
            Value::DateTimeZoneId(dt) => dt.to_value(),
            Value::LocalDateTime(dt) => dt.to_value(),
            Value::Duration(d) => d.to_value(),
        }
    }
}

fn convert_map(
    map: HashMap<String, packstream::Value>,
) -> Result<HashMap<String, Value>, PackStreamError> {
    map.into_iter()
        .map(|(k, v)| Ok((k, Value::from_wire(v)?)))
        .collect()
}

fn lower_map(map: HashMap<String, Value>) -> HashMap<String, packstream::Value> {
    map.into_iter().map(|(k, v)| (k, v.into_wire())).collect()
}

fn convert_unbound(
    rel: structures::UnboundRelationship,
) -> Result<UnboundRelationship, PackStreamError> {
    Ok(UnboundRelationship {
        id: rel.id,
        rel_type: rel.rel_type,
        properties: convert_map(rel.properties)?,
        element_id: rel.element_id,
    })
}

fn lower_unbound(rel: UnboundRelationship) -> structures::UnboundRelationship {
    structures::UnboundRelationship {
        id: rel.id,
        rel_type: rel.rel_type,
        properties: lower_map(rel.properties),
        element_id: rel.element_id,
    }
}

/// Lower a parameter map for a RUN message.
pub fn params_to_wire(
    params: HashMap<String, Value>,
) -> HashMap<String, packstream::Value> {
    lower_map(params)
}

/// Build a parameter map of [`Value`]s.
///
/// ```
/// use neobolt::{params, Value};
///
/// let params = params! { "name" => "Alice", "age" => 30i64 };
/// assert_eq!(params.get("age"), Some(&Value::Integer(30)));
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::collections::HashMap::<String, $crate::value::Value>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = ::std::collections::HashMap::new();
        $(
            map.insert($key.into(), $crate::value::Value::from($value));
        )+
        map
    }};
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(l) => write!(f, "[{} items]", l.len()),
            Value::Map(m) => write!(f, "{{{} entries}}", m.len()),
            Value::Node(n) => write!(f, "{}", n),
            Value::Relationship(r) => write!(f, "{}", r),
            Value::UnboundRelationship(r) => write!(f, "-[:{}]-", r.rel_type),
            Value::Path(p) => write!(f, "{}", p),
            Value::Point(p) => match p.z {
                Some(z) => write!(f, "point(srid={}, x={}, y={}, z={})", p.srid, p.x, p.y, z),
                None => write!(f, "point(srid={}, x={}, y={})", p.srid, p.x, p.y),
            },
            Value::Date(d) => write!(f, "date({} days)", d.days),
            Value::Time(t) => write!(f, "time({}ns {:+}s)", t.nanoseconds, t.tz_offset_seconds),
            Value::LocalTime(t) => write!(f, "localtime({}ns)", t.nanoseconds),
            Value::DateTime(dt) => write!(f, "datetime({}s)", dt.epoch_seconds()),
            Value::DateTimeZoneId(dt) => write!(f, "datetime({}s {})", dt.seconds, dt.tz_id),
            Value::LocalDateTime(dt) => write!(f, "localdatetime({}s)", dt.seconds),
            Value::Duration(d) => write!(
                f,
                "duration({}mo {}d {}s {}ns)",
                d.months, d.days, d.seconds, d.nanoseconds
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

macro_rules! impl_try_from_value {
    ($target:ty, $variant:ident) => {
        impl TryFrom<Value> for $target {
            type Error = BoltError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(BoltError::type_conversion(format!(
                        "cannot convert {} to {}",
                        other.type_name(),
                        stringify!($target)
                    ))),
                }
            }
        }
    };
}

impl_try_from_value!(bool, Boolean);
impl_try_from_value!(i64, Integer);
impl_try_from_value!(String, String);
impl_try_from_value!(Node, Node);
impl_try_from_value!(Relationship, Relationship);
impl_try_from_value!(Path, Path);
impl_try_from_value!(Point, Point);
impl_try_from_value!(Duration, Duration);

impl TryFrom<Value> for f64 {
    type Error = BoltError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(BoltError::type_conversion(format!(
                "cannot convert {} to f64",
                other.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire_node() -> packstream::Value {
        let mut props = HashMap::new();
        props.insert(
            "name".to_string(),
            packstream::Value::String("Alice".into()),
        );
        structures::Node::new(1, vec!["Person".to_string()], props).to_value()
    }

    #[test]
    fn test_from_wire_scalars() {
        assert_eq!(
            Value::from_wire(packstream::Value::Null).unwrap(),
            Value::Null
        );
        assert_eq!(
            Value::from_wire(packstream::Value::Integer(5)).unwrap(),
            Value::Integer(5)
        );
        assert_eq!(
            Value::from_wire(packstream::Value::String("x".into())).unwrap(),
            Value::String("x".into())
        );
    }

    #[test]
    fn test_from_wire_node() {
        let value = Value::from_wire(wire_node()).unwrap();
        let node = value.as_node().unwrap();
        assert_eq!(node.id, 1);
        assert!(node.has_label("Person"));
        assert_eq!(node.get("name").unwrap().as_str(), Some("Alice"));
        assert!(node.get_as::<String>("name").is_ok());
        assert!(node.get_as::<i64>("name").is_err());
    }

    #[test]
    fn test_from_wire_nested_entities() {
        let wire = packstream::Value::List(vec![wire_node(), packstream::Value::Integer(2)]);
        let value = Value::from_wire(wire).unwrap();
        let list = value.as_list().unwrap();
        assert!(list[0].as_node().is_some());
        assert_eq!(list[1].as_int(), Some(2));
    }

    #[test]
    fn test_from_wire_temporal() {
        let value = Value::from_wire(Date::new(18628).to_value()).unwrap();
        assert!(matches!(value, Value::Date(d) if d.days == 18628));

        let dt = DateTime::utc(1_700_000_000, 0, 3600);
        let value = Value::from_wire(dt.to_value()).unwrap();
        assert!(matches!(value, Value::DateTime(d) if d.utc));

        let legacy = DateTime::legacy(1_700_003_600, 0, 3600);
        let value = Value::from_wire(legacy.to_value()).unwrap();
        assert!(matches!(value, Value::DateTime(d) if !d.utc));
    }

    #[test]
    fn test_from_wire_unknown_signature() {
        let wire = packstream::Value::Structure(Structure::new(0x7A, vec![]));
        let err = Value::from_wire(wire).unwrap_err();
        assert!(matches!(err, PackStreamError::InvalidStructure(_)));
    }

    #[test]
    fn test_wire_roundtrip_entities() {
        for wire in [
            wire_node(),
            structures::Relationship::new(2, 1, 3, "KNOWS", HashMap::new()).to_value(),
            Point::new_2d(4326, 1.0, 2.0).to_value(),
            Duration::new(1, 2, 3, 4).to_value(),
            Time::new(1_000, 0).to_value(),
        ] {
            let value = Value::from_wire(wire.clone()).unwrap();
            assert_eq!(value.into_wire(), wire);
        }
    }

    #[test]
    fn test_chrono_date() {
        // 2021-01-01 is 18628 days after the epoch
        let date = Date::new(18628).to_naive_date().unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());

        assert!(Date::new(i64::MAX).to_naive_date().is_none());
    }

    #[test]
    fn test_chrono_time() {
        // 12:34:56.000000007
        let nanos = ((12 * 3600 + 34 * 60 + 56) as i64) * 1_000_000_000 + 7;
        let time = LocalTime::new(nanos).to_naive_time().unwrap();
        assert_eq!(
            time,
            NaiveTime::from_hms_nano_opt(12, 34, 56, 7).unwrap()
        );
        assert!(LocalTime::new(-1).to_naive_time().is_none());
    }

    #[test]
    fn test_chrono_datetime() {
        let dt = DateTime::utc(1_700_000_000, 0, 3600)
            .to_fixed_offset()
            .unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
        assert_eq!(dt.offset().local_minus_utc(), 3600);

        // legacy encoding of the same instant
        let legacy = DateTime::legacy(1_700_003_600, 0, 3600)
            .to_fixed_offset()
            .unwrap();
        assert_eq!(legacy.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_try_from() {
        assert_eq!(bool::try_from(Value::Boolean(true)).unwrap(), true);
        assert_eq!(i64::try_from(Value::Integer(7)).unwrap(), 7);
        assert_eq!(f64::try_from(Value::Integer(7)).unwrap(), 7.0);
        assert_eq!(
            String::try_from(Value::String("x".into())).unwrap(),
            "x".to_string()
        );
        assert!(i64::try_from(Value::String("x".into())).is_err());
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(3i64), Value::Integer(3));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3i64)), Value::Integer(3));
        assert_eq!(
            Value::from(vec![1i64, 2]),
            Value::List(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Integer(5).to_string(), "5");
        assert_eq!(Value::String("x".into()).to_string(), "\"x\"");

        let node = Value::from_wire(wire_node()).unwrap();
        assert_eq!(node.to_string(), "(1:Person)");
    }
}
