//! Typed views over the PackStream structures that carry graph entities,
//! temporal values, and spatial points.
//!
//! Each type decodes from and encodes to a [`Structure`] with a fixed
//! signature. Field layouts follow the Bolt type system: entities grew an
//! element-id field in Bolt 5, and datetimes split into legacy (wall-clock)
//! and UTC-preferred signatures distinguished by the signature byte alone.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::marker::*;
use super::types::{Structure, Value};
use super::PackStreamError;

fn invalid(msg: impl Into<String>) -> PackStreamError {
    PackStreamError::InvalidStructure(msg.into())
}

fn expect_struct<'a>(
    value: &'a Value,
    signature: u8,
    what: &str,
) -> Result<&'a Structure, PackStreamError> {
    let s = value
        .as_structure()
        .ok_or_else(|| invalid(format!("expected {} structure", what)))?;
    if s.signature != signature {
        return Err(invalid(format!(
            "expected {} signature 0x{:02X}, got 0x{:02X}",
            what, signature, s.signature
        )));
    }
    Ok(s)
}

fn int_field(s: &Structure, index: usize, what: &str) -> Result<i64, PackStreamError> {
    s.fields[index]
        .as_int()
        .ok_or_else(|| invalid(format!("{} field {} must be an integer", what, index)))
}

fn float_field(s: &Structure, index: usize, what: &str) -> Result<f64, PackStreamError> {
    match &s.fields[index] {
        Value::Float(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        _ => Err(invalid(format!("{} field {} must be a float", what, index))),
    }
}

fn string_field(s: &Structure, index: usize, what: &str) -> Result<String, PackStreamError> {
    s.fields[index]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(format!("{} field {} must be a string", what, index)))
}

fn map_field(
    s: &Structure,
    index: usize,
    what: &str,
) -> Result<HashMap<String, Value>, PackStreamError> {
    s.fields[index]
        .as_map()
        .cloned()
        .ok_or_else(|| invalid(format!("{} field {} must be a map", what, index)))
}

fn string_list_field(
    s: &Structure,
    index: usize,
    what: &str,
) -> Result<Vec<String>, PackStreamError> {
    s.fields[index]
        .as_list()
        .ok_or_else(|| invalid(format!("{} field {} must be a list", what, index)))?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(format!("{} field {} must contain strings", what, index)))
        })
        .collect()
}

/// A graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node id
    pub id: i64,
    /// Labels attached to the node
    pub labels: Vec<String>,
    /// Node properties
    pub properties: HashMap<String, Value>,
    /// Element id (Bolt >= 5)
    pub element_id: Option<String>,
}

impl Node {
    /// Create a node without an element id.
    pub fn new(id: i64, labels: Vec<String>, properties: HashMap<String, Value>) -> Self {
        Self {
            id,
            labels,
            properties,
            element_id: None,
        }
    }

    /// Attach a Bolt 5 element id.
    pub fn with_element_id(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    /// Encode as a PackStream structure; 3 fields pre-5, 4 from Bolt 5 on.
    pub fn to_value(&self) -> Value {
        let mut fields = vec![
            Value::Integer(self.id),
            Value::List(self.labels.iter().map(|l| Value::from(l.as_str())).collect()),
            Value::Map(self.properties.clone()),
        ];
        if let Some(ref eid) = self.element_id {
            fields.push(Value::String(eid.clone()));
        }
        Value::Structure(Structure::new(SIG_NODE, fields))
    }

    /// Parse from a PackStream value.
    pub fn from_value(value: &Value) -> Result<Self, PackStreamError> {
        let s = expect_struct(value, SIG_NODE, "Node")?;
        if s.fields.len() != 3 && s.fields.len() != 4 {
            return Err(invalid(format!(
                "Node requires 3 or 4 fields, got {}",
                s.fields.len()
            )));
        }
        Ok(Self {
            id: int_field(s, 0, "Node")?,
            labels: string_list_field(s, 1, "Node")?,
            properties: map_field(s, 2, "Node")?,
            element_id: if s.fields.len() == 4 {
                Some(string_field(s, 3, "Node")?)
            } else {
                None
            },
        })
    }
}

/// A graph relationship bound to its endpoint nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Relationship id
    pub id: i64,
    /// Start node id
    pub start_node_id: i64,
    /// End node id
    pub end_node_id: i64,
    /// Relationship type
    pub rel_type: String,
    /// Relationship properties
    pub properties: HashMap<String, Value>,
    /// Element id (Bolt >= 5)
    pub element_id: Option<String>,
    /// Start node element id (Bolt >= 5)
    pub start_node_element_id: Option<String>,
    /// End node element id (Bolt >= 5)
    pub end_node_element_id: Option<String>,
}

impl Relationship {
    /// Create a relationship without element ids.
    pub fn new(
        id: i64,
        start_node_id: i64,
        end_node_id: i64,
        rel_type: impl Into<String>,
        properties: HashMap<String, Value>,
    ) -> Self {
        Self {
            id,
            start_node_id,
            end_node_id,
            rel_type: rel_type.into(),
            properties,
            element_id: None,
            start_node_element_id: None,
            end_node_element_id: None,
        }
    }

    /// Encode as a PackStream structure; 5 fields pre-5, 8 from Bolt 5 on.
    pub fn to_value(&self) -> Value {
        let mut fields = vec![
            Value::Integer(self.id),
            Value::Integer(self.start_node_id),
            Value::Integer(self.end_node_id),
            Value::String(self.rel_type.clone()),
            Value::Map(self.properties.clone()),
        ];
        if self.element_id.is_some() {
            fields.push(Value::String(self.element_id.clone().unwrap_or_default()));
            fields.push(Value::String(
                self.start_node_element_id.clone().unwrap_or_default(),
            ));
            fields.push(Value::String(
                self.end_node_element_id.clone().unwrap_or_default(),
            ));
        }
        Value::Structure(Structure::new(SIG_RELATIONSHIP, fields))
    }

    /// Parse from a PackStream value.
    pub fn from_value(value: &Value) -> Result<Self, PackStreamError> {
        let s = expect_struct(value, SIG_RELATIONSHIP, "Relationship")?;
        if s.fields.len() != 5 && s.fields.len() != 8 {
            return Err(invalid(format!(
                "Relationship requires 5 or 8 fields, got {}",
                s.fields.len()
            )));
        }
        let with_element_ids = s.fields.len() == 8;
        Ok(Self {
            id: int_field(s, 0, "Relationship")?,
            start_node_id: int_field(s, 1, "Relationship")?,
            end_node_id: int_field(s, 2, "Relationship")?,
            rel_type: string_field(s, 3, "Relationship")?,
            properties: map_field(s, 4, "Relationship")?,
            element_id: if with_element_ids {
                Some(string_field(s, 5, "Relationship")?)
            } else {
                None
            },
            start_node_element_id: if with_element_ids {
                Some(string_field(s, 6, "Relationship")?)
            } else {
                None
            },
            end_node_element_id: if with_element_ids {
                Some(string_field(s, 7, "Relationship")?)
            } else {
                None
            },
        })
    }
}

/// A relationship as carried inside a path, without endpoint node ids.
#[derive(Debug, Clone, PartialEq)]
pub struct UnboundRelationship {
    /// Relationship id
    pub id: i64,
    /// Relationship type
    pub rel_type: String,
    /// Relationship properties
    pub properties: HashMap<String, Value>,
    /// Element id (Bolt >= 5)
    pub element_id: Option<String>,
}

impl UnboundRelationship {
    /// Create an unbound relationship.
    pub fn new(id: i64, rel_type: impl Into<String>, properties: HashMap<String, Value>) -> Self {
        Self {
            id,
            rel_type: rel_type.into(),
            properties,
            element_id: None,
        }
    }

    /// Encode as a PackStream structure.
    pub fn to_value(&self) -> Value {
        let mut fields = vec![
            Value::Integer(self.id),
            Value::String(self.rel_type.clone()),
            Value::Map(self.properties.clone()),
        ];
        if let Some(ref eid) = self.element_id {
            fields.push(Value::String(eid.clone()));
        }
        Value::Structure(Structure::new(SIG_UNBOUND_RELATIONSHIP, fields))
    }

    /// Parse from a PackStream value.
    pub fn from_value(value: &Value) -> Result<Self, PackStreamError> {
        let s = expect_struct(value, SIG_UNBOUND_RELATIONSHIP, "UnboundRelationship")?;
        if s.fields.len() != 3 && s.fields.len() != 4 {
            return Err(invalid(format!(
                "UnboundRelationship requires 3 or 4 fields, got {}",
                s.fields.len()
            )));
        }
        Ok(Self {
            id: int_field(s, 0, "UnboundRelationship")?,
            rel_type: string_field(s, 1, "UnboundRelationship")?,
            properties: map_field(s, 2, "UnboundRelationship")?,
            element_id: if s.fields.len() == 4 {
                Some(string_field(s, 3, "UnboundRelationship")?)
            } else {
                None
            },
        })
    }
}

/// One hop of an expanded path: start node, traversed relationship, end node.
///
/// `reversed` is set when the relationship was traversed against its stored
/// direction.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment<'a> {
    /// Node the hop starts at
    pub start: &'a Node,
    /// Relationship traversed
    pub relationship: &'a UnboundRelationship,
    /// Node the hop ends at
    pub end: &'a Node,
    /// Whether the hop runs against the relationship's stored direction
    pub reversed: bool,
}

/// A graph path.
///
/// The sequence alternates (relationship index, node index). Relationship
/// indices are 1-based and signed: a negative index means the relationship
/// was traversed in reverse. Node indices are 0-based into `nodes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Distinct nodes appearing on the path; the first is the start node
    pub nodes: Vec<Node>,
    /// Distinct relationships appearing on the path
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

    /// Start node of the path.
    pub fn start(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// End node of the path.
    pub fn end(&self) -> Option<&Node> {
        self.segments()
            .ok()
            .and_then(|segs| segs.last().map(|s| s.end))
            .or_else(|| self.nodes.first())
    }

    /// Expand the traversal sequence into hops.
    pub fn segments(&self) -> Result<Vec<PathSegment<'_>>, PackStreamError> {
        let mut segments = Vec::with_capacity(self.len());
        let mut prev = self
            .nodes
            .first()
            .ok_or_else(|| invalid("Path requires at least one node"))?;
        for pair in self.sequence.chunks(2) {
            let [rel_index, node_index] = pair else {
                return Err(invalid("Path sequence must have even length"));
            };
            let reversed = *rel_index < 0;
            let rel_pos = rel_index.unsigned_abs() as usize;
            if rel_pos == 0 || rel_pos > self.relationships.len() {
                return Err(invalid(format!(
                    "Path relationship index {} out of range",
                    rel_index
                )));
            }
            let node_pos = usize::try_from(*node_index)
                .ok()
                .filter(|&i| i < self.nodes.len())
                .ok_or_else(|| {
                    invalid(format!("Path node index {} out of range", node_index))
                })?;
            let next = &self.nodes[node_pos];
            segments.push(PathSegment {
                start: prev,
                relationship: &self.relationships[rel_pos - 1],
                end: next,
                reversed,
            });
            prev = next;
        }
        Ok(segments)
    }

    /// Encode as a PackStream structure.
    pub fn to_value(&self) -> Value {
        Value::Structure(Structure::new(
            SIG_PATH,
            vec![
                Value::List(self.nodes.iter().map(Node::to_value).collect()),
                Value::List(
                    self.relationships
                        .iter()
                        .map(UnboundRelationship::to_value)
                        .collect(),
                ),
                Value::List(self.sequence.iter().map(|i| Value::Integer(*i)).collect()),
            ],
        ))
    }

    /// Parse from a PackStream value.
    pub fn from_value(value: &Value) -> Result<Self, PackStreamError> {
        let s = expect_struct(value, SIG_PATH, "Path")?;
        if s.fields.len() != 3 {
            return Err(invalid(format!(
                "Path requires 3 fields, got {}",
                s.fields.len()
            )));
        }
        let nodes = s.fields[0]
            .as_list()
            .ok_or_else(|| invalid("Path nodes must be a list"))?
            .iter()
            .map(Node::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        let relationships = s.fields[1]
            .as_list()
            .ok_or_else(|| invalid("Path relationships must be a list"))?
            .iter()
            .map(UnboundRelationship::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        let sequence = s.fields[2]
            .as_list()
            .ok_or_else(|| invalid("Path sequence must be a list"))?
            .iter()
            .map(|v| v.as_int().ok_or_else(|| invalid("Path sequence must contain integers")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            nodes,
            relationships,
            sequence,
        })
    }
}

/// A date as days since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Date {
    /// Days since 1970-01-01
    pub days: i64,
}

impl Date {
    /// Create from a day count.
    pub fn new(days: i64) -> Self {
        Self { days }
    }

    /// Encode as a PackStream structure.
    pub fn to_value(&self) -> Value {
        Value::Structure(Structure::new(SIG_DATE, vec![Value::Integer(self.days)]))
    }

    /// Parse from a PackStream value.
    pub fn from_value(value: &Value) -> Result<Self, PackStreamError> {
        let s = expect_struct(value, SIG_DATE, "Date")?;
        if s.fields.len() != 1 {
            return Err(invalid("Date requires 1 field"));
        }
        Ok(Self {
            days: int_field(s, 0, "Date")?,
        })
    }
}

/// A time of day with a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Time {
    /// Nanoseconds since midnight
    pub nanoseconds: i64,
    /// Offset from UTC in seconds
    pub tz_offset_seconds: i32,
}

impl Time {
    /// Create a time value.
    pub fn new(nanoseconds: i64, tz_offset_seconds: i32) -> Self {
        Self {
            nanoseconds,
            tz_offset_seconds,
        }
    }

    /// Encode as a PackStream structure.
    pub fn to_value(&self) -> Value {
        Value::Structure(Structure::new(
            SIG_TIME,
            vec![
                Value::Integer(self.nanoseconds),
                Value::Integer(self.tz_offset_seconds as i64),
            ],
        ))
    }

    /// Parse from a PackStream value.
    pub fn from_value(value: &Value) -> Result<Self, PackStreamError> {
        let s = expect_struct(value, SIG_TIME, "Time")?;
        if s.fields.len() != 2 {
            return Err(invalid("Time requires 2 fields"));
        }
        Ok(Self {
            nanoseconds: int_field(s, 0, "Time")?,
            tz_offset_seconds: int_field(s, 1, "Time")? as i32,
        })
    }
}

/// A time of day without timezone information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTime {
    /// Nanoseconds since midnight
    pub nanoseconds: i64,
}

impl LocalTime {
    /// Create a local time value.
    pub fn new(nanoseconds: i64) -> Self {
        Self { nanoseconds }
    }

    /// Encode as a PackStream structure.
    pub fn to_value(&self) -> Value {
        Value::Structure(Structure::new(
            SIG_LOCAL_TIME,
            vec![Value::Integer(self.nanoseconds)],
        ))
    }

    /// Parse from a PackStream value.
    pub fn from_value(value: &Value) -> Result<Self, PackStreamError> {
        let s = expect_struct(value, SIG_LOCAL_TIME, "LocalTime")?;
        if s.fields.len() != 1 {
            return Err(invalid("LocalTime requires 1 field"));
        }
        Ok(Self {
            nanoseconds: int_field(s, 0, "LocalTime")?,
        })
    }
}

/// A point in time with a fixed UTC offset.
///
/// Bolt 5 replaced the legacy encoding (seconds counted in local wall-clock
/// time, signature 'F') with a UTC-based one (signature 'I'); `utc` records
/// which signature the value came from, or selects which one to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTime {
    /// Seconds since the epoch; local-time based when `utc` is false
    pub seconds: i64,
    /// Nanosecond adjustment
    pub nanoseconds: i64,
    /// Offset from UTC in seconds
    pub tz_offset_seconds: i32,
    /// Whether the seconds count is UTC-based (Bolt >= 5 signature)
    pub utc: bool,
}

impl DateTime {
    /// Create a UTC-based datetime.
    pub fn utc(seconds: i64, nanoseconds: i64, tz_offset_seconds: i32) -> Self {
        Self {
            seconds,
            nanoseconds,
            tz_offset_seconds,
            utc: true,
        }
    }

    /// Create a legacy wall-clock datetime.
    pub fn legacy(seconds: i64, nanoseconds: i64, tz_offset_seconds: i32) -> Self {
        Self {
            seconds,
            nanoseconds,
            tz_offset_seconds,
            utc: false,
        }
    }

    /// Seconds since the Unix epoch in UTC, regardless of encoding.
    pub fn epoch_seconds(&self) -> i64 {
        if self.utc {
            self.seconds
        } else {
            self.seconds - self.tz_offset_seconds as i64
        }
    }

    /// Encode as a PackStream structure, choosing the signature by `utc`.
    pub fn to_value(&self) -> Value {
        let signature = if self.utc {
            SIG_DATE_TIME
        } else {
            SIG_DATE_TIME_LEGACY
        };
        Value::Structure(Structure::new(
            signature,
            vec![
                Value::Integer(self.seconds),
                Value::Integer(self.nanoseconds),
                Value::Integer(self.tz_offset_seconds as i64),
            ],
        ))
    }

    /// Parse from a PackStream value; accepts both signatures.
    pub fn from_value(value: &Value) -> Result<Self, PackStreamError> {
        let s = value
            .as_structure()
            .ok_or_else(|| invalid("expected DateTime structure"))?;
        let utc = match s.signature {
            SIG_DATE_TIME => true,
            SIG_DATE_TIME_LEGACY => false,
            other => {
                return Err(invalid(format!(
                    "expected DateTime signature, got 0x{:02X}",
                    other
                )))
            }
        };
        if s.fields.len() != 3 {
            return Err(invalid("DateTime requires 3 fields"));
        }
        Ok(Self {
            seconds: int_field(s, 0, "DateTime")?,
            nanoseconds: int_field(s, 1, "DateTime")?,
            tz_offset_seconds: int_field(s, 2, "DateTime")? as i32,
            utc,
        })
    }
}

/// A point in time tied to a named timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeZoneId {
    /// Seconds since the epoch; local-time based when `utc` is false
    pub seconds: i64,
    /// Nanosecond adjustment
    pub nanoseconds: i64,
    /// IANA timezone identifier, e.g. "Europe/Stockholm"
    pub tz_id: String,
    /// Whether the seconds count is UTC-based (Bolt >= 5 signature)
    pub utc: bool,
}

impl DateTimeZoneId {
    /// Create a UTC-based zoned datetime.
    pub fn utc(seconds: i64, nanoseconds: i64, tz_id: impl Into<String>) -> Self {
        Self {
            seconds,
            nanoseconds,
            tz_id: tz_id.into(),
            utc: true,
        }
    }

    /// Encode as a PackStream structure, choosing the signature by `utc`.
    pub fn to_value(&self) -> Value {
        let signature = if self.utc {
            SIG_DATE_TIME_ZONE_ID
        } else {
            SIG_DATE_TIME_ZONE_ID_LEGACY
        };
        Value::Structure(Structure::new(
            signature,
            vec![
                Value::Integer(self.seconds),
                Value::Integer(self.nanoseconds),
                Value::String(self.tz_id.clone()),
            ],
        ))
    }

    /// Parse from a PackStream value; accepts both signatures.
    pub fn from_value(value: &Value) -> Result<Self, PackStreamError> {
        let s = value
            .as_structure()
            .ok_or_else(|| invalid("expected DateTimeZoneId structure"))?;
        let utc = match s.signature {
            SIG_DATE_TIME_ZONE_ID => true,
            SIG_DATE_TIME_ZONE_ID_LEGACY => false,
            other => {
                return Err(invalid(format!(
                    "expected DateTimeZoneId signature, got 0x{:02X}",
                    other
                )))
            }
        };
        if s.fields.len() != 3 {
            return Err(invalid("DateTimeZoneId requires 3 fields"));
        }
        Ok(Self {
            seconds: int_field(s, 0, "DateTimeZoneId")?,
            nanoseconds: int_field(s, 1, "DateTimeZoneId")?,
            tz_id: string_field(s, 2, "DateTimeZoneId")?,
            utc,
        })
    }
}

/// A point in time without timezone information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDateTime {
    /// Seconds since the epoch (local reading)
    pub seconds: i64,
    /// Nanosecond adjustment
    pub nanoseconds: i64,
}

impl LocalDateTime {
    /// Create a local datetime value.
    pub fn new(seconds: i64, nanoseconds: i64) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }

    /// Encode as a PackStream structure.
    pub fn to_value(&self) -> Value {
        Value::Structure(Structure::new(
            SIG_LOCAL_DATE_TIME,
            vec![
                Value::Integer(self.seconds),
                Value::Integer(self.nanoseconds),
            ],
        ))
    }

    /// Parse from a PackStream value.
    pub fn from_value(value: &Value) -> Result<Self, PackStreamError> {
        let s = expect_struct(value, SIG_LOCAL_DATE_TIME, "LocalDateTime")?;
        if s.fields.len() != 2 {
            return Err(invalid("LocalDateTime requires 2 fields"));
        }
        Ok(Self {
            seconds: int_field(s, 0, "LocalDateTime")?,
            nanoseconds: int_field(s, 1, "LocalDateTime")?,
        })
    }
}

/// An elapsed amount of time in calendar and clock units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duration {
    /// Months component
    pub months: i64,
    /// Days component
    pub days: i64,
    /// Seconds component
    pub seconds: i64,
    /// Nanoseconds component
    pub nanoseconds: i64,
}

impl Duration {
    /// Create a duration.
    pub fn new(months: i64, days: i64, seconds: i64, nanoseconds: i64) -> Self {
        Self {
            months,
            days,
            seconds,
            nanoseconds,
        }
    }

    /// Encode as a PackStream structure.
    pub fn to_value(&self) -> Value {
        Value::Structure(Structure::new(
            SIG_DURATION,
            vec![
                Value::Integer(self.months),
                Value::Integer(self.days),
                Value::Integer(self.seconds),
                Value::Integer(self.nanoseconds),
            ],
        ))
    }

    /// Parse from a PackStream value.
    pub fn from_value(value: &Value) -> Result<Self, PackStreamError> {
        let s = expect_struct(value, SIG_DURATION, "Duration")?;
        if s.fields.len() != 4 {
            return Err(invalid("Duration requires 4 fields"));
        }
        Ok(Self {
            months: int_field(s, 0, "Duration")?,
            days: int_field(s, 1, "Duration")?,
            seconds: int_field(s, 2, "Duration")?,
            nanoseconds: int_field(s, 3, "Duration")?,
        })
    }
}

/// Coordinate reference system, derived from the SRID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crs {
    /// SRID 4326
    Wgs84,
    /// SRID 4979
    Wgs84_3d,
    /// SRID 7203
    Cartesian,
    /// SRID 9157
    Cartesian3d,
    /// Any other SRID
    Other(i32),
}

impl Crs {
    /// Classify an SRID.
    pub fn from_srid(srid: i32) -> Self {
        match srid {
            4326 => Crs::Wgs84,
            4979 => Crs::Wgs84_3d,
            7203 => Crs::Cartesian,
            9157 => Crs::Cartesian3d,
            other => Crs::Other(other),
        }
    }

    /// Canonical CRS name, when known.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Crs::Wgs84 => Some("wgs-84"),
            Crs::Wgs84_3d => Some("wgs-84-3d"),
            Crs::Cartesian => Some("cartesian"),
            Crs::Cartesian3d => Some("cartesian-3d"),
            Crs::Other(_) => None,
        }
    }
}

/// A spatial point in two or three dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Spatial reference system identifier
    pub srid: i32,
    /// X coordinate (longitude for WGS-84)
    pub x: f64,
    /// Y coordinate (latitude for WGS-84)
    pub y: f64,
    /// Z coordinate, present for 3D points
    pub z: Option<f64>,
}

impl Point {
    /// Create a 2D point.
    pub fn new_2d(srid: i32, x: f64, y: f64) -> Self {
        Self { srid, x, y, z: None }
    }

    /// Create a 3D point.
    pub fn new_3d(srid: i32, x: f64, y: f64, z: f64) -> Self {
        Self {
            srid,
            x,
            y,
            z: Some(z),
        }
    }

    /// Coordinate reference system of the point.
    pub fn crs(&self) -> Crs {
        Crs::from_srid(self.srid)
    }

    /// Encode as a Point2D or Point3D structure.
    pub fn to_value(&self) -> Value {
        match self.z {
            Some(z) => Value::Structure(Structure::new(
                SIG_POINT_3D,
                vec![
                    Value::Integer(self.srid as i64),
                    Value::Float(self.x),
                    Value::Float(self.y),
                    Value::Float(z),
                ],
            )),
            None => Value::Structure(Structure::new(
                SIG_POINT_2D,
                vec![
                    Value::Integer(self.srid as i64),
                    Value::Float(self.x),
                    Value::Float(self.y),
                ],
            )),
        }
    }

    /// Parse from a PackStream value; accepts both signatures.
    pub fn from_value(value: &Value) -> Result<Self, PackStreamError> {
        let s = value
            .as_structure()
            .ok_or_else(|| invalid("expected Point structure"))?;
        match (s.signature, s.fields.len()) {
            (SIG_POINT_2D, 3) => Ok(Self {
                srid: int_field(s, 0, "Point")? as i32,
                x: float_field(s, 1, "Point")?,
                y: float_field(s, 2, "Point")?,
                z: None,
            }),
            (SIG_POINT_3D, 4) => Ok(Self {
                srid: int_field(s, 0, "Point")? as i32,
                x: float_field(s, 1, "Point")?,
                y: float_field(s, 2, "Point")?,
                z: Some(float_field(s, 3, "Point")?),
            }),
            (SIG_POINT_2D, n) | (SIG_POINT_3D, n) => {
                Err(invalid(format!("Point has wrong arity {}", n)))
            }
            (other, _) => Err(invalid(format!(
                "expected Point signature, got 0x{:02X}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_roundtrip() {
        let mut props = HashMap::new();
        props.insert("name".to_string(), Value::String("Alice".into()));
        let node = Node::new(1, vec!["Person".to_string()], props);

        let value = node.to_value();
        let s = value.as_structure().unwrap();
        assert_eq!(s.signature, SIG_NODE);
        assert_eq!(s.fields.len(), 3);

        let parsed = Node::from_value(&value).unwrap();
        assert_eq!(parsed, node);
    }

    #[test]
    fn test_node_element_id() {
        let node = Node::new(7, vec![], HashMap::new()).with_element_id("4:abc:7");
        let value = node.to_value();
        assert_eq!(value.as_structure().unwrap().fields.len(), 4);

        let parsed = Node::from_value(&value).unwrap();
        assert_eq!(parsed.element_id.as_deref(), Some("4:abc:7"));
    }

    #[test]
    fn test_node_wrong_arity() {
        let bad = Value::Structure(Structure::new(SIG_NODE, vec![Value::Integer(1)]));
        assert!(Node::from_value(&bad).is_err());

        let bad = Value::Structure(Structure::new(
            SIG_NODE,
            vec![
                Value::Integer(1),
                Value::List(vec![]),
                Value::Map(HashMap::new()),
                Value::String("eid".into()),
                Value::Null,
            ],
        ));
        assert!(Node::from_value(&bad).is_err());
    }

    #[test]
    fn test_relationship_roundtrip() {
        let rel = Relationship::new(3, 1, 2, "KNOWS", HashMap::new());
        let value = rel.to_value();
        assert_eq!(value.as_structure().unwrap().fields.len(), 5);
        assert_eq!(Relationship::from_value(&value).unwrap(), rel);
    }

    #[test]
    fn test_unbound_relationship_roundtrip() {
        let rel = UnboundRelationship::new(9, "LINKS", HashMap::new());
        let value = rel.to_value();
        assert_eq!(UnboundRelationship::from_value(&value).unwrap(), rel);
    }

    fn sample_path() -> Path {
        Path {
            nodes: vec![
                Node::new(1, vec![], HashMap::new()),
                Node::new(2, vec![], HashMap::new()),
                Node::new(3, vec![], HashMap::new()),
            ],
            relationships: vec![
                UnboundRelationship::new(10, "A", HashMap::new()),
                UnboundRelationship::new(11, "B", HashMap::new()),
            ],
            // forward over rel 10 to node[1], backward over rel 11 to node[2]
            sequence: vec![1, 1, -2, 2],
        }
    }

    #[test]
    fn test_path_roundtrip() {
        let path = sample_path();
        let value = path.to_value();
        assert_eq!(Path::from_value(&value).unwrap(), path);
    }

    #[test]
    fn test_path_segments() {
        let path = sample_path();
        let segments = path.segments().unwrap();
        assert_eq!(segments.len(), 2);

        assert_eq!(segments[0].start.id, 1);
        assert_eq!(segments[0].relationship.id, 10);
        assert_eq!(segments[0].end.id, 2);
        assert!(!segments[0].reversed);

        assert_eq!(segments[1].start.id, 2);
        assert_eq!(segments[1].relationship.id, 11);
        assert_eq!(segments[1].end.id, 3);
        assert!(segments[1].reversed);

        assert_eq!(path.len(), 2);
        assert_eq!(path.start().unwrap().id, 1);
        assert_eq!(path.end().unwrap().id, 3);
    }

    #[test]
    fn test_path_bad_sequence() {
        let mut path = sample_path();
        path.sequence = vec![5, 1];
        assert!(path.segments().is_err());

        path.sequence = vec![1, 9];
        assert!(path.segments().is_err());
    }

    #[test]
    fn test_date_roundtrip() {
        let date = Date::new(18628);
        assert_eq!(Date::from_value(&date.to_value()).unwrap(), date);
    }

    #[test]
    fn test_time_roundtrip() {
        let time = Time::new(45_296_000_000_000, 3600);
        assert_eq!(Time::from_value(&time.to_value()).unwrap(), time);

        let local = LocalTime::new(1_000_000);
        assert_eq!(LocalTime::from_value(&local.to_value()).unwrap(), local);
    }

    #[test]
    fn test_datetime_signatures() {
        let utc = DateTime::utc(1_700_000_000, 42, 7200);
        let value = utc.to_value();
        assert_eq!(value.as_structure().unwrap().signature, SIG_DATE_TIME);
        assert_eq!(DateTime::from_value(&value).unwrap(), utc);

        let legacy = DateTime::legacy(1_700_007_200, 42, 7200);
        let value = legacy.to_value();
        assert_eq!(
            value.as_structure().unwrap().signature,
            SIG_DATE_TIME_LEGACY
        );
        let parsed = DateTime::from_value(&value).unwrap();
        assert!(!parsed.utc);
        // Both encodings name the same instant.
        assert_eq!(parsed.epoch_seconds(), utc.epoch_seconds());
    }

    #[test]
    fn test_datetime_zone_id_roundtrip() {
        let dt = DateTimeZoneId::utc(1_700_000_000, 0, "Europe/Stockholm");
        let value = dt.to_value();
        assert_eq!(
            value.as_structure().unwrap().signature,
            SIG_DATE_TIME_ZONE_ID
        );
        assert_eq!(DateTimeZoneId::from_value(&value).unwrap(), dt);
    }

    #[test]
    fn test_local_datetime_roundtrip() {
        let dt = LocalDateTime::new(1_600_000_000, 123);
        assert_eq!(LocalDateTime::from_value(&dt.to_value()).unwrap(), dt);
    }

    #[test]
    fn test_duration_roundtrip() {
        let dur = Duration::new(12, 30, 3600, 500);
        assert_eq!(Duration::from_value(&dur.to_value()).unwrap(), dur);
    }

    #[test]
    fn test_point_roundtrip() {
        let p2 = Point::new_2d(4326, 12.9, 57.7);
        let value = p2.to_value();
        assert_eq!(value.as_structure().unwrap().signature, SIG_POINT_2D);
        assert_eq!(Point::from_value(&value).unwrap(), p2);

        let p3 = Point::new_3d(9157, 1.0, 2.0, 3.0);
        let value = p3.to_value();
        assert_eq!(value.as_structure().unwrap().signature, SIG_POINT_3D);
        assert_eq!(Point::from_value(&value).unwrap(), p3);
    }

    #[test]
    fn test_crs_classification() {
        assert_eq!(Point::new_2d(4326, 0.0, 0.0).crs(), Crs::Wgs84);
        assert_eq!(Point::new_3d(4979, 0.0, 0.0, 0.0).crs(), Crs::Wgs84_3d);
        assert_eq!(Point::new_2d(7203, 0.0, 0.0).crs(), Crs::Cartesian);
        assert_eq!(Point::new_3d(9157, 0.0, 0.0, 0.0).crs(), Crs::Cartesian3d);
        assert_eq!(Crs::from_srid(1234), Crs::Other(1234));
        assert_eq!(Crs::Wgs84.name(), Some("wgs-84"));
        assert_eq!(Crs::Other(1234).name(), None);
    }
}
