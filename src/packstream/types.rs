//! PackStream value types.

use std::collections::HashMap;

/// A PackStream value as it appears on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit IEEE 754 float
    Float(f64),
    /// Byte array (Bolt >= 2.0)
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Ordered list of values
    List(Vec<Value>),
    /// Map with string keys; key order carries no meaning
    Map(HashMap<String, Value>),
    /// Signed, fixed-arity structure
    Structure(Structure),
}

/// A PackStream structure: a signature byte plus an ordered field list.
///
/// Structures carry both protocol messages and domain entities; the
/// signature identifies which.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    /// Signature byte identifying the structure kind
    pub signature: u8,
    /// Ordered fields
    pub fields: Vec<Value>,
}

impl Structure {
    /// Create a new structure.
    pub fn new(signature: u8, fields: Vec<Value>) -> Self {
        Self { signature, fields }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the structure has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field at `index`, if present.
    pub fn field(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }
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

    /// Float content; integers widen losslessly enough for metadata use.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// String slice content, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Byte slice content, if any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
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

    /// Structure content, if any.
    pub fn as_structure(&self) -> Option<&Structure> {
        match self {
            Value::Structure(s) => Some(s),
            _ => None,
        }
    }

    /// Take the structure out of this value, if it is one.
    pub fn into_structure(self) -> Option<Structure> {
        match self {
            Value::Structure(s) => Some(s),
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
            Value::Bytes(_) => "Bytes",
            Value::String(_) => "String",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Structure(_) => "Structure",
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

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(v: HashMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl From<Structure> for Value {
    fn from(v: Structure) -> Self {
        Value::Structure(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::Integer(42).as_int(), Some(42));
        assert_eq!(Value::Integer(42).as_float(), Some(42.0));
        assert_eq!(Value::Float(1.5).as_float(), Some(1.5));
        assert_eq!(Value::Float(1.5).as_int(), None);
        assert_eq!(Value::String("hi".into()).as_str(), Some("hi"));
        assert_eq!(Value::Bytes(vec![1, 2]).as_bytes(), Some(&[1u8, 2][..]));
    }

    #[test]
    fn test_structure() {
        let s = Structure::new(0x4E, vec![Value::Integer(1)]);
        assert_eq!(s.signature, 0x4E);
        assert_eq!(s.len(), 1);
        assert!(!s.is_empty());
        assert_eq!(s.field(0), Some(&Value::Integer(1)));
        assert_eq!(s.field(1), None);

        let v = Value::Structure(s);
        assert!(v.as_structure().is_some());
        assert!(v.into_structure().is_some());
    }

    #[test]
    fn test_map_access() {
        let mut map = HashMap::new();
        map.insert("key".to_string(), Value::Integer(7));
        let v = Value::Map(map);
        assert_eq!(v.as_map().unwrap().get("key").unwrap().as_int(), Some(7));
    }

    #[test]
    fn test_from_conversions() {
        let _: Value = true.into();
        let _: Value = 42i64.into();
        let _: Value = 42i32.into();
        let _: Value = 2.5f64.into();
        let _: Value = "hello".into();
        let _: Value = String::from("hello").into();
        let _: Value = vec![1u8, 2, 3].into();
        let _: Value = Structure::new(0x4E, vec![]).into();
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "Null");
        assert_eq!(Value::List(vec![]).type_name(), "List");
        assert_eq!(
            Value::Structure(Structure::new(0, vec![])).type_name(),
            "Structure"
        );
    }
}
