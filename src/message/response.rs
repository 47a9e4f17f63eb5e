//! Server-to-client messages.

use std::collections::HashMap;

use super::signature;
use crate::error::BoltError;
use crate::packstream::{Structure, Value};

/// All server-to-client messages.
#[derive(Debug, Clone)]
pub enum Response {
    /// The request completed; carries metadata
    Success(SuccessMessage),
    /// One row of an open result stream
    Record(RecordMessage),
    /// The request failed; the connection enters the failed state
    Failure(FailureMessage),
    /// The request was not acted on because the connection is failed
    Ignored,
}

impl Response {
    /// Message name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Response::Success(_) => "SUCCESS",
            Response::Record(_) => "RECORD",
            Response::Failure(_) => "FAILURE",
            Response::Ignored => "IGNORED",
        }
    }

    /// Whether this is a SUCCESS.
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    /// Whether this is a RECORD.
    pub fn is_record(&self) -> bool {
        matches!(self, Response::Record(_))
    }

    /// Parse a decoded structure into a response message.
    ///
    /// Unknown signatures are a protocol violation: the server-to-client
    /// signature space is closed.
    pub fn from_structure(s: Structure) -> Result<Self, BoltError> {
        match s.signature {
            signature::SUCCESS => Ok(Response::Success(SuccessMessage::from_structure(s)?)),
            signature::RECORD => Ok(Response::Record(RecordMessage::from_structure(s)?)),
            signature::FAILURE => Ok(Response::Failure(FailureMessage::from_structure(s)?)),
            signature::IGNORED => Ok(Response::Ignored),
            other => Err(BoltError::protocol(format!(
                "unknown response signature 0x{:02X}",
                other
            ))),
        }
    }
}

/// SUCCESS: request completed, with metadata.
#[derive(Debug, Clone, Default)]
pub struct SuccessMessage {
    /// Response metadata
    pub metadata: HashMap<String, Value>,
}

impl SuccessMessage {
    /// Create an empty SUCCESS.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a SUCCESS with metadata.
    pub fn with_metadata(metadata: HashMap<String, Value>) -> Self {
        Self { metadata }
    }

    /// Metadata entry by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Column names announced by a RUN success.
    pub fn fields(&self) -> Option<Vec<String>> {
        self.metadata.get("fields").and_then(|v| {
            v.as_list().map(|list| {
                list.iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
        })
    }

    /// Query id assigned by a RUN success (v4+).
    pub fn qid(&self) -> Option<i64> {
        self.metadata.get("qid").and_then(|v| v.as_int())
    }

    /// Whether further PULLs on the same stream would yield more records.
    pub fn has_more(&self) -> bool {
        self.metadata
            .get("has_more")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Bookmark marking the commit point.
    pub fn bookmark(&self) -> Option<&str> {
        self.metadata.get("bookmark").and_then(|v| v.as_str())
    }

    /// Server agent string from a HELLO success.
    pub fn server(&self) -> Option<&str> {
        self.metadata.get("server").and_then(|v| v.as_str())
    }

    /// Connection id from a HELLO success.
    pub fn connection_id(&self) -> Option<&str> {
        self.metadata.get("connection_id").and_then(|v| v.as_str())
    }

    /// Database the result came from.
    pub fn db(&self) -> Option<&str> {
        self.metadata.get("db").and_then(|v| v.as_str())
    }

    /// Milliseconds until the first record was available.
    pub fn t_first(&self) -> Option<i64> {
        self.metadata.get("t_first").and_then(|v| v.as_int())
    }

    /// Milliseconds until the last record was consumed.
    pub fn t_last(&self) -> Option<i64> {
        self.metadata.get("t_last").and_then(|v| v.as_int())
    }

    /// Query statistics map.
    pub fn stats(&self) -> Option<&HashMap<String, Value>> {
        self.metadata.get("stats").and_then(|v| v.as_map())
    }

    /// Parse from a decoded structure, normalizing legacy metadata keys.
    ///
    /// Servers speaking Bolt 1/2 report `result_available_after` and
    /// `result_consumed_after`; these are renamed to `t_first`/`t_last` here
    /// so upper layers see a single shape.
    pub fn from_structure(s: Structure) -> Result<Self, BoltError> {
        if s.signature != signature::SUCCESS {
            return Err(BoltError::protocol("expected SUCCESS structure"));
        }
        let mut metadata = match s.fields.into_iter().next() {
            Some(Value::Map(m)) => m,
            Some(_) => return Err(BoltError::protocol("SUCCESS metadata must be a map")),
            None => HashMap::new(),
        };
        for (legacy, current) in [
            ("result_available_after", "t_first"),
            ("result_consumed_after", "t_last"),
        ] {
            if let Some(value) = metadata.remove(legacy) {
                metadata.entry(current.to_string()).or_insert(value);
            }
        }
        Ok(Self { metadata })
    }
}

/// RECORD: one row of values, ordered to match the announced fields.
#[derive(Debug, Clone, Default)]
pub struct RecordMessage {
    /// Row values
    pub values: Vec<Value>,
}

impl RecordMessage {
    /// Create a record message.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Number of values in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse from a decoded structure.
    pub fn from_structure(s: Structure) -> Result<Self, BoltError> {
        if s.signature != signature::RECORD {
            return Err(BoltError::protocol("expected RECORD structure"));
        }
        match s.fields.into_iter().next() {
            Some(Value::List(values)) => Ok(Self { values }),
            Some(_) => Err(BoltError::protocol("RECORD payload must be a list")),
            None => Err(BoltError::protocol("RECORD requires a payload")),
        }
    }
}

/// FAILURE: the request failed with a server status code.
#[derive(Debug, Clone)]
pub struct FailureMessage {
    /// Status code, e.g. `Neo.ClientError.Statement.SyntaxError`
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl FailureMessage {
    /// Create a failure message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether the code classifies as a client error.
    pub fn is_client_error(&self) -> bool {
        self.code.starts_with("Neo.ClientError")
    }

    /// Whether the code classifies as transient (retry may succeed).
    pub fn is_transient(&self) -> bool {
        self.code.starts_with("Neo.TransientError")
    }

    /// Convert into the crate error type.
    pub fn into_error(self) -> BoltError {
        BoltError::Server {
            code: self.code,
            message: self.message,
        }
    }

    /// Parse from a decoded structure.
    pub fn from_structure(s: Structure) -> Result<Self, BoltError> {
        if s.signature != signature::FAILURE {
            return Err(BoltError::protocol("expected FAILURE structure"));
        }
        let metadata = match s.fields.into_iter().next() {
            Some(Value::Map(m)) => m,
            _ => return Err(BoltError::protocol("FAILURE requires a metadata map")),
        };
        let code = metadata
            .get("code")
            .and_then(|v| v.as_str())
            .unwrap_or("Neo.DatabaseError.General.UnknownError")
            .to_string();
        let message = metadata
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        Ok(Self { code, message })
    }
}

impl std::fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
