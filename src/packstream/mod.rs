//! PackStream, the binary value format underpinning the Bolt protocol.
//!
//! Every value on a Bolt connection is a PackStream value: protocol messages
//! and graph entities alike ride inside [`Structure`]s distinguished by a
//! signature byte.
//!
//! # Supported types
//!
//! - **Null**, **Boolean**: single-byte markers
//! - **Integer**: smallest of tiny/8/16/32/64-bit two's-complement forms
//! - **Float**: 64-bit IEEE 754, big-endian
//! - **Bytes** (Bolt >= 2.0), **String**: length-prefixed payloads
//! - **List**, **Map**: length-prefixed containers; map keys must be strings
//! - **Structure**: signature byte plus a fixed-arity field list
//!
//! Encoding always picks the smallest size family that fits; decoding
//! accepts any valid family. Map key order is not preserved across a
//! round-trip.

pub mod decoder;
pub mod encoder;
pub mod marker;
pub mod structures;
pub mod types;

pub use decoder::{decode, Decoder};
pub use encoder::{encode, Encoder};
pub use structures::{
    Crs, Date, DateTime, DateTimeZoneId, Duration, LocalDateTime, LocalTime, Node, Path,
    PathSegment, Point, Relationship, Time, UnboundRelationship,
};
pub use types::{Structure, Value};

use std::fmt;

/// Errors produced while encoding or decoding PackStream data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackStreamError {
    /// Input ended in the middle of a value
    UnexpectedEof,
    /// Marker byte does not denote any PackStream type
    UnknownMarker(u8),
    /// String payload was not valid UTF-8
    InvalidUtf8(String),
    /// Map key was not a string; carries the offending type name
    InvalidMapKey(&'static str),
    /// Value exceeds the largest encodable length
    ValueTooLarge(&'static str, usize),
    /// Structure contents did not match the expected layout
    InvalidStructure(String),
    /// Input continued past the end of the decoded value
    TrailingBytes(usize),
}

impl fmt::Display for PackStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackStreamError::UnexpectedEof => write!(f, "unexpected end of PackStream data"),
            PackStreamError::UnknownMarker(m) => write!(f, "unknown PackStream marker 0x{:02X}", m),
            PackStreamError::InvalidUtf8(e) => write!(f, "invalid UTF-8 in string: {}", e),
            PackStreamError::InvalidMapKey(t) => {
                write!(f, "map keys must be strings, got {}", t)
            }
            PackStreamError::ValueTooLarge(what, len) => {
                write!(f, "{} too large to encode: {} bytes", what, len)
            }
            PackStreamError::InvalidStructure(msg) => write!(f, "invalid structure: {}", msg),
            PackStreamError::TrailingBytes(n) => {
                write!(f, "{} trailing bytes after value", n)
            }
        }
    }
}

impl std::error::Error for PackStreamError {}
