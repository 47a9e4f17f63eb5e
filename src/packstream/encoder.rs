//! PackStream encoder.

use bytes::{BufMut, BytesMut};
use std::collections::HashMap;

use super::marker::*;
use super::types::{Structure, Value};
use super::PackStreamError;

/// Encoder that writes PackStream values into a reusable byte buffer.
pub struct Encoder {
    buffer: BytesMut,
}

impl Encoder {
    /// Create an encoder with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create an encoder with the given initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Current encoded length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been encoded yet.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Reset the buffer for reuse across messages.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Consume the encoder and take the encoded bytes.
    pub fn into_bytes(self) -> BytesMut {
        self.buffer
    }

    /// Encoded bytes so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Encode one value.
    pub fn encode(&mut self, value: &Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => {
                self.buffer.put_u8(NULL);
                Ok(())
            }
            Value::Boolean(b) => {
                self.buffer.put_u8(if *b { TRUE } else { FALSE });
                Ok(())
            }
            Value::Integer(i) => {
                self.encode_int(*i);
                Ok(())
            }
            Value::Float(f) => {
                self.encode_float(*f);
                Ok(())
            }
            Value::Bytes(b) => self.encode_bytes(b),
            Value::String(s) => self.encode_string(s),
            Value::List(l) => self.encode_list(l),
            Value::Map(m) => self.encode_map(m),
            Value::Structure(s) => self.encode_structure(s),
        }
    }

    /// Encode an integer using the smallest representation that fits.
    pub fn encode_int(&mut self, value: i64) {
        if fits_tiny_int(value) {
            self.buffer.put_u8(value as u8);
        } else if i8::try_from(value).is_ok() {
            self.buffer.put_u8(INT_8);
            self.buffer.put_i8(value as i8);
        } else if i16::try_from(value).is_ok() {
            self.buffer.put_u8(INT_16);
            self.buffer.put_i16(value as i16);
        } else if i32::try_from(value).is_ok() {
            self.buffer.put_u8(INT_32);
            self.buffer.put_i32(value as i32);
        } else {
            self.buffer.put_u8(INT_64);
            self.buffer.put_i64(value);
        }
    }

    /// Encode a float; always 8 bytes big-endian.
    pub fn encode_float(&mut self, value: f64) {
        self.buffer.put_u8(FLOAT_64);
        self.buffer.put_f64(value);
    }

    /// Encode a byte array.
    pub fn encode_bytes(&mut self, value: &[u8]) -> Result<(), PackStreamError> {
        let len = value.len();
        if len <= u8::MAX as usize {
            self.buffer.put_u8(BYTES_8);
            self.buffer.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.buffer.put_u8(BYTES_16);
            self.buffer.put_u16(len as u16);
        } else if len <= u32::MAX as usize {
            self.buffer.put_u8(BYTES_32);
            self.buffer.put_u32(len as u32);
        } else {
            return Err(PackStreamError::ValueTooLarge("bytes", len));
        }
        self.buffer.put_slice(value);
        Ok(())
    }

    /// Encode a UTF-8 string.
    pub fn encode_string(&mut self, value: &str) -> Result<(), PackStreamError> {
        let bytes = value.as_bytes();
        let len = bytes.len();
        if len <= TINY_MAX_LEN {
            self.buffer.put_u8(TINY_STRING_BASE | len as u8);
        } else if len <= u8::MAX as usize {
            self.buffer.put_u8(STRING_8);
            self.buffer.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.buffer.put_u8(STRING_16);
            self.buffer.put_u16(len as u16);
        } else if len <= u32::MAX as usize {
            self.buffer.put_u8(STRING_32);
            self.buffer.put_u32(len as u32);
        } else {
            return Err(PackStreamError::ValueTooLarge("string", len));
        }
        self.buffer.put_slice(bytes);
        Ok(())
    }

    /// Encode a list.
    pub fn encode_list(&mut self, values: &[Value]) -> Result<(), PackStreamError> {
        let len = values.len();
        if len <= TINY_MAX_LEN {
            self.buffer.put_u8(TINY_LIST_BASE | len as u8);
        } else if len <= u8::MAX as usize {
            self.buffer.put_u8(LIST_8);
            self.buffer.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.buffer.put_u8(LIST_16);
            self.buffer.put_u16(len as u16);
        } else if len <= u32::MAX as usize {
            self.buffer.put_u8(LIST_32);
            self.buffer.put_u32(len as u32);
        } else {
            return Err(PackStreamError::ValueTooLarge("list", len));
        }
        for value in values {
            self.encode(value)?;
        }
        Ok(())
    }

    /// Encode a map as alternating key/value pairs.
    pub fn encode_map(&mut self, map: &HashMap<String, Value>) -> Result<(), PackStreamError> {
        let len = map.len();
        if len <= TINY_MAX_LEN {
            self.buffer.put_u8(TINY_MAP_BASE | len as u8);
        } else if len <= u8::MAX as usize {
            self.buffer.put_u8(MAP_8);
            self.buffer.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.buffer.put_u8(MAP_16);
            self.buffer.put_u16(len as u16);
        } else if len <= u32::MAX as usize {
            self.buffer.put_u8(MAP_32);
            self.buffer.put_u32(len as u32);
        } else {
            return Err(PackStreamError::ValueTooLarge("map", len));
        }
        for (key, value) in map {
            self.encode_string(key)?;
            self.encode(value)?;
        }
        Ok(())
    }

    /// Encode a structure: marker, signature byte, then fields.
    pub fn encode_structure(&mut self, s: &Structure) -> Result<(), PackStreamError> {
        let len = s.fields.len();
        if len <= TINY_MAX_LEN {
            self.buffer.put_u8(TINY_STRUCT_BASE | len as u8);
        } else if len <= u8::MAX as usize {
            self.buffer.put_u8(STRUCT_8);
            self.buffer.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.buffer.put_u8(STRUCT_16);
            self.buffer.put_u16(len as u16);
        } else {
            return Err(PackStreamError::ValueTooLarge("structure fields", len));
        }
        self.buffer.put_u8(s.signature);
        for field in &s.fields {
            self.encode(field)?;
        }
        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a single value into a fresh buffer.
pub fn encode(value: &Value) -> Result<BytesMut, PackStreamError> {
    let mut encoder = Encoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}
