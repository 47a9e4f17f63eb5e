//! PackStream decoder.

use bytes::Buf;
use std::collections::HashMap;

use super::marker::*;
use super::types::{Structure, Value};
use super::PackStreamError;

/// Preallocation cap for length-prefixed containers. Lengths come off the
/// wire, so capacity is clamped until elements actually arrive.
const PREALLOC_LIMIT: usize = 1024;

/// Decoder that reads PackStream values from a byte slice.
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Create a decoder over the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Whether all input has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> Result<Value, PackStreamError> {
        let marker = self.read_u8()?;
        match marker {
            // Tiny ints occupy both ends of the byte range; everything else
            // sits in 0x80..=0xEF.
            0x00..=0x7F => Ok(Value::Integer(marker as i64)),
            0xF0..=0xFF => Ok(Value::Integer(marker as i8 as i64)),

            0x80..=0x8F => self.read_string(tiny_len(marker)),
            0x90..=0x9F => self.read_list(tiny_len(marker)),
            0xA0..=0xAF => self.read_map(tiny_len(marker)),
            0xB0..=0xBF => self.read_structure(tiny_len(marker)),

            NULL => Ok(Value::Null),
            TRUE => Ok(Value::Boolean(true)),
            FALSE => Ok(Value::Boolean(false)),

            FLOAT_64 => Ok(Value::Float(self.read_f64()?)),

            INT_8 => Ok(Value::Integer(self.read_u8()? as i8 as i64)),
            INT_16 => Ok(Value::Integer(self.read_i16()? as i64)),
            INT_32 => Ok(Value::Integer(self.read_i32()? as i64)),
            INT_64 => Ok(Value::Integer(self.read_i64()?)),

            BYTES_8 => {
                let len = self.read_u8()? as usize;
                self.read_bytes_value(len)
            }
            BYTES_16 => {
                let len = self.read_u16()? as usize;
                self.read_bytes_value(len)
            }
            BYTES_32 => {
                let len = self.read_u32()? as usize;
                self.read_bytes_value(len)
            }

            STRING_8 => {
                let len = self.read_u8()? as usize;
                self.read_string(len)
            }
            STRING_16 => {
                let len = self.read_u16()? as usize;
                self.read_string(len)
            }
            STRING_32 => {
                let len = self.read_u32()? as usize;
                self.read_string(len)
            }

            LIST_8 => {
                let len = self.read_u8()? as usize;
                self.read_list(len)
            }
            LIST_16 => {
                let len = self.read_u16()? as usize;
                self.read_list(len)
            }
            LIST_32 => {
                let len = self.read_u32()? as usize;
                self.read_list(len)
            }

            MAP_8 => {
                let len = self.read_u8()? as usize;
                self.read_map(len)
            }
            MAP_16 => {
                let len = self.read_u16()? as usize;
                self.read_map(len)
            }
            MAP_32 => {
                let len = self.read_u32()? as usize;
                self.read_map(len)
            }

            STRUCT_8 => {
                let len = self.read_u8()? as usize;
                self.read_structure(len)
            }
            STRUCT_16 => {
                let len = self.read_u16()? as usize;
                self.read_structure(len)
            }

            _ => Err(PackStreamError::UnknownMarker(marker)),
        }
    }

    fn read_bytes_value(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let bytes = self.read_slice(len)?;
        Ok(Value::Bytes(bytes.to_vec()))
    }

    fn read_string(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let bytes = self.read_slice(len)?;
        let s = std::str::from_utf8(bytes)
            .map_err(|e| PackStreamError::InvalidUtf8(e.to_string()))?;
        Ok(Value::String(s.to_string()))
    }

    fn read_list(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let mut items = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        for _ in 0..len {
            items.push(self.decode()?);
        }
        Ok(Value::List(items))
    }

    fn read_map(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let mut map = HashMap::with_capacity(len.min(PREALLOC_LIMIT));
        for _ in 0..len {
            let key = match self.decode()? {
                Value::String(s) => s,
                other => {
                    return Err(PackStreamError::InvalidMapKey(other.type_name()));
                }
            };
            let value = self.decode()?;
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }

    fn read_structure(&mut self, field_count: usize) -> Result<Value, PackStreamError> {
        let signature = self.read_u8()?;
        let mut fields = Vec::with_capacity(field_count.min(PREALLOC_LIMIT));
        for _ in 0..field_count {
            fields.push(self.decode()?);
        }
        Ok(Value::Structure(Structure::new(signature, fields)))
    }

    fn read_u8(&mut self) -> Result<u8, PackStreamError> {
        if self.remaining() < 1 {
            return Err(PackStreamError::UnexpectedEof);
        }
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    fn read_u16(&mut self) -> Result<u16, PackStreamError> {
        self.check(2)?;
        let value = (&self.data[self.pos..]).get_u16();
        self.pos += 2;
        Ok(value)
    }

    fn read_i16(&mut self) -> Result<i16, PackStreamError> {
        self.check(2)?;
        let value = (&self.data[self.pos..]).get_i16();
        self.pos += 2;
        Ok(value)
    }

    fn read_u32(&mut self) -> Result<u32, PackStreamError> {
        self.check(4)?;
        let value = (&self.data[self.pos..]).get_u32();
        self.pos += 4;
        Ok(value)
    }

    fn read_i32(&mut self) -> Result<i32, PackStreamError> {
        self.check(4)?;
        let value = (&self.data[self.pos..]).get_i32();
        self.pos += 4;
        Ok(value)
    }

    fn read_i64(&mut self) -> Result<i64, PackStreamError> {
        self.check(8)?;
        let value = (&self.data[self.pos..]).get_i64();
        self.pos += 8;
        Ok(value)
    }

    fn read_f64(&mut self) -> Result<f64, PackStreamError> {
        self.check(8)?;
        let value = (&self.data[self.pos..]).get_f64();
        self.pos += 8;
        Ok(value)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], PackStreamError> {
        self.check(len)?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn check(&self, needed: usize) -> Result<(), PackStreamError> {
        if self.remaining() < needed {
            Err(PackStreamError::UnexpectedEof)
        } else {
            Ok(())
        }
    }
}

/// Decode exactly one value from `data`.
pub fn decode(data: &[u8]) -> Result<Value, PackStreamError> {
    let mut decoder = Decoder::new(data);
    let value = decoder.decode()?;
    if !decoder.is_empty() {
        return Err(PackStreamError::TrailingBytes(decoder.remaining()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_one(data: &[u8]) -> Value {
        decode(data).unwrap()
    }

    #[test]
    fn test_decode_null_and_bool() {
        assert!(decode_one(&[0xC0]).is_null());
        assert_eq!(decode_one(&[0xC3]), Value::Boolean(true));
        assert_eq!(decode_one(&[0xC2]), Value::Boolean(false));
    }

    #[test]
    fn test_decode_tiny_int() {
        assert_eq!(decode_one(&[0x2A]), Value::Integer(42));
        assert_eq!(decode_one(&[0xFF]), Value::Integer(-1));
        assert_eq!(decode_one(&[0x7F]), Value::Integer(127));
        assert_eq!(decode_one(&[0xF0]), Value::Integer(-16));
        assert_eq!(decode_one(&[0x00]), Value::Integer(0));
    }

    #[test]
    fn test_decode_int_families() {
        assert_eq!(decode_one(&[0xC8, 0xEF]), Value::Integer(-17));
        assert_eq!(decode_one(&[0xC9, 0x03, 0xE8]), Value::Integer(1000));
        assert_eq!(
            decode_one(&[0xCA, 0x00, 0x01, 0x86, 0xA0]),
            Value::Integer(100_000)
        );
        assert_eq!(
            decode_one(&[0xCB, 0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
            Value::Integer(i64::MAX)
        );
    }

    #[test]
    fn test_decode_oversized_family_accepted() {
        // Decoders accept any valid size family regardless of the value.
        assert_eq!(decode_one(&[0xC9, 0x00, 0x01]), Value::Integer(1));
        assert_eq!(
            decode_one(&[0xD0, 0x02, b'h', b'i']),
            Value::String("hi".into())
        );
        assert_eq!(
            decode_one(&[0xD4, 0x01, 0x05]),
            Value::List(vec![Value::Integer(5)])
        );
    }

    #[test]
    fn test_decode_float() {
        let data = [0xC1, 0x3F, 0xF0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(decode_one(&data), Value::Float(1.0));
    }

    #[test]
    fn test_decode_strings() {
        assert_eq!(decode_one(&[0x80]), Value::String("".into()));
        assert_eq!(
            decode_one(&[0x85, b'h', b'e', b'l', b'l', b'o']),
            Value::String("hello".into())
        );
    }

    #[test]
    fn test_decode_bytes() {
        assert_eq!(
            decode_one(&[0xCC, 0x03, 1, 2, 3]),
            Value::Bytes(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_decode_list() {
        assert_eq!(decode_one(&[0x90]), Value::List(vec![]));
        assert_eq!(
            decode_one(&[0x93, 1, 2, 3]),
            Value::List(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3)
            ])
        );
    }

    #[test]
    fn test_decode_map() {
        let value = decode_one(&[0xA1, 0x81, b'a', 0x01]);
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("a"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_decode_map_rejects_non_string_key() {
        // Map of one entry with an integer key
        let err = decode(&[0xA1, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, PackStreamError::InvalidMapKey("Integer")));
    }

    #[test]
    fn test_decode_structure() {
        let value = decode_one(&[0xB3, 0x4E, 0x01, 0x90, 0xA0]);
        let s = value.as_structure().unwrap();
        assert_eq!(s.signature, 0x4E);
        assert_eq!(s.fields.len(), 3);
        assert_eq!(s.fields[0], Value::Integer(1));
    }

    #[test]
    fn test_decode_unknown_marker() {
        for marker in [0xC4u8, 0xC5, 0xC6, 0xC7, 0xCF, 0xD3, 0xD7, 0xDB, 0xDE, 0xDF] {
            let err = decode(&[marker]).unwrap_err();
            assert!(
                matches!(err, PackStreamError::UnknownMarker(m) if m == marker),
                "marker 0x{:02X} should be rejected",
                marker
            );
        }
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(
            decode(&[0xC9]).unwrap_err(),
            PackStreamError::UnexpectedEof
        ));
        assert!(matches!(
            decode(&[0x85, b'h', b'i']).unwrap_err(),
            PackStreamError::UnexpectedEof
        ));
        assert!(matches!(
            decode(&[0x92, 0x01]).unwrap_err(),
            PackStreamError::UnexpectedEof
        ));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = decode(&[0x82, 0xFF, 0xFE]).unwrap_err();
        assert!(matches!(err, PackStreamError::InvalidUtf8(_)));
    }

    #[test]
    fn test_decode_trailing_bytes_rejected() {
        let err = decode(&[0x01, 0x02]).unwrap_err();
        assert!(matches!(err, PackStreamError::TrailingBytes(1)));
    }

    #[test]
    fn test_decode_nested() {
        let data = [
            0x91, // list of 1
            0xA1, // map of 1
            0x81, b'x', // key "x"
            0x05, // value 5
        ];
        let value = decode_one(&data);
        let list = value.as_list().unwrap();
        let map = list[0].as_map().unwrap();
        assert_eq!(map.get("x"), Some(&Value::Integer(5)));
    }

    #[test]
    fn test_decoder_position() {
        let data = [0x01, 0x02];
        let mut decoder = Decoder::new(&data);
        assert_eq!(decoder.position(), 0);
        assert_eq!(decoder.remaining(), 2);
        decoder.decode().unwrap();
        assert_eq!(decoder.position(), 1);
        assert!(!decoder.is_empty());
        decoder.decode().unwrap();
        assert!(decoder.is_empty());
    }
}
