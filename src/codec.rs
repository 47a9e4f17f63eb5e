//! Chunked transport framing.
//!
//! Each message travels as a sequence of chunks: a 16-bit big-endian length
//! prefix followed by that many payload bytes, terminated by a zero-length
//! chunk. A receiver accumulates chunk payloads until the terminator, then
//! decodes exactly one PackStream value from the whole buffer. Senders may
//! re-chunk a payload freely; zero-length message boundaries with no
//! preceding payload are keep-alive noise and are skipped.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::BoltError;
use crate::packstream::{decode, encode, Value};

/// Largest chunk emitted by the encoder (the u16 prefix caps it anyway).
pub const MAX_CHUNK_SIZE: usize = 16384;

/// Message terminator: a zero-length chunk.
pub const END_MARKER: [u8; 2] = [0x00, 0x00];

/// Default cap on a single reassembled message.
const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Codec framing PackStream values into chunked messages.
#[derive(Debug)]
pub struct ChunkCodec {
    /// Upper bound on a reassembled message
    max_message_size: usize,
    /// Accumulates chunk payloads until the terminator arrives
    message_buffer: BytesMut,
}

impl ChunkCodec {
    /// Create a codec with the default message size limit.
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Create a codec with a custom message size limit.
    pub fn with_max_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            message_buffer: BytesMut::with_capacity(4096),
        }
    }

    fn write_chunked(&self, payload: &[u8], dst: &mut BytesMut) {
        dst.reserve(payload.len() + 2 * (payload.len() / MAX_CHUNK_SIZE + 2));
        for chunk in payload.chunks(MAX_CHUNK_SIZE) {
            dst.put_u16(chunk.len() as u16);
            dst.put_slice(chunk);
        }
        dst.put_slice(&END_MARKER);
    }
}

impl Default for ChunkCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkCodec {
    type Item = Value;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if src.len() < 2 {
                return Ok(None);
            }
            let chunk_size = u16::from_be_bytes([src[0], src[1]]) as usize;

            if chunk_size == 0 {
                src.advance(2);
                if self.message_buffer.is_empty() {
                    // NOOP chunk, keep scanning
                    continue;
                }
                let message = self.message_buffer.split();
                let value = decode(&message)?;
                return Ok(Some(value));
            }

            if src.len() < 2 + chunk_size {
                return Ok(None);
            }

            if self.message_buffer.len() + chunk_size > self.max_message_size {
                return Err(BoltError::MessageTooLarge {
                    size: self.message_buffer.len() + chunk_size,
                    limit: self.max_message_size,
                });
            }

            src.advance(2);
            self.message_buffer.extend_from_slice(&src[..chunk_size]);
            src.advance(chunk_size);
        }
    }
}

impl<'a> Encoder<&'a Value> for ChunkCodec {
    type Error = BoltError;

    fn encode(&mut self, item: &Value, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = encode(item)?;
        self.write_chunked(&payload, dst);
        Ok(())
    }
}
