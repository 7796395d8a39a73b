//! # Consensus Encoding Primitives
//!
//! Byte-level reader/writer for the wire and storage formats: fixed-width
//! little-endian integers (ports are the big-endian exception), variable
//! length integers, and length-prefixed byte strings.
//!
//! Every decoder in the workspace is built on [`ByteReader`]; payload
//! decoders call [`ByteReader::check_finished`] once the structure is fully
//! consumed so that trailing garbage is rejected rather than ignored.

use thiserror::Error;

/// Errors produced while reading or writing consensus bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("unexpected end of input: wanted {wanted} more byte(s), {remaining} remaining")]
    UnexpectedEnd { wanted: usize, remaining: usize },

    #[error("{count} trailing byte(s) after payload")]
    TrailingBytes { count: usize },

    #[error("length {length} exceeds limit {max}")]
    LengthOutOfBounds { length: u64, max: u64 },

    #[error("invalid UTF-8 in variable-length string")]
    InvalidString,

    #[error("invalid hash literal: {literal}")]
    InvalidHashLiteral { literal: String },
}

/// Sequential reader over a borrowed byte slice.
///
/// The reader never copies more than it returns and keeps a cursor into the
/// original slice, so partially decoding a payload leaves the remainder
/// addressable for the caller (the version message's optional trailing relay
/// flag relies on this).
#[derive(Debug)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// True once every byte has been consumed.
    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Fails with [`EncodingError::TrailingBytes`] unless the reader is at
    /// the end of its input.
    pub fn check_finished(&self) -> Result<(), EncodingError> {
        if self.is_finished() {
            Ok(())
        } else {
            Err(EncodingError::TrailingBytes {
                count: self.remaining(),
            })
        }
    }

    /// Takes the next `count` bytes as a borrowed slice.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], EncodingError> {
        if self.remaining() < count {
            return Err(EncodingError::UnexpectedEnd {
                wanted: count,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, EncodingError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, EncodingError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Ports on the wire are the one big-endian integer in the protocol.
    pub fn read_u16_be(&mut self) -> Result<u16, EncodingError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, EncodingError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32_le(&mut self) -> Result<i32, EncodingError> {
        Ok(self.read_u32_le()? as i32)
    }

    pub fn read_u64_le(&mut self) -> Result<u64, EncodingError> {
        let bytes = self.read_bytes(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    pub fn read_i64_le(&mut self) -> Result<i64, EncodingError> {
        Ok(self.read_u64_le()? as i64)
    }

    /// Reads a 32-byte hash in raw (internal) byte order.
    pub fn read_hash(&mut self) -> Result<crate::entities::Hash, EncodingError> {
        let bytes = self.read_bytes(32)?;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(bytes);
        Ok(hash)
    }

    /// Reads a variable-length integer.
    ///
    /// One byte below 0xfd; otherwise a marker byte selects the width:
    /// 0xfd for u16, 0xfe for u32, 0xff for u64, all little-endian.
    pub fn read_var_int(&mut self) -> Result<u64, EncodingError> {
        let first = self.read_u8()?;
        match first {
            0xfd => Ok(u64::from(self.read_u16_le()?)),
            0xfe => Ok(u64::from(self.read_u32_le()?)),
            0xff => self.read_u64_le(),
            value => Ok(u64::from(value)),
        }
    }

    /// Reads a var-int count capped at `max`, for repeated-element payloads.
    pub fn read_var_count(&mut self, max: u64) -> Result<u64, EncodingError> {
        let count = self.read_var_int()?;
        if count > max {
            return Err(EncodingError::LengthOutOfBounds { length: count, max });
        }
        Ok(count)
    }

    /// Reads a var-int length followed by that many raw bytes.
    pub fn read_var_bytes(&mut self) -> Result<Vec<u8>, EncodingError> {
        let length = self.read_var_int()?;
        if length > self.remaining() as u64 {
            return Err(EncodingError::UnexpectedEnd {
                wanted: length as usize,
                remaining: self.remaining(),
            });
        }
        Ok(self.read_bytes(length as usize)?.to_vec())
    }

    /// Reads a var-int length followed by that many UTF-8 bytes.
    pub fn read_var_string(&mut self) -> Result<String, EncodingError> {
        let bytes = self.read_var_bytes()?;
        String::from_utf8(bytes).map_err(|_| EncodingError::InvalidString)
    }

    /// Consumes and returns everything left in the input.
    pub fn read_rest(&mut self) -> Vec<u8> {
        let rest = self.bytes[self.pos..].to_vec();
        self.pos = self.bytes.len();
        rest
    }
}

/// Append-only writer producing a consensus byte string.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_u16_le(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u16_be(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i32_le(&mut self, value: i32) {
        self.put_u32_le(value as u32);
    }

    pub fn put_u64_le(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i64_le(&mut self, value: i64) {
        self.put_u64_le(value as u64);
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a 32-byte hash in raw (internal) byte order.
    pub fn put_hash(&mut self, hash: &crate::entities::Hash) {
        self.buf.extend_from_slice(hash);
    }

    /// Writes a variable-length integer using the smallest encoding.
    pub fn put_var_int(&mut self, value: u64) {
        match value {
            0..=0xfc => self.put_u8(value as u8),
            0xfd..=0xffff => {
                self.put_u8(0xfd);
                self.put_u16_le(value as u16);
            }
            0x1_0000..=0xffff_ffff => {
                self.put_u8(0xfe);
                self.put_u32_le(value as u32);
            }
            _ => {
                self.put_u8(0xff);
                self.put_u64_le(value);
            }
        }
    }

    /// Writes a var-int length prefix followed by the raw bytes.
    pub fn put_var_bytes(&mut self, bytes: &[u8]) {
        self.put_var_int(bytes.len() as u64);
        self.put_bytes(bytes);
    }

    /// Writes a var-int length prefix followed by the UTF-8 bytes.
    pub fn put_var_string(&mut self, value: &str) {
        self.put_var_bytes(value.as_bytes());
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
