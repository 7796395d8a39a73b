//! # Reject Payloads
//!
//! A peer's explanation for refusing a message: the offended command, a
//! coded reason, free text, and an opaque tail (typically the hash of the
//! rejected object) whose meaning depends on the code.

use shared_types::{ByteReader, ByteWriter};

use crate::error::WireError;

/// Machine-readable rejection categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RejectCode {
    Malformed = 0x01,
    Invalid = 0x10,
    Obsolete = 0x11,
    Duplicate = 0x12,
    Nonstandard = 0x40,
    Dust = 0x41,
    InsufficientFee = 0x42,
    Checkpoint = 0x43,
}

impl RejectCode {
    pub fn to_wire(self) -> u8 {
        self as u8
    }

    pub fn from_wire(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(RejectCode::Malformed),
            0x10 => Some(RejectCode::Invalid),
            0x11 => Some(RejectCode::Obsolete),
            0x12 => Some(RejectCode::Duplicate),
            0x40 => Some(RejectCode::Nonstandard),
            0x41 => Some(RejectCode::Dust),
            0x42 => Some(RejectCode::InsufficientFee),
            0x43 => Some(RejectCode::Checkpoint),
            _ => None,
        }
    }
}

/// The reject payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectMessage {
    /// Command the peer is rejecting.
    pub message: String,
    pub code: RejectCode,
    /// Human-readable explanation.
    pub reason: String,
    /// Opaque trailing data; consumed whole, never interpreted here.
    pub data: Vec<u8>,
}

impl RejectMessage {
    pub fn new(message: impl Into<String>, code: RejectCode, reason: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            reason: reason.into(),
            data: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_var_string(&self.message);
        writer.put_u8(self.code.to_wire());
        writer.put_var_string(&self.reason);
        writer.put_bytes(&self.data);
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, WireError> {
        let message = reader.read_var_string()?;
        let raw_code = reader.read_u8()?;
        let code = RejectCode::from_wire(raw_code)
            .ok_or_else(|| WireError::malformed("reject", format!("unknown code {raw_code:#04x}")))?;
        let reason = reader.read_var_string()?;
        // Everything after the reason belongs to the rejection verbatim.
        let data = reader.read_rest();
        Ok(Self {
            message,
            code,
            reason,
            data,
        })
    }
}
