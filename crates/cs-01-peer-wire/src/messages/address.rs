//! # Peer Address Gossip
//!
//! The addr payload: known peer endpoints stamped with when each was last
//! seen, bounded so one message cannot dump an unlimited address book.

use shared_types::network::MAX_ADDR_ENTRIES;
use shared_types::{ByteReader, ByteWriter, EncodingError};

use crate::messages::version::NetworkAddress;

/// One gossip entry: last-seen time plus the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampedAddress {
    /// Unix time the advertising peer last heard from this endpoint.
    pub time: u32,
    pub address: NetworkAddress,
}

impl TimestampedAddress {
    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_u32_le(self.time);
        self.address.encode(writer);
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            time: reader.read_u32_le()?,
            address: NetworkAddress::decode(reader)?,
        })
    }
}

/// The addr payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddrMessage {
    pub addresses: Vec<TimestampedAddress>,
}

impl AddrMessage {
    pub fn new(addresses: Vec<TimestampedAddress>) -> Self {
        Self { addresses }
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_var_int(self.addresses.len() as u64);
        for entry in &self.addresses {
            entry.encode(writer);
        }
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, EncodingError> {
        let count = reader.read_var_count(MAX_ADDR_ENTRIES)?;
        let mut addresses = Vec::new();
        for _ in 0..count {
            addresses.push(TimestampedAddress::decode(reader)?);
        }
        Ok(Self { addresses })
    }
}
