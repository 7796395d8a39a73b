//! # Inventory Vectors
//!
//! The 36-byte announcement unit carried by inv, getdata, and notfound:
//! a little-endian kind discriminant followed by a raw-order hash.

use shared_types::{hash_from_hex, ByteReader, ByteWriter, EncodingError, Hash};

use crate::error::WireError;

/// Encoded width of one inventory entry.
pub const INVENTORY_ITEM_SIZE: usize = 36;

/// What an inventory entry announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryKind {
    /// Placeholder kind; never requested, tolerated on decode.
    Error,
    Transaction,
    Block,
    /// Block delivered as a merkleblock against the peer's loaded filter.
    FilteredBlock,
}

impl InventoryKind {
    pub fn to_wire(self) -> u32 {
        match self {
            InventoryKind::Error => 0,
            InventoryKind::Transaction => 1,
            InventoryKind::Block => 2,
            InventoryKind::FilteredBlock => 3,
        }
    }

    pub fn from_wire(kind: u32) -> Result<Self, WireError> {
        match kind {
            0 => Ok(InventoryKind::Error),
            1 => Ok(InventoryKind::Transaction),
            2 => Ok(InventoryKind::Block),
            3 => Ok(InventoryKind::FilteredBlock),
            other => Err(WireError::InvalidInventoryKind { kind: other }),
        }
    }
}

/// Hash argument accepted by inventory constructors: either a raw-order
/// hash or a display-order hex string, which is byte-reversed on the way in.
pub trait InventoryHash {
    fn into_raw(self) -> Result<Hash, EncodingError>;
}

impl InventoryHash for Hash {
    fn into_raw(self) -> Result<Hash, EncodingError> {
        Ok(self)
    }
}

impl InventoryHash for &str {
    fn into_raw(self) -> Result<Hash, EncodingError> {
        hash_from_hex(self)
    }
}

impl InventoryHash for &String {
    fn into_raw(self) -> Result<Hash, EncodingError> {
        hash_from_hex(self)
    }
}

/// One announced object: kind plus raw-order hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryItem {
    pub kind: InventoryKind,
    pub hash: Hash,
}

impl InventoryItem {
    pub fn new(kind: InventoryKind, hash: impl InventoryHash) -> Result<Self, EncodingError> {
        Ok(Self {
            kind,
            hash: hash.into_raw()?,
        })
    }

    pub fn for_transaction(hash: impl InventoryHash) -> Result<Self, EncodingError> {
        Self::new(InventoryKind::Transaction, hash)
    }

    pub fn for_block(hash: impl InventoryHash) -> Result<Self, EncodingError> {
        Self::new(InventoryKind::Block, hash)
    }

    pub fn for_filtered_block(hash: impl InventoryHash) -> Result<Self, EncodingError> {
        Self::new(InventoryKind::FilteredBlock, hash)
    }

    /// Fixed-width wire form: LE32 kind, then the 32 raw hash bytes.
    /// No length prefix; repetition counts live in the enclosing payload.
    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_u32_le(self.kind.to_wire());
        writer.put_hash(&self.hash);
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, WireError> {
        let kind = InventoryKind::from_wire(reader.read_u32_le()?)?;
        Ok(Self {
            kind,
            hash: reader.read_hash()?,
        })
    }
}
