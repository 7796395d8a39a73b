//! # Inventory-Bearing Payloads
//!
//! inv, getdata, and notfound share one payload shape: a bounded count of
//! 36-byte inventory entries. The three commands differ only in direction
//! of intent (announce, request, deny).

use shared_types::network::MAX_INV_ENTRIES;
use shared_types::{ByteReader, ByteWriter, EncodingError};

use crate::domain::inventory::{InventoryHash, InventoryItem};
use crate::error::WireError;

/// Payload of inv, getdata, and notfound.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InventoryMessage {
    pub items: Vec<InventoryItem>,
}

impl InventoryMessage {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self { items }
    }

    /// Single-entry payload announcing or requesting a transaction.
    pub fn for_transaction(hash: impl InventoryHash) -> Result<Self, EncodingError> {
        Ok(Self::new(vec![InventoryItem::for_transaction(hash)?]))
    }

    /// Single-entry payload announcing or requesting a block.
    pub fn for_block(hash: impl InventoryHash) -> Result<Self, EncodingError> {
        Ok(Self::new(vec![InventoryItem::for_block(hash)?]))
    }

    /// Single-entry payload requesting a filtered (merkle) block.
    pub fn for_filtered_block(hash: impl InventoryHash) -> Result<Self, EncodingError> {
        Ok(Self::new(vec![InventoryItem::for_filtered_block(hash)?]))
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_var_int(self.items.len() as u64);
        for item in &self.items {
            item.encode(writer);
        }
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, WireError> {
        let count = reader.read_var_count(MAX_INV_ENTRIES)?;
        let mut items = Vec::new();
        for _ in 0..count {
            items.push(InventoryItem::decode(reader)?);
        }
        Ok(Self { items })
    }
}
