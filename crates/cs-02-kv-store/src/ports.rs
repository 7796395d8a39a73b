//! # Storage Port
//!
//! Abstract interface over an ordered key-value engine.
//!
//! Production: `RocksDbStore` (adapters/rocksdb.rs)
//! Testing: `MemoryStore` (adapters/memory.rs)

use crate::error::StoreError;

/// One operation inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }

    /// The key this operation touches.
    pub fn key(&self) -> &[u8] {
        match self {
            BatchOperation::Put { key, .. } => key,
            BatchOperation::Delete { key } => key,
        }
    }
}

/// Key order for range scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// Ascending key order, starting at the range's lower bound.
    Forward,
    /// Descending key order, starting just below the range's upper bound.
    Reverse,
}

/// Abstract interface for ordered key-value database operations.
///
/// Implementations are shared across threads behind an `Arc`, so every
/// method takes `&self` and the adapter synchronizes internally.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Put a single key-value pair.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Delete a key. Deleting an absent key succeeds.
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch succeed, or NONE are applied.
    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<(), StoreError>;

    /// Collect all entries with keys in `[start, end_exclusive)`, ordered
    /// by `direction`. An inverted range yields no entries.
    fn scan(
        &self,
        start: &[u8],
        end_exclusive: &[u8],
        direction: ScanDirection,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    /// Release the underlying resources. Every later call on this store
    /// reports [`StoreError::Closed`]. Closing twice is a no-op.
    fn close(&self) -> Result<(), StoreError>;
}
