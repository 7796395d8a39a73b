//! # Key-Value Storage (cs-02)
//!
//! The storage port every index service writes through, plus the two
//! adapters that implement it.
//!
//! ## Architecture
//!
//! - `ports` - The `KeyValueStore` trait, batch operations, scan direction
//! - `adapters/memory` - Ordered in-memory store for unit tests
//! - `adapters/rocksdb` - Embedded RocksDB store for production
//!
//! ## Contract Highlights
//!
//! - All methods take `&self`: a store is shared between index services
//!   behind an `Arc`, and adapters provide their own interior locking.
//! - `write_batch` is atomic: either every operation lands or none does.
//!   Index consistency is built on this guarantee.
//! - `scan` is a bounded range query over `[start, end_exclusive)` in key
//!   order, forward or reverse. Results materialize eagerly; callers keep
//!   ranges narrow (a service prefix spans at most one tag's keyspace).
//! - After `close`, every call reports [`StoreError::Closed`] instead of
//!   touching freed resources.
//!
//! ## Usage
//!
//! ```ignore
//! use cs_02_kv_store::{BatchOperation, KeyValueStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.write_batch(vec![
//!     BatchOperation::put(b"a".to_vec(), b"1".to_vec()),
//!     BatchOperation::delete(b"stale".to_vec()),
//! ])?;
//! ```

pub mod adapters;
pub mod error;
pub mod ports;

pub use adapters::memory::MemoryStore;
pub use adapters::rocksdb::{RocksDbConfig, RocksDbStore};
pub use error::StoreError;
pub use ports::{BatchOperation, KeyValueStore, ScanDirection};
