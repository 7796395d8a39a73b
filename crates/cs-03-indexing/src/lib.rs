//! # Indexing Service Framework (cs-03)
//!
//! Block indices over one shared key-value store, partitioned by service
//! prefix and committed atomically per block.
//!
//! ## Architecture
//!
//! - `schema` - Global key layout: `[2-byte prefix][1-byte tag][suffix]`,
//!   plus the registry's reserved `0x0000` namespace
//! - `service` - The `IndexService` trait and the chain types it consumes
//! - `registry` - Prefix allocation, dependency-ordered registration,
//!   atomic block commit and reorg handling
//! - `timestamp` - Block-hash ↔ synthetic-timestamp index
//! - `transactions` - Transaction records, spent and double-spend indices
//!
//! ## Commit Model
//!
//! Services never write. `on_block`/`on_reorg` return mutations, and the
//! registry applies every service's mutations plus every tip update as a
//! single atomic batch — readers observe whole blocks or nothing, and a
//! failed commit is safely retryable.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use cs_03_indexing::{
//!     ServiceRegistry, TimestampIndex, TransactionIndex,
//!     TIMESTAMP_SERVICE_NAME, TRANSACTION_SERVICE_NAME,
//! };
//!
//! let registry = ServiceRegistry::open(store.clone(), network)?;
//! let timestamps = registry.register(TIMESTAMP_SERVICE_NAME, &[], |prefix| {
//!     TimestampIndex::new(prefix, store.clone())
//! })?;
//! let transactions = registry.register(
//!     TRANSACTION_SERVICE_NAME,
//!     &[TIMESTAMP_SERVICE_NAME],
//!     |prefix| Ok(TransactionIndex::new(prefix, store.clone(), timestamps.clone())),
//! )?;
//!
//! registry.commit_block(&block)?;
//! let record = transactions.transaction(&txid)?;
//! ```

pub mod error;
pub mod registry;
pub mod schema;
pub mod service;
pub mod timestamp;
pub mod transactions;

pub use error::IndexingError;
pub use registry::ServiceRegistry;
pub use schema::{ServicePrefix, SCHEMA_VERSION};
pub use service::{ChainBlock, IndexService, ServiceTip};
pub use timestamp::{TimestampIndex, TIMESTAMP_SERVICE_NAME};
pub use transactions::{
    SpentReference, TransactionIndex, TransactionRecord, TRANSACTION_SERVICE_NAME,
};
