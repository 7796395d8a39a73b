//! # RocksDB Storage Adapter
//!
//! Production implementation of the KeyValueStore trait.
//!
//! ## Features
//!
//! - Atomic batch writes (WriteBatch)
//! - Snappy compression
//! - Bloom filters for read optimization
//! - Bounded range iteration in both directions
//!
//! ## Configuration
//!
//! Tuned for an indexing workload: mostly-sequential batch writes keyed by
//! short binary prefixes, point reads, and narrow range scans.

use std::sync::Arc;

use parking_lot::RwLock;
use rocksdb::{IteratorMode, Options, ReadOptions, WriteBatch, WriteOptions, DB};

use crate::error::StoreError;
use crate::ports::{BatchOperation, KeyValueStore, ScanDirection};

/// RocksDB configuration for production use
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 256MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 64MB)
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 3)
    pub max_write_buffer_number: i32,
    /// Target file size for level-1 (default: 64MB)
    pub target_file_size_base: u64,
    /// Enable fsync after each write (default: true for durability)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/chainscope".to_string(),
            block_cache_size: 256 * 1024 * 1024, // 256MB
            write_buffer_size: 64 * 1024 * 1024, // 64MB
            max_write_buffer_number: 3,
            target_file_size_base: 64 * 1024 * 1024, // 64MB
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,  // 8MB
            write_buffer_size: 4 * 1024 * 1024, // 4MB
            max_write_buffer_number: 2,
            target_file_size_base: 4 * 1024 * 1024, // 4MB
            sync_writes: false,
        }
    }
}

/// RocksDB-backed key-value store implementing the KeyValueStore trait.
///
/// The handle is `Option<DB>` under the lock so `close` can drop the
/// engine (flushing and releasing the directory lock) while outstanding
/// clones of the `Arc` keep a safe handle that reports `Closed`.
pub struct RocksDbStore {
    db: Arc<RwLock<Option<DB>>>,
    config: RocksDbConfig,
}

impl RocksDbStore {
    /// Open or create a RocksDB database
    pub fn open(config: RocksDbConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        // Performance tuning
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_target_file_size_base(config.target_file_size_base);

        // Compression
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        // Bloom filter for faster lookups
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path).map_err(map_engine_error)?;
        tracing::info!("[cs-02] opened RocksDB at {}", config.path);

        Ok(Self {
            db: Arc::new(RwLock::new(Some(db))),
            config,
        })
    }

    fn write_opts(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }
}

fn map_engine_error(e: rocksdb::Error) -> StoreError {
    match e.kind() {
        rocksdb::ErrorKind::Corruption => StoreError::Corruption {
            reason: e.to_string(),
        },
        _ => StoreError::io(e.to_string()),
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::Closed)?;
        db.get(key).map_err(map_engine_error)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::Closed)?;
        db.put_opt(key, value, &self.write_opts())
            .map_err(map_engine_error)
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::Closed)?;
        db.delete_opt(key, &self.write_opts())
            .map_err(map_engine_error)
    }

    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::Closed)?;

        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    batch.put(&key, &value);
                }
                BatchOperation::Delete { key } => {
                    batch.delete(&key);
                }
            }
        }

        db.write_opt(batch, &self.write_opts())
            .map_err(map_engine_error)
    }

    fn scan(
        &self,
        start: &[u8],
        end_exclusive: &[u8],
        direction: ScanDirection,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::Closed)?;
        if start >= end_exclusive {
            return Ok(Vec::new());
        }

        // Both bounds on the ReadOptions keep the iterator inside
        // [start, end_exclusive) without per-key comparisons here.
        let mut read_opts = ReadOptions::default();
        read_opts.set_iterate_lower_bound(start.to_vec());
        read_opts.set_iterate_upper_bound(end_exclusive.to_vec());
        let mode = match direction {
            ScanDirection::Forward => IteratorMode::Start,
            ScanDirection::Reverse => IteratorMode::End,
        };

        let mut results = Vec::new();
        for item in db.iterator_opt(mode, read_opts) {
            let (key, value) = item.map_err(map_engine_error)?;
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }

    fn close(&self) -> Result<(), StoreError> {
        if self.db.write().take().is_some() {
            tracing::info!("[cs-02] closed RocksDB at {}", self.config.path);
        }
        Ok(())
    }
}
