//! # Timestamp Index
//!
//! Bidirectional block-hash ↔ synthetic-timestamp mapping.
//!
//! Header timestamps may repeat or regress, so the committed value is
//! `max(last_committed + 1, header.timestamp)`: synthetic timestamps
//! strictly increase along the canonical chain, which keeps the
//! timestamp→hash keys collision-free and range-scannable in commit
//! order. The tie-break can drift ahead of wall-clock time on a run of
//! non-increasing headers; that is accepted behavior, required for
//! unique ordered keys.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use cs_02_kv_store::{BatchOperation, KeyValueStore, ScanDirection};
use shared_types::{hash_to_hex, Hash};

use crate::error::IndexingError;
use crate::schema::{self, ServicePrefix};
use crate::service::{ChainBlock, IndexService, ServiceTip};

/// Name this service registers under.
pub const TIMESTAMP_SERVICE_NAME: &str = "timestamp";

/// Sub-index tags: hash → 4-byte BE timestamp, and the reverse.
const TAG_HASH_TO_TIMESTAMP: u8 = 0x00;
const TAG_TIMESTAMP_TO_HASH: u8 = 0x01;

// SAFETY: 10 is non-zero, compile-time constant
const TIMESTAMP_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(n) => n,
    None => unreachable!(),
};

struct TimestampState {
    last_committed: u32,
    /// Recent hash→timestamp pairs. Purely an optimization: entries for
    /// a block mid-commit are served from here before the batch lands,
    /// and any miss falls through to the store.
    cache: LruCache<Hash, u32>,
}

/// Index service mapping block hashes to strictly increasing synthetic
/// timestamps and back.
pub struct TimestampIndex {
    prefix: ServicePrefix,
    store: Arc<dyn KeyValueStore>,
    state: Mutex<TimestampState>,
}

impl TimestampIndex {
    /// Builds the index, recovering `last_committed` from the persisted
    /// tip: a fresh index starts at 0, a restarted one resumes from the
    /// timestamp recorded for the tip block.
    pub fn new(
        prefix: ServicePrefix,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, IndexingError> {
        let index = Self {
            prefix,
            store,
            state: Mutex::new(TimestampState {
                last_committed: 0,
                cache: LruCache::new(TIMESTAMP_CACHE_SIZE),
            }),
        };

        let tip_key = schema::tip_key(TIMESTAMP_SERVICE_NAME);
        if let Some(bytes) = index.store.get(&tip_key)? {
            let tip = ServiceTip::decode(&bytes).ok_or_else(|| IndexingError::Corruption {
                key: hex::encode(&tip_key),
                reason: format!("tip value must be 36 bytes, got {}", bytes.len()),
            })?;
            let mut state = index.state.lock();
            match index.lookup_timestamp(&mut state, &tip.hash)? {
                Some(ts) => state.last_committed = ts,
                // A default tip at height 0 predates this service's first
                // commit; a higher tip with no timestamp entry cannot
                // happen under atomic commits.
                None if tip.height == 0 => {}
                None => {
                    return Err(IndexingError::Corruption {
                        key: hex::encode(index.hash_key(&tip.hash)),
                        reason: format!(
                            "tip block {} at height {} has no timestamp entry",
                            hash_to_hex(&tip.hash),
                            tip.height
                        ),
                    });
                }
            }
            drop(state);
        }
        Ok(index)
    }

    fn hash_key(&self, hash: &Hash) -> Vec<u8> {
        schema::service_key(self.prefix, TAG_HASH_TO_TIMESTAMP, hash)
    }

    fn ts_key(&self, timestamp: u32) -> Vec<u8> {
        schema::service_key(self.prefix, TAG_TIMESTAMP_TO_HASH, &timestamp.to_be_bytes())
    }

    /// The synthetic timestamp committed for a block, if indexed.
    pub fn block_timestamp(&self, hash: &Hash) -> Result<Option<u32>, IndexingError> {
        let mut state = self.state.lock();
        self.lookup_timestamp(&mut state, hash)
    }

    fn lookup_timestamp(
        &self,
        state: &mut TimestampState,
        hash: &Hash,
    ) -> Result<Option<u32>, IndexingError> {
        if let Some(ts) = state.cache.get(hash) {
            return Ok(Some(*ts));
        }
        let key = self.hash_key(hash);
        match self.store.get(&key)? {
            None => Ok(None),
            Some(bytes) => {
                let raw: [u8; 4] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| IndexingError::Corruption {
                        key: hex::encode(&key),
                        reason: format!("timestamp value must be 4 bytes, got {}", bytes.len()),
                    })?;
                let ts = u32::from_be_bytes(raw);
                state.cache.put(*hash, ts);
                Ok(Some(ts))
            }
        }
    }

    /// Block hashes with synthetic timestamps in `[low, high]`, ascending.
    ///
    /// The store range is half-open, so the upper bound is the high key
    /// extended by one zero byte: the smallest key greater than it.
    pub fn block_hashes_by_timestamp(
        &self,
        high: u32,
        low: u32,
    ) -> Result<Vec<Hash>, IndexingError> {
        if low > high {
            return Ok(Vec::new());
        }
        let start = self.ts_key(low);
        let mut end = self.ts_key(high);
        end.push(0x00);

        let entries = self.store.scan(&start, &end, ScanDirection::Forward)?;
        let mut hashes = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let hash: Hash =
                value
                    .as_slice()
                    .try_into()
                    .map_err(|_| IndexingError::Corruption {
                        key: hex::encode(&key),
                        reason: format!("block hash value must be 32 bytes, got {}", value.len()),
                    })?;
            hashes.push(hash);
        }
        Ok(hashes)
    }
}

impl IndexService for TimestampIndex {
    fn name(&self) -> &'static str {
        TIMESTAMP_SERVICE_NAME
    }

    fn on_block(&self, block: &ChainBlock) -> Result<Vec<BatchOperation>, IndexingError> {
        let mut state = self.state.lock();
        // saturating: after ~4 billion drift steps the clock pins at
        // u32::MAX rather than wrapping below committed keys.
        let ts = state
            .last_committed
            .saturating_add(1)
            .max(block.header().timestamp);
        let hash = block.hash();

        state.last_committed = ts;
        state.cache.put(hash, ts);

        Ok(vec![
            BatchOperation::put(self.hash_key(&hash), ts.to_be_bytes()),
            BatchOperation::put(self.ts_key(ts), hash),
        ])
    }

    fn on_reorg(
        &self,
        ancestor_hash: &Hash,
        orphaned_newest_first: &[ChainBlock],
    ) -> Result<Vec<BatchOperation>, IndexingError> {
        let mut state = self.state.lock();
        let mut ops = Vec::with_capacity(orphaned_newest_first.len() * 2);

        for block in orphaned_newest_first {
            let hash = block.hash();
            let ts = self
                .lookup_timestamp(&mut state, &hash)?
                .ok_or_else(|| IndexingError::Corruption {
                    key: hex::encode(self.hash_key(&hash)),
                    reason: format!(
                        "orphaned block {} has no timestamp entry",
                        hash_to_hex(&hash)
                    ),
                })?;
            ops.push(BatchOperation::delete(self.hash_key(&hash)));
            ops.push(BatchOperation::delete(self.ts_key(ts)));
            state.cache.pop(&hash);
        }

        // 0 when the ancestor predates this index (unindexed genesis):
        // the next commit restarts the synthetic clock from the header.
        state.last_committed = self
            .lookup_timestamp(&mut state, ancestor_hash)?
            .unwrap_or(0);
        Ok(ops)
    }
}
