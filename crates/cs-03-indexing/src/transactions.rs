//! # Transaction Index
//!
//! Per-transaction records plus the spent and double-spend sub-indices.
//!
//! Three tags under this service's prefix:
//!
//! | tag  | key suffix            | value                                |
//! |------|-----------------------|--------------------------------------|
//! | 0x00 | txid                  | bincode [`TransactionRecord`]        |
//! | 0x01 | spent txid ‖ vout BE  | 72-byte [`SpentReference`]           |
//! | 0x02 | spent txid ‖ vout BE  | 72-byte [`SpentReference`]           |
//!
//! A spend whose outpoint already carries a spent entry — persisted, or
//! staged earlier in the same block — lands in the double-spend index
//! (0x02) instead of overwriting the primary entry. Double-spend entries
//! document history: a reorg deletes orphaned primary spends but leaves
//! them in place.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cs_02_kv_store::{BatchOperation, KeyValueStore};
use shared_types::{hash_to_hex, Hash, OutPoint, Transaction};

use crate::error::IndexingError;
use crate::schema::{self, ServicePrefix};
use crate::service::{ChainBlock, IndexService};
use crate::timestamp::TimestampIndex;

/// Name this service registers under.
pub const TRANSACTION_SERVICE_NAME: &str = "transaction";

const TAG_TRANSACTION: u8 = 0x00;
const TAG_SPENT: u8 = 0x01;
const TAG_DOUBLE_SPEND: u8 = 0x02;

/// A confirmed transaction with its confirmation context.
///
/// Input coin values are resolved from the inputs' previous outputs when
/// the block is indexed and stored verbatim, never recomputed. Coinbase
/// inputs resolve to 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub height: u32,
    pub block_hash: Hash,
    pub block_time: u32,
    pub input_values: Vec<u64>,
    pub raw_tx: Vec<u8>,
}

impl TransactionRecord {
    /// Decodes the stored transaction body.
    pub fn transaction(&self) -> Result<Transaction, shared_types::EncodingError> {
        Transaction::from_bytes(&self.raw_tx)
    }
}

/// Who spent an output, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpentReference {
    pub spending_txid: Hash,
    pub input_index: u32,
    pub height: u32,
    pub block_hash: Hash,
}

/// Persisted width: txid ‖ input index BE ‖ height BE ‖ block hash.
const SPENT_REFERENCE_SIZE: usize = 72;

impl SpentReference {
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(SPENT_REFERENCE_SIZE);
        bytes.extend_from_slice(&self.spending_txid);
        bytes.extend_from_slice(&self.input_index.to_be_bytes());
        bytes.extend_from_slice(&self.height.to_be_bytes());
        bytes.extend_from_slice(&self.block_hash);
        bytes
    }

    /// `None` when the value is not exactly 72 bytes.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != SPENT_REFERENCE_SIZE {
            return None;
        }
        let mut spending_txid = [0u8; 32];
        spending_txid.copy_from_slice(&bytes[..32]);
        let mut input_index = [0u8; 4];
        input_index.copy_from_slice(&bytes[32..36]);
        let mut height = [0u8; 4];
        height.copy_from_slice(&bytes[36..40]);
        let mut block_hash = [0u8; 32];
        block_hash.copy_from_slice(&bytes[40..]);
        Some(Self {
            spending_txid,
            input_index: u32::from_be_bytes(input_index),
            height: u32::from_be_bytes(height),
            block_hash,
        })
    }
}

fn outpoint_suffix(outpoint: &OutPoint) -> [u8; 36] {
    let mut suffix = [0u8; 36];
    suffix[..32].copy_from_slice(&outpoint.txid);
    suffix[32..].copy_from_slice(&outpoint.vout.to_be_bytes());
    suffix
}

/// Index service for transaction history and spent-output tracking.
///
/// Holds the timestamp index it depends on: the block time stored in
/// each record is the synthetic timestamp that service committed for the
/// containing block, available mid-commit because dependency order runs
/// the timestamp service first.
pub struct TransactionIndex {
    prefix: ServicePrefix,
    store: Arc<dyn KeyValueStore>,
    timestamps: Arc<TimestampIndex>,
}

impl TransactionIndex {
    pub fn new(
        prefix: ServicePrefix,
        store: Arc<dyn KeyValueStore>,
        timestamps: Arc<TimestampIndex>,
    ) -> Self {
        Self {
            prefix,
            store,
            timestamps,
        }
    }

    fn key(&self, tag: u8, suffix: &[u8]) -> Vec<u8> {
        schema::service_key(self.prefix, tag, suffix)
    }

    /// The stored record for a confirmed transaction.
    pub fn transaction(&self, txid: &Hash) -> Result<Option<TransactionRecord>, IndexingError> {
        let key = self.key(TAG_TRANSACTION, txid);
        match self.store.get(&key)? {
            None => Ok(None),
            Some(bytes) => {
                let record =
                    bincode::deserialize(&bytes).map_err(|e| IndexingError::Corruption {
                        key: hex::encode(&key),
                        reason: format!("transaction record undecodable: {e}"),
                    })?;
                Ok(Some(record))
            }
        }
    }

    /// The primary spend of an output, if this branch has one.
    pub fn spent_by(&self, outpoint: &OutPoint) -> Result<Option<SpentReference>, IndexingError> {
        self.load_reference(TAG_SPENT, outpoint)
    }

    /// The most recent double-spend attempt recorded for an output.
    pub fn double_spend(
        &self,
        outpoint: &OutPoint,
    ) -> Result<Option<SpentReference>, IndexingError> {
        self.load_reference(TAG_DOUBLE_SPEND, outpoint)
    }

    fn load_reference(
        &self,
        tag: u8,
        outpoint: &OutPoint,
    ) -> Result<Option<SpentReference>, IndexingError> {
        let key = self.key(tag, &outpoint_suffix(outpoint));
        match self.store.get(&key)? {
            None => Ok(None),
            Some(bytes) => {
                let reference =
                    SpentReference::decode(&bytes).ok_or_else(|| IndexingError::Corruption {
                        key: hex::encode(&key),
                        reason: format!("spent reference must be 72 bytes, got {}", bytes.len()),
                    })?;
                Ok(Some(reference))
            }
        }
    }

    /// Value of `outpoint`, from a transaction earlier in this block or
    /// from the persisted index.
    fn resolve_input_value(
        &self,
        outpoint: &OutPoint,
        block_txs: &HashMap<Hash, &Transaction>,
    ) -> Result<u64, IndexingError> {
        let output_value = |tx: &Transaction| {
            tx.outputs.get(outpoint.vout as usize).map(|out| out.value)
        };

        let value = match block_txs.get(&outpoint.txid) {
            Some(tx) => output_value(tx),
            None => match self.transaction(&outpoint.txid)? {
                None => None,
                Some(record) => {
                    let tx = record
                        .transaction()
                        .map_err(|e| IndexingError::Corruption {
                            key: hex::encode(self.key(TAG_TRANSACTION, &outpoint.txid)),
                            reason: format!("stored transaction undecodable: {e}"),
                        })?;
                    output_value(&tx)
                }
            },
        };
        value.ok_or_else(|| IndexingError::MissingPreviousOutput {
            outpoint: outpoint.to_string(),
        })
    }
}

impl IndexService for TransactionIndex {
    fn name(&self) -> &'static str {
        TRANSACTION_SERVICE_NAME
    }

    fn on_block(&self, block: &ChainBlock) -> Result<Vec<BatchOperation>, IndexingError> {
        let block_hash = block.hash();
        let block_time = self
            .timestamps
            .block_timestamp(&block_hash)?
            .ok_or_else(|| IndexingError::MissingBlockTimestamp {
                block_hash: hash_to_hex(&block_hash),
            })?;

        let mut ops = Vec::new();
        // Outputs created earlier in this same block are spendable by
        // later transactions, and spends staged in this batch must be
        // visible to the double-spend check before they persist.
        let mut block_txs: HashMap<Hash, &Transaction> = HashMap::new();
        let mut staged_spends: HashSet<[u8; 36]> = HashSet::new();

        for tx in &block.block.transactions {
            let txid = tx.txid();
            let mut input_values = Vec::with_capacity(tx.inputs.len());

            for (input_index, input) in tx.inputs.iter().enumerate() {
                let outpoint = &input.previous_output;
                if outpoint.is_coinbase() {
                    input_values.push(0);
                    continue;
                }
                input_values.push(self.resolve_input_value(outpoint, &block_txs)?);

                let suffix = outpoint_suffix(outpoint);
                let reference = SpentReference {
                    spending_txid: txid,
                    input_index: input_index as u32,
                    height: block.height,
                    block_hash,
                };
                let already_spent = staged_spends.contains(&suffix)
                    || self.store.get(&self.key(TAG_SPENT, &suffix))?.is_some();
                if already_spent {
                    tracing::warn!(
                        "[cs-03] double-spend attempt on {} by {} input {}",
                        outpoint,
                        hash_to_hex(&txid),
                        input_index
                    );
                    ops.push(BatchOperation::put(
                        self.key(TAG_DOUBLE_SPEND, &suffix),
                        reference.encode(),
                    ));
                } else {
                    ops.push(BatchOperation::put(
                        self.key(TAG_SPENT, &suffix),
                        reference.encode(),
                    ));
                    staged_spends.insert(suffix);
                }
            }

            let record = TransactionRecord {
                height: block.height,
                block_hash,
                block_time,
                input_values,
                raw_tx: tx.to_bytes(),
            };
            let value = bincode::serialize(&record).map_err(|e| IndexingError::Serialization {
                reason: format!("transaction record for {}: {e}", hash_to_hex(&txid)),
            })?;
            ops.push(BatchOperation::put(self.key(TAG_TRANSACTION, &txid), value));
            block_txs.insert(txid, tx);
        }
        Ok(ops)
    }

    fn on_reorg(
        &self,
        _ancestor_hash: &Hash,
        orphaned_newest_first: &[ChainBlock],
    ) -> Result<Vec<BatchOperation>, IndexingError> {
        let mut ops = Vec::new();
        for block in orphaned_newest_first {
            for tx in &block.block.transactions {
                let txid = tx.txid();
                ops.push(BatchOperation::delete(self.key(TAG_TRANSACTION, &txid)));

                for input in &tx.inputs {
                    let outpoint = &input.previous_output;
                    if outpoint.is_coinbase() {
                        continue;
                    }
                    // Only the primary spend rolls back, and only when
                    // this orphaned transaction owns it: an entry whose
                    // spender lives in a surviving block stays put, and
                    // double-spend entries are history, not state.
                    if let Some(reference) = self.spent_by(outpoint)? {
                        if reference.spending_txid == txid {
                            ops.push(BatchOperation::delete(
                                self.key(TAG_SPENT, &outpoint_suffix(outpoint)),
                            ));
                        }
                    }
                }
            }
        }
        Ok(ops)
    }
}
