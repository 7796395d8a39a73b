//! # Commit and Disconnect Properties
//!
//! Exercises the registry with both production services attached:
//! commits advance every index and every tip in one batch, reorgs
//! rewind them together, and a failed commit leaves nothing behind.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cs_02_kv_store::{KeyValueStore, MemoryStore};
    use cs_03_indexing::{
        ChainBlock, IndexingError, ServiceRegistry, TimestampIndex, TransactionIndex,
        TIMESTAMP_SERVICE_NAME, TRANSACTION_SERVICE_NAME,
    };
    use shared_types::{
        Block, BlockHeader, Hash, Network, OutPoint, Transaction, TxInput, TxOutput, ZERO_HASH,
    };

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn coinbase_tx(tag: u8, outputs: &[u64]) -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TxInput {
                previous_output: OutPoint {
                    txid: ZERO_HASH,
                    vout: u32::MAX,
                },
                script_sig: vec![tag],
                sequence: 0xffff_ffff,
            }],
            outputs: outputs
                .iter()
                .map(|&value| TxOutput {
                    value,
                    script_pubkey: vec![0x51],
                })
                .collect(),
            lock_time: 0,
        }
    }

    fn spending_tx(spends: &[(Hash, u32)], outputs: &[u64]) -> Transaction {
        Transaction {
            version: 1,
            inputs: spends
                .iter()
                .map(|&(txid, vout)| TxInput {
                    previous_output: OutPoint { txid, vout },
                    script_sig: vec![0x02],
                    sequence: 0xffff_ffff,
                })
                .collect(),
            outputs: outputs
                .iter()
                .map(|&value| TxOutput {
                    value,
                    script_pubkey: vec![0x51],
                })
                .collect(),
            lock_time: 0,
        }
    }

    fn block_at(height: u32, prev_hash: Hash, transactions: Vec<Transaction>) -> Block {
        Block {
            header: BlockHeader {
                version: 1,
                prev_hash,
                merkle_root: ZERO_HASH,
                timestamp: 1_700_000_000 + height,
                bits: 0x1d00_ffff,
                nonce: height,
            },
            transactions,
        }
    }

    struct Harness {
        registry: ServiceRegistry,
        timestamps: Arc<TimestampIndex>,
        transactions: Arc<TransactionIndex>,
    }

    impl Harness {
        fn new() -> Self {
            let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
            let registry = ServiceRegistry::open(store.clone(), Network::Regtest).unwrap();
            let timestamps = registry
                .register(TIMESTAMP_SERVICE_NAME, &[], |prefix| {
                    TimestampIndex::new(prefix, store.clone())
                })
                .unwrap();
            let transactions = registry
                .register(
                    TRANSACTION_SERVICE_NAME,
                    &[TIMESTAMP_SERVICE_NAME],
                    |prefix| {
                        Ok(TransactionIndex::new(
                            prefix,
                            store.clone(),
                            timestamps.clone(),
                        ))
                    },
                )
                .unwrap();
            Self {
                registry,
                timestamps,
                transactions,
            }
        }

        fn commit(&self, height: u32, block: Block) -> Result<(), IndexingError> {
            self.registry.commit_block(&ChainBlock::new(height, block))
        }

        fn tip_heights(&self) -> (u32, u32) {
            (
                self.registry
                    .service_tip(TIMESTAMP_SERVICE_NAME)
                    .unwrap()
                    .height,
                self.registry
                    .service_tip(TRANSACTION_SERVICE_NAME)
                    .unwrap()
                    .height,
            )
        }
    }

    // =========================================================================
    // DISCONNECT ROLLS EVERY INDEX BACK TOGETHER
    // =========================================================================

    #[test]
    fn test_reorg_restores_tips_and_unwinds_spends() {
        let harness = Harness::new();

        let coinbase1 = coinbase_tx(1, &[1_000]);
        let funding = coinbase1.txid();
        let block1 = block_at(1, Network::Regtest.genesis_hash(), vec![coinbase1]);
        let hash1 = block1.header.hash();
        harness.commit(1, block1).unwrap();

        // Block 2 spends the funding output; block 3 tries to spend it
        // again, which lands in the double-spend index.
        let spend_a = spending_tx(&[(funding, 0)], &[900]);
        let spend_a_id = spend_a.txid();
        let block2 = block_at(2, hash1, vec![coinbase_tx(2, &[2_000]), spend_a]);
        let hash2 = block2.header.hash();
        harness.commit(2, block2.clone()).unwrap();

        let spend_b = spending_tx(&[(funding, 0)], &[800]);
        let spend_b_id = spend_b.txid();
        let block3 = block_at(3, hash2, vec![coinbase_tx(3, &[3_000]), spend_b]);
        let hash3 = block3.header.hash();
        harness.commit(3, block3.clone()).unwrap();

        let funding_outpoint = OutPoint {
            txid: funding,
            vout: 0,
        };
        assert_eq!(harness.tip_heights(), (3, 3));
        assert_eq!(
            harness
                .transactions
                .double_spend(&funding_outpoint)
                .unwrap()
                .unwrap()
                .spending_txid,
            spend_b_id
        );

        harness
            .registry
            .handle_reorg(
                &hash1,
                &[ChainBlock::new(3, block3), ChainBlock::new(2, block2)],
            )
            .unwrap();

        // Every service tip is back on the common ancestor.
        assert_eq!(harness.tip_heights(), (1, 1));
        assert_eq!(
            harness
                .registry
                .service_tip(TRANSACTION_SERVICE_NAME)
                .unwrap()
                .hash,
            hash1
        );

        // Orphaned records and the spent marker are gone, the surviving
        // block and the double-spend audit trail are not.
        assert!(harness.transactions.transaction(&spend_a_id).unwrap().is_none());
        assert!(harness.transactions.transaction(&spend_b_id).unwrap().is_none());
        assert!(harness.transactions.transaction(&funding).unwrap().is_some());
        assert!(harness
            .transactions
            .spent_by(&funding_outpoint)
            .unwrap()
            .is_none());
        assert_eq!(
            harness
                .transactions
                .double_spend(&funding_outpoint)
                .unwrap()
                .unwrap()
                .spending_txid,
            spend_b_id,
            "double-spend evidence survives the reorg"
        );

        // The timestamp index forgot the orphaned blocks too.
        assert!(harness.timestamps.block_timestamp(&hash2).unwrap().is_none());
        assert!(harness.timestamps.block_timestamp(&hash3).unwrap().is_none());
        assert_eq!(
            harness
                .timestamps
                .block_hashes_by_timestamp(u32::MAX, 0)
                .unwrap(),
            vec![hash1]
        );
    }

    #[test]
    fn test_commit_resumes_cleanly_after_reorg() {
        let harness = Harness::new();

        let coinbase1 = coinbase_tx(1, &[1_000]);
        let funding = coinbase1.txid();
        let block1 = block_at(1, Network::Regtest.genesis_hash(), vec![coinbase1]);
        let hash1 = block1.header.hash();
        harness.commit(1, block1).unwrap();

        let old_spend = spending_tx(&[(funding, 0)], &[900]);
        let block2 = block_at(2, hash1, vec![old_spend]);
        harness.commit(2, block2.clone()).unwrap();
        harness
            .registry
            .handle_reorg(&hash1, &[ChainBlock::new(2, block2)])
            .unwrap();

        // The replacement block spends the same output with a different
        // transaction; the reorg freed the spent marker for it.
        let new_spend = spending_tx(&[(funding, 0)], &[850]);
        let new_spend_id = new_spend.txid();
        let mut replacement = block_at(2, hash1, vec![new_spend]);
        replacement.header.nonce = 99;
        let replacement_hash = replacement.header.hash();
        harness.commit(2, replacement).unwrap();

        let tip = harness.registry.service_tip(TRANSACTION_SERVICE_NAME).unwrap();
        assert_eq!((tip.height, tip.hash), (2, replacement_hash));
        let reference = harness
            .transactions
            .spent_by(&OutPoint {
                txid: funding,
                vout: 0,
            })
            .unwrap()
            .unwrap();
        assert_eq!(reference.spending_txid, new_spend_id);
        assert_eq!(reference.height, 2);
    }

    // =========================================================================
    // SYNTHETIC CLOCK THROUGH THE REGISTRY
    // =========================================================================

    #[test]
    fn test_header_timestamps_are_monotonic_once_indexed() {
        let harness = Harness::new();
        let header_times = [100u32, 100, 50, 200];
        let expected = [100u32, 101, 102, 200];

        let mut prev = Network::Regtest.genesis_hash();
        let mut hashes = Vec::new();
        for (offset, &header_time) in header_times.iter().enumerate() {
            let height = offset as u32 + 1;
            let mut block = block_at(height, prev, vec![coinbase_tx(height as u8, &[10])]);
            block.header.timestamp = header_time;
            prev = block.header.hash();
            hashes.push(prev);
            harness.commit(height, block).unwrap();
        }

        for (hash, want) in hashes.iter().zip(expected) {
            assert_eq!(
                harness.timestamps.block_timestamp(hash).unwrap(),
                Some(want),
                "stored timestamps never repeat or run backwards"
            );
        }
        assert_eq!(
            harness.timestamps.block_hashes_by_timestamp(200, 100).unwrap(),
            hashes,
            "ascending range listing follows commit order"
        );
    }

    // =========================================================================
    // FAILED COMMITS LEAVE NO TRACE
    // =========================================================================

    #[test]
    fn test_commit_with_missing_input_is_retryable() {
        let harness = Harness::new();

        let coinbase1 = coinbase_tx(1, &[1_000]);
        let funding = coinbase1.txid();
        let block1 = block_at(1, Network::Regtest.genesis_hash(), vec![coinbase1]);
        let hash1 = block1.header.hash();

        // Out-of-order arrival: the spend shows up before its funding
        // block has been committed.
        let spend = spending_tx(&[(funding, 0)], &[900]);
        let spend_id = spend.txid();
        let block2 = block_at(2, hash1, vec![spend]);
        let hash2 = block2.header.hash();

        let err = harness.commit(2, block2.clone()).unwrap_err();
        assert!(
            matches!(err, IndexingError::MissingPreviousOutput { .. }),
            "unexpected error: {err}"
        );
        assert!(err.is_retryable(), "missing input clears on retry");
        assert_eq!(harness.tip_heights(), (0, 0), "aborted commit moved a tip");
        assert!(harness.transactions.transaction(&spend_id).unwrap().is_none());

        // Once the funding block lands, the same commit goes through.
        harness.commit(1, block1).unwrap();
        harness.commit(2, block2).unwrap();
        assert_eq!(harness.tip_heights(), (2, 2));
        let tip = harness.registry.service_tip(TIMESTAMP_SERVICE_NAME).unwrap();
        assert_eq!(tip.hash, hash2);
        assert_eq!(
            harness
                .transactions
                .transaction(&spend_id)
                .unwrap()
                .unwrap()
                .input_values,
            vec![1_000]
        );
    }
}
