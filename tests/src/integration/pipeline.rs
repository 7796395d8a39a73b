//! # Ingestion Pipeline Flows
//!
//! A block travels the whole path a real peer would push it down: framed
//! under the network magic, reassembled from stream chunks, decoded by
//! the payload codec, then committed through the service registry and
//! queried back out of the indices.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cs_01_peer_wire::envelope::{encode_message, MessageFramer};
    use cs_01_peer_wire::messages::{Command, Message};
    use cs_01_peer_wire::PeerConnection;
    use cs_02_kv_store::{KeyValueStore, MemoryStore, RocksDbConfig, RocksDbStore};
    use cs_03_indexing::{
        ChainBlock, ServiceRegistry, TimestampIndex, TransactionIndex, TIMESTAMP_SERVICE_NAME,
        TRANSACTION_SERVICE_NAME,
    };
    use shared_types::{
        Block, BlockHeader, Hash, Network, OutPoint, Transaction, TxInput, TxOutput, ZERO_HASH,
    };
    use tokio::net::TcpListener;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn coinbase_tx(outputs: &[u64]) -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TxInput {
                previous_output: OutPoint {
                    txid: ZERO_HASH,
                    vout: u32::MAX,
                },
                script_sig: vec![0x01],
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

    /// Registry with the two production services wired in dependency
    /// order, over the given store.
    fn open_indexes(
        store: Arc<dyn KeyValueStore>,
    ) -> (ServiceRegistry, Arc<TimestampIndex>, Arc<TransactionIndex>) {
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
        (registry, timestamps, transactions)
    }

    // =========================================================================
    // FRAME → DECODE → COMMIT → QUERY
    // =========================================================================

    #[test]
    fn test_framed_block_lands_in_every_index() {
        let coinbase = coinbase_tx(&[50_000]);
        let coinbase_id = coinbase.txid();
        let block = block_at(1, Network::Regtest.genesis_hash(), vec![coinbase]);
        let block_hash = block.header.hash();

        // Over the wire: frame it, then feed the stream back in two
        // arbitrary chunks.
        let frame = encode_message(Network::Regtest, &Message::Block(block));
        let mut framer = MessageFramer::new(Network::Regtest);
        framer.push(&frame[..10]);
        assert!(framer.next_message().unwrap().is_none());
        framer.push(&frame[10..]);
        let raw = framer.next_message().unwrap().unwrap();
        assert_eq!(raw.command, Command::Block);

        let decoded = match Message::decode_payload(raw.command, &raw.payload).unwrap() {
            Message::Block(block) => block,
            other => panic!("expected a block message, got {}", other.command()),
        };
        assert_eq!(decoded.header.hash(), block_hash, "identity across the wire");

        // Into the indices.
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = Arc::new(
            RocksDbStore::open(RocksDbConfig::for_testing(
                temp_dir.path().to_string_lossy().to_string(),
            ))
            .unwrap(),
        );
        let (registry, timestamps, transactions) = open_indexes(store);
        registry
            .commit_block(&ChainBlock::new(1, decoded))
            .unwrap();

        // And back out.
        let tip = registry.service_tip(TRANSACTION_SERVICE_NAME).unwrap();
        assert_eq!((tip.height, tip.hash), (1, block_hash));

        let ts = timestamps.block_timestamp(&block_hash).unwrap().unwrap();
        assert_eq!(
            timestamps.block_hashes_by_timestamp(ts, ts).unwrap(),
            vec![block_hash]
        );

        let record = transactions.transaction(&coinbase_id).unwrap().unwrap();
        assert_eq!(record.height, 1);
        assert_eq!(record.block_hash, block_hash);
        assert_eq!(record.block_time, ts);
        assert_eq!(record.input_values, vec![0]);
    }

    #[tokio::test]
    async fn test_block_received_from_peer_is_committable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let block = block_at(1, Network::Regtest.genesis_hash(), vec![coinbase_tx(&[1])]);
        let sent_hash = block.header.hash();

        let sender = tokio::spawn(async move {
            let mut connection = PeerConnection::connect(addr, Network::Regtest).await.unwrap();
            connection.send(&Message::Block(block)).await.unwrap();
        });

        let (stream, peer) = listener.accept().await.unwrap();
        let mut connection = PeerConnection::from_stream(stream, peer, Network::Regtest);
        let received = match connection.receive().await.unwrap() {
            Message::Block(block) => block,
            other => panic!("expected a block message, got {}", other.command()),
        };
        sender.await.unwrap();

        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let (registry, timestamps, _) = open_indexes(store);
        registry
            .commit_block(&ChainBlock::new(1, received))
            .unwrap();
        assert!(timestamps.block_timestamp(&sent_hash).unwrap().is_some());
    }

    // =========================================================================
    // RESTART STABILITY
    // =========================================================================

    #[test]
    fn test_indices_survive_store_reopen() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().to_string_lossy().to_string();

        let coinbase = coinbase_tx(&[9_000]);
        let coinbase_id = coinbase.txid();
        let block = block_at(1, Network::Regtest.genesis_hash(), vec![coinbase]);
        let block_hash = block.header.hash();

        {
            let store =
                Arc::new(RocksDbStore::open(RocksDbConfig::for_testing(path.clone())).unwrap());
            let (registry, _, _) = open_indexes(store.clone());
            registry
                .commit_block(&ChainBlock::new(1, block.clone()))
                .unwrap();
            store.close().unwrap();
        }

        // New process: same registrations, same prefixes, data intact.
        let store = Arc::new(RocksDbStore::open(RocksDbConfig::for_testing(path)).unwrap());
        let (registry, timestamps, transactions) = open_indexes(store);

        let tip = registry.service_tip(TIMESTAMP_SERVICE_NAME).unwrap();
        assert_eq!((tip.height, tip.hash), (1, block_hash));
        assert!(timestamps.block_timestamp(&block_hash).unwrap().is_some());
        assert!(transactions.transaction(&coinbase_id).unwrap().is_some());

        // The recovered synthetic clock keeps strictly increasing: a
        // second block with an identical header timestamp advances by 1.
        let ts1 = timestamps.block_timestamp(&block_hash).unwrap().unwrap();
        let mut next = block_at(2, block_hash, vec![]);
        next.header.timestamp = block.header.timestamp;
        let next_hash = next.header.hash();
        registry.commit_block(&ChainBlock::new(2, next)).unwrap();
        assert_eq!(
            timestamps.block_timestamp(&next_hash).unwrap(),
            Some(ts1 + 1)
        );
    }
}
