//! # Core Domain Entities
//!
//! Defines the chain entities and their consensus serialization.
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `BlockHeader`, `Transaction`
//! - **Spend Graph**: `OutPoint`, `TxInput`, `TxOutput`
//!
//! ## Byte Order
//!
//! Hashes are held in raw (internal) byte order everywhere in memory and on
//! every wire/storage surface. The reversed, display-order form exists only
//! at the hex boundary: [`hash_to_hex`] / [`hash_from_hex`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::encoding::{ByteReader, ByteWriter, EncodingError};

// =============================================================================
// CLUSTER A: HASHES
// =============================================================================

/// A 32-byte hash in raw (internal) byte order.
pub type Hash = [u8; 32];

/// The all-zero hash: coinbase previous-output id and locator stop marker.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Double SHA-256, the protocol's id and checksum function.
pub fn double_sha256(bytes: &[u8]) -> Hash {
    let first = Sha256::digest(bytes);
    let second = Sha256::digest(first);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&second);
    hash
}

/// Renders a hash in display order (byte-reversed hex), the form block
/// explorers and RPC interfaces print.
pub fn hash_to_hex(hash: &Hash) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}

/// Parses a display-order hex string into a raw-order hash.
pub fn hash_from_hex(literal: &str) -> Result<Hash, EncodingError> {
    let invalid = || EncodingError::InvalidHashLiteral {
        literal: literal.to_string(),
    };
    let bytes = hex::decode(literal).map_err(|_| invalid())?;
    if bytes.len() != 32 {
        return Err(invalid());
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    hash.reverse();
    Ok(hash)
}

// =============================================================================
// CLUSTER B: THE SPEND GRAPH
// =============================================================================

/// Reference to a specific output of a specific transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Id of the transaction holding the output.
    pub txid: Hash,
    /// Index of the output within that transaction.
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Hash, vout: u32) -> Self {
        Self { txid, vout }
    }

    /// The sentinel outpoint a coinbase input carries: zero txid, max vout.
    pub fn is_coinbase(&self) -> bool {
        self.txid == ZERO_HASH && self.vout == u32::MAX
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_hash(&self.txid);
        writer.put_u32_le(self.vout);
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            txid: reader.read_hash()?,
            vout: reader.read_u32_le()?,
        })
    }
}

impl std::fmt::Display for OutPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", hash_to_hex(&self.txid), self.vout)
    }
}

/// One input of a transaction: the outpoint it spends plus unlock data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Output being consumed (sentinel for coinbase inputs).
    pub previous_output: OutPoint,
    /// Unlocking script; consensus validity is out of scope here.
    pub script_sig: Vec<u8>,
    /// Sequence field (relative locktime / RBF signaling).
    pub sequence: u32,
}

impl TxInput {
    /// True for the synthetic input that mints a block subsidy.
    pub fn is_coinbase(&self) -> bool {
        self.previous_output.is_coinbase()
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        self.previous_output.encode(writer);
        writer.put_var_bytes(&self.script_sig);
        writer.put_u32_le(self.sequence);
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            previous_output: OutPoint::decode(reader)?,
            script_sig: reader.read_var_bytes()?,
            sequence: reader.read_u32_le()?,
        })
    }
}

/// One output of a transaction: an amount locked by a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Amount in base units (satoshis).
    pub value: u64,
    /// Locking script.
    pub script_pubkey: Vec<u8>,
}

impl TxOutput {
    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_u64_le(self.value);
        writer.put_var_bytes(&self.script_pubkey);
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            value: reader.read_u64_le()?,
            script_pubkey: reader.read_var_bytes()?,
        })
    }
}

/// A transaction in the legacy (pre-witness) consensus serialization.
///
/// The id of a transaction is the double SHA-256 of exactly these bytes, so
/// the indexer persists and re-hashes the same form it decodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_i32_le(self.version);
        writer.put_var_int(self.inputs.len() as u64);
        for input in &self.inputs {
            input.encode(writer);
        }
        writer.put_var_int(self.outputs.len() as u64);
        for output in &self.outputs {
            output.encode(writer);
        }
        writer.put_u32_le(self.lock_time);
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, EncodingError> {
        let version = reader.read_i32_le()?;
        let input_count = reader.read_var_int()?;
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            inputs.push(TxInput::decode(reader)?);
        }
        let output_count = reader.read_var_int()?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            outputs.push(TxOutput::decode(reader)?);
        }
        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time: reader.read_u32_le()?,
        })
    }

    /// Consensus serialization of the whole transaction.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.encode(&mut writer);
        writer.into_bytes()
    }

    /// Decodes a standalone transaction, rejecting trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        let mut reader = ByteReader::new(bytes);
        let tx = Self::decode(&mut reader)?;
        reader.check_finished()?;
        Ok(tx)
    }

    /// Transaction id: double SHA-256 of the consensus serialization.
    pub fn txid(&self) -> Hash {
        double_sha256(&self.to_bytes())
    }

    /// True when the sole input is the coinbase sentinel.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }
}

// =============================================================================
// CLUSTER C: THE CHAIN
// =============================================================================

/// An 80-byte block header.
///
/// Field widths and order are fixed by consensus; the block id is the double
/// SHA-256 of this 80-byte form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    /// Id of the parent block (chain linkage).
    pub prev_hash: Hash,
    /// Merkle root over the block's transaction ids.
    pub merkle_root: Hash,
    /// Miner-declared unix time, unordered across neighbors.
    pub timestamp: u32,
    /// Compact difficulty target.
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    /// Serialized width of every header.
    pub const ENCODED_SIZE: usize = 80;

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_i32_le(self.version);
        writer.put_hash(&self.prev_hash);
        writer.put_hash(&self.merkle_root);
        writer.put_u32_le(self.timestamp);
        writer.put_u32_le(self.bits);
        writer.put_u32_le(self.nonce);
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            version: reader.read_i32_le()?,
            prev_hash: reader.read_hash()?,
            merkle_root: reader.read_hash()?,
            timestamp: reader.read_u32_le()?,
            bits: reader.read_u32_le()?,
            nonce: reader.read_u32_le()?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(Self::ENCODED_SIZE);
        self.encode(&mut writer);
        writer.into_bytes()
    }

    /// Block id: double SHA-256 of the 80 header bytes.
    pub fn hash(&self) -> Hash {
        double_sha256(&self.to_bytes())
    }
}

/// A full block: header plus transactions in consensus order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn encode(&self, writer: &mut ByteWriter) {
        self.header.encode(writer);
        writer.put_var_int(self.transactions.len() as u64);
        for tx in &self.transactions {
            tx.encode(writer);
        }
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, EncodingError> {
        let header = BlockHeader::decode(reader)?;
        let tx_count = reader.read_var_int()?;
        let mut transactions = Vec::new();
        for _ in 0..tx_count {
            transactions.push(Transaction::decode(reader)?);
        }
        Ok(Self {
            header,
            transactions,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.encode(&mut writer);
        writer.into_bytes()
    }

    /// Decodes a standalone block, rejecting trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        let mut reader = ByteReader::new(bytes);
        let block = Self::decode(&mut reader)?;
        reader.check_finished()?;
        Ok(block)
    }

    /// Block id, taken from the header.
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The mainnet genesis header, field by field.
    fn genesis_header() -> BlockHeader {
        BlockHeader {
            version: 1,
            prev_hash: ZERO_HASH,
            merkle_root: hash_from_hex(
                "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b",
            )
            .unwrap(),
            timestamp: 1_231_006_505,
            bits: 0x1d00_ffff,
            nonce: 2_083_236_893,
        }
    }

    // ========== Test Group 1: Hash Helpers ==========

    #[test]
    fn test_hex_round_trip_reverses_byte_order() {
        let display = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";
        let hash = hash_from_hex(display).unwrap();
        // Raw order puts the low bytes first; display order ends in the
        // leading zeros of the proof-of-work.
        assert_eq!(hash[31], 0x00);
        assert_eq!(hash[0], 0x6f);
        assert_eq!(hash_to_hex(&hash), display);
    }

    #[test]
    fn test_hash_from_hex_rejects_bad_literals() {
        assert!(hash_from_hex("zz").is_err(), "non-hex must fail");
        assert!(hash_from_hex("aabb").is_err(), "short literal must fail");
    }

    // ========== Test Group 2: Header Encoding ==========

    #[test]
    fn test_genesis_header_serializes_to_known_bytes() {
        let header = genesis_header();
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), BlockHeader::ENCODED_SIZE);
        assert_eq!(
            hex::encode(&bytes),
            "0100000000000000000000000000000000000000000000000000000000000000\
             000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa\
             4b1e5e4a29ab5f49ffff001d1dac2b7c"
        );
    }

    #[test]
    fn test_genesis_header_hashes_to_known_id() {
        let header = genesis_header();
        assert_eq!(
            hash_to_hex(&header.hash()),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
    }

    #[test]
    fn test_header_round_trip() {
        let header = genesis_header();
        let bytes = header.to_bytes();
        let mut reader = ByteReader::new(&bytes);
        let decoded = BlockHeader::decode(&mut reader).unwrap();
        assert!(reader.is_finished());
        assert_eq!(decoded, header);
    }

    // ========== Test Group 3: Transactions ==========

    fn sample_transaction() -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TxInput {
                previous_output: OutPoint::new([0x11; 32], 0),
                script_sig: vec![0x51],
                sequence: 0xffff_ffff,
            }],
            outputs: vec![
                TxOutput {
                    value: 5_000_000_000,
                    script_pubkey: vec![0x51],
                },
                TxOutput {
                    value: 42,
                    script_pubkey: vec![],
                },
            ],
            lock_time: 0,
        }
    }

    #[test]
    fn test_transaction_round_trip() {
        let tx = sample_transaction();
        let decoded = Transaction::from_bytes(&tx.to_bytes()).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_transaction_rejects_trailing_bytes() {
        let mut bytes = sample_transaction().to_bytes();
        bytes.push(0x00);
        assert_eq!(
            Transaction::from_bytes(&bytes).unwrap_err(),
            EncodingError::TrailingBytes { count: 1 }
        );
    }

    #[test]
    fn test_txid_is_double_sha256_of_serialization() {
        let tx = sample_transaction();
        assert_eq!(tx.txid(), double_sha256(&tx.to_bytes()));
    }

    #[test]
    fn test_coinbase_detection() {
        let mut tx = sample_transaction();
        assert!(!tx.is_coinbase());

        tx.inputs = vec![TxInput {
            previous_output: OutPoint::new(ZERO_HASH, u32::MAX),
            script_sig: vec![0x04, 0xff, 0xff, 0x00, 0x1d],
            sequence: 0xffff_ffff,
        }];
        assert!(tx.is_coinbase());

        // A zero txid with an in-range vout is a real outpoint, not coinbase.
        tx.inputs[0].previous_output.vout = 0;
        assert!(!tx.is_coinbase());
    }

    // ========== Test Group 4: Blocks ==========

    #[test]
    fn test_block_round_trip() {
        let block = Block {
            header: genesis_header(),
            transactions: vec![sample_transaction()],
        };
        let decoded = Block::from_bytes(&block.to_bytes()).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.hash(), block.header.hash());
    }

    #[test]
    fn test_block_decode_truncated_transaction_fails() {
        let block = Block {
            header: genesis_header(),
            transactions: vec![sample_transaction()],
        };
        let bytes = block.to_bytes();
        assert!(matches!(
            Block::from_bytes(&bytes[..bytes.len() - 2]).unwrap_err(),
            EncodingError::UnexpectedEnd { .. }
        ));
    }
}
