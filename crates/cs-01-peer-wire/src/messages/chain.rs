//! # Chain Synchronization Payloads
//!
//! Block locators (getblocks/getheaders), the headers response, and the
//! filtered-block proof (merkleblock).

use shared_types::network::{MAX_HEADERS_PER_MESSAGE, MAX_LOCATOR_HASHES, PROTOCOL_VERSION};
use shared_types::{BlockHeader, ByteReader, ByteWriter, Hash, ZERO_HASH};

use crate::error::WireError;

/// Payload of getblocks and getheaders: a thinning trail of known block
/// ids, newest first, plus a stop hash (zero to ask for as many as allowed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLocator {
    pub version: u32,
    pub locator_hashes: Vec<Hash>,
    pub stop_hash: Hash,
}

impl BlockLocator {
    pub fn new(locator_hashes: Vec<Hash>, stop_hash: Hash) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            locator_hashes,
            stop_hash,
        }
    }

    /// Locator that asks for everything the peer will give after the trail.
    pub fn unbounded(locator_hashes: Vec<Hash>) -> Self {
        Self::new(locator_hashes, ZERO_HASH)
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_u32_le(self.version);
        writer.put_var_int(self.locator_hashes.len() as u64);
        for hash in &self.locator_hashes {
            writer.put_hash(hash);
        }
        writer.put_hash(&self.stop_hash);
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, WireError> {
        let version = reader.read_u32_le()?;
        let count = reader.read_var_count(MAX_LOCATOR_HASHES)?;
        let mut locator_hashes = Vec::new();
        for _ in 0..count {
            locator_hashes.push(reader.read_hash()?);
        }
        Ok(Self {
            version,
            locator_hashes,
            stop_hash: reader.read_hash()?,
        })
    }
}

/// The headers payload: bounded batch of 80-byte headers, each trailed by
/// a transaction count that is always zero in this message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeadersMessage {
    pub headers: Vec<BlockHeader>,
}

impl HeadersMessage {
    pub fn new(headers: Vec<BlockHeader>) -> Self {
        Self { headers }
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_var_int(self.headers.len() as u64);
        for header in &self.headers {
            header.encode(writer);
            // Headers never carry their transactions.
            writer.put_var_int(0);
        }
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, WireError> {
        let count = reader.read_var_count(MAX_HEADERS_PER_MESSAGE)?;
        let mut headers = Vec::new();
        for index in 0..count {
            headers.push(BlockHeader::decode(reader)?);
            let tx_count = reader.read_var_int()?;
            if tx_count != 0 {
                return Err(WireError::malformed(
                    "headers",
                    format!("nonzero transaction count {tx_count} in entry {index}"),
                ));
            }
        }
        Ok(Self { headers })
    }
}

/// The merkleblock payload: a header, the block's total transaction count,
/// and the partial merkle tree (hashes plus traversal flag bits) proving
/// filter-matched transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleBlockMessage {
    pub header: BlockHeader,
    pub total_transactions: u32,
    pub hashes: Vec<Hash>,
    pub flags: Vec<u8>,
}

impl MerkleBlockMessage {
    pub fn encode(&self, writer: &mut ByteWriter) {
        self.header.encode(writer);
        writer.put_u32_le(self.total_transactions);
        writer.put_var_int(self.hashes.len() as u64);
        for hash in &self.hashes {
            writer.put_hash(hash);
        }
        writer.put_var_bytes(&self.flags);
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, WireError> {
        let header = BlockHeader::decode(reader)?;
        let total_transactions = reader.read_u32_le()?;
        let hash_count = reader.read_var_int()?;
        let mut hashes = Vec::new();
        for _ in 0..hash_count {
            hashes.push(reader.read_hash()?);
        }
        Ok(Self {
            header,
            total_transactions,
            hashes,
            flags: reader.read_var_bytes()?,
        })
    }
}
