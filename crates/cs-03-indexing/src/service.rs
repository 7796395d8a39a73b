//! Index service contract and the chain types the registry feeds it.

use cs_02_kv_store::BatchOperation;
use shared_types::{Block, BlockHeader, Hash};

use crate::error::IndexingError;

/// A block plus the height the ingestion driver assigned it.
///
/// Headers do not carry heights; the driver tracking the chain supplies
/// them, and every index trusts the pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBlock {
    pub height: u32,
    pub block: Block,
}

impl ChainBlock {
    pub fn new(height: u32, block: Block) -> Self {
        Self { height, block }
    }

    pub fn hash(&self) -> Hash {
        self.block.header.hash()
    }

    pub fn header(&self) -> &BlockHeader {
        &self.block.header
    }
}

/// Last block a service has fully applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTip {
    pub height: u32,
    pub hash: Hash,
}

/// Persisted width: 4-byte BE height followed by the 32-byte hash.
const TIP_ENCODED_SIZE: usize = 36;

impl ServiceTip {
    pub fn new(height: u32, hash: Hash) -> Self {
        Self { height, hash }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(TIP_ENCODED_SIZE);
        bytes.extend_from_slice(&self.height.to_be_bytes());
        bytes.extend_from_slice(&self.hash);
        bytes
    }

    /// `None` when the value is not exactly 36 bytes; the caller owns the
    /// key and reports the corruption.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != TIP_ENCODED_SIZE {
            return None;
        }
        let mut height = [0u8; 4];
        height.copy_from_slice(&bytes[..4]);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[4..]);
        Some(Self {
            height: u32::from_be_bytes(height),
            hash,
        })
    }
}

/// One registered index over the chain.
///
/// Services compute mutations; only the registry writes. `on_block` /
/// `on_reorg` return the batch operations the framework commits
/// atomically together with the service's tip update, so an error from
/// either leaves no partial state behind.
///
/// The name a service reports must match the name it was registered
/// under; the registry keys tips and prefixes by the registered name.
pub trait IndexService: Send + Sync {
    /// Stable human-readable identifier.
    fn name(&self) -> &'static str;

    /// Mutations for a newly connected block.
    fn on_block(&self, block: &ChainBlock) -> Result<Vec<BatchOperation>, IndexingError>;

    /// Compensating mutations for blocks being disconnected, newest
    /// first, down to (not including) the common ancestor. The service
    /// must also rewind any internal state to the ancestor.
    fn on_reorg(
        &self,
        ancestor_hash: &Hash,
        orphaned_newest_first: &[ChainBlock],
    ) -> Result<Vec<BatchOperation>, IndexingError>;
}
