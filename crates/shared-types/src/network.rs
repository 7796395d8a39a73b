//! # Network Parameters
//!
//! Per-network protocol constants: envelope magic, genesis ids, default
//! ports, and the hard bounds the codecs enforce. Components receive a
//! [`Network`] value at construction; there is no process-wide default.

use crate::entities::Hash;

/// Mainnet genesis id, raw byte order.
/// Display: 000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f
const MAINNET_GENESIS: Hash = [
    0x6f, 0xe2, 0x8c, 0x0a, 0xb6, 0xf1, 0xb3, 0x72, 0xc1, 0xa6, 0xa2, 0x46, 0xae, 0x63, 0xf7,
    0x4f, 0x93, 0x1e, 0x83, 0x65, 0xe1, 0x5a, 0x08, 0x9c, 0x68, 0xd6, 0x19, 0x00, 0x00, 0x00,
    0x00, 0x00,
];

/// Testnet genesis id, raw byte order.
/// Display: 000000000933ea01ad0ee984209779baaec3ced90fa3f408719526f8d77f4943
const TESTNET_GENESIS: Hash = [
    0x43, 0x49, 0x7f, 0xd7, 0xf8, 0x26, 0x95, 0x71, 0x08, 0xf4, 0xa3, 0x0f, 0xd9, 0xce, 0xc3,
    0xae, 0xba, 0x79, 0x97, 0x20, 0x84, 0xe9, 0x0e, 0xad, 0x01, 0xea, 0x33, 0x09, 0x00, 0x00,
    0x00, 0x00,
];

/// Regtest genesis id, raw byte order.
/// Display: 0f9188f13cb7b2c71f2a335e3a4fc328bf5beb436012afca590b1a11466e2206
const REGTEST_GENESIS: Hash = [
    0x06, 0x22, 0x6e, 0x46, 0x11, 0x1a, 0x0b, 0x59, 0xca, 0xaf, 0x12, 0x60, 0x43, 0xeb, 0x5b,
    0xbf, 0x28, 0xc3, 0x4f, 0x3a, 0x5e, 0x33, 0x2a, 0x1f, 0xc7, 0xb2, 0xb7, 0x3c, 0xf1, 0x88,
    0x91, 0x0f,
];

/// Protocol version this node speaks (sendheaders/sendcmpct era).
pub const PROTOCOL_VERSION: u32 = 70_015;

/// Service bit: node serves the full chain.
pub const NODE_NETWORK: u64 = 1;
/// Service bit: node answers bloom-filtered requests.
pub const NODE_BLOOM: u64 = 1 << 2;
/// Service bit: node relays witness data.
pub const NODE_WITNESS: u64 = 1 << 3;

/// Service bitmask this node advertises by default.
pub const DEFAULT_SERVICES: u64 = NODE_NETWORK | NODE_BLOOM | NODE_WITNESS;

/// Hard cap on a framed message's payload length.
pub const MAX_MESSAGE_SIZE: u32 = 32 * 1024 * 1024;

/// Most inventory entries one inv/getdata/notfound payload may carry.
pub const MAX_INV_ENTRIES: u64 = 50_000;

/// Most locator hashes one getblocks/getheaders payload may carry.
pub const MAX_LOCATOR_HASHES: u64 = 500;

/// Most headers one headers payload may carry.
pub const MAX_HEADERS_PER_MESSAGE: u64 = 2_000;

/// Most address entries one addr payload may carry.
pub const MAX_ADDR_ENTRIES: u64 = 1_000;

/// Largest accepted bloom filter bit vector, in bytes.
pub const MAX_BLOOM_FILTER_SIZE: u64 = 36_000;

/// Most hash functions a bloom filter may declare.
pub const MAX_BLOOM_HASH_FUNCS: u32 = 50;

/// Largest data element accepted by filteradd.
pub const MAX_FILTER_ADD_SIZE: u64 = 520;

/// User agent advertised in version handshakes, `/name:version/` form.
pub fn user_agent() -> String {
    format!("/chainscope:{}/", env!("CARGO_PKG_VERSION"))
}

/// The chain a node instance is speaking to.
///
/// Magic bytes separate the networks on the wire; genesis ids anchor the
/// per-service tip defaults in the indexing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    /// Envelope magic prefix for this network.
    pub fn magic(&self) -> [u8; 4] {
        match self {
            Network::Mainnet => [0xf9, 0xbe, 0xb4, 0xd9],
            Network::Testnet => [0x0b, 0x11, 0x09, 0x07],
            Network::Regtest => [0xfa, 0xbf, 0xb5, 0xda],
        }
    }

    /// Default peer port for this network.
    pub fn default_port(&self) -> u16 {
        match self {
            Network::Mainnet => 8333,
            Network::Testnet => 18333,
            Network::Regtest => 18444,
        }
    }

    /// Genesis block id in raw byte order.
    pub fn genesis_hash(&self) -> Hash {
        match self {
            Network::Mainnet => MAINNET_GENESIS,
            Network::Testnet => TESTNET_GENESIS,
            Network::Regtest => REGTEST_GENESIS,
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        };
        f.write_str(name)
    }
}
