//! # Key Schema
//!
//! Every persisted key shares one global keyspace, namespaced as
//! `[2-byte service prefix][1-byte sub-index tag][suffix]` so no two
//! indices can collide and one bounded range scan enumerates exactly one
//! sub-index in key order.
//!
//! Prefix `0x0000` is reserved for the registry's own bookkeeping, which
//! uses ASCII names instead of tag bytes:
//!
//! | key                     | value                              |
//! |-------------------------|------------------------------------|
//! | `version`               | 4-byte BE schema version           |
//! | `tip-<serviceName>`     | 4-byte BE height ‖ 32-byte hash    |
//! | `prefix-next`           | 2-byte BE next unallocated prefix  |
//! | `prefix-<serviceName>`  | 2-byte BE assigned prefix          |

/// Schema revision stamped into every store this crate opens.
pub const SCHEMA_VERSION: u32 = 1;

/// Reserved registry namespace; never allocated to a service.
const RESERVED_PREFIX: [u8; 2] = [0, 0];

/// First prefix handed to a registered service.
pub const FIRST_SERVICE_PREFIX: u16 = 1;

/// A service's 2-byte big-endian key namespace.
///
/// Allocated once by the registry, persisted, and never reused; treat the
/// value as opaque outside tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServicePrefix(u16);

impl ServicePrefix {
    pub fn new(value: u16) -> Self {
        ServicePrefix(value)
    }

    pub fn get(&self) -> u16 {
        self.0
    }

    pub fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        ServicePrefix(u16::from_be_bytes(bytes))
    }
}

/// Builds `[prefix][tag][suffix]`.
pub fn service_key(prefix: ServicePrefix, tag: u8, suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(3 + suffix.len());
    key.extend_from_slice(&prefix.to_bytes());
    key.push(tag);
    key.extend_from_slice(suffix);
    key
}

/// Half-open key range `[start, end)` covering every key of one
/// sub-index.
///
/// For tag `0xff` the range closes at the next service prefix; prefix
/// `0xffff` is never allocated (the counter reports exhaustion first), so
/// the upper bound always exists.
pub fn sub_index_range(prefix: ServicePrefix, tag: u8) -> (Vec<u8>, Vec<u8>) {
    let start = service_key(prefix, tag, &[]);
    let end = match tag.checked_add(1) {
        Some(next_tag) => service_key(prefix, next_tag, &[]),
        None => ServicePrefix(prefix.0.saturating_add(1)).to_bytes().to_vec(),
    };
    (start, end)
}

/// Registry key holding the schema version.
pub fn version_key() -> Vec<u8> {
    reserved_key(b"version")
}

/// Registry key holding one service's persisted tip.
pub fn tip_key(service_name: &str) -> Vec<u8> {
    let mut name = b"tip-".to_vec();
    name.extend_from_slice(service_name.as_bytes());
    reserved_key(&name)
}

/// Registry key holding the next unallocated service prefix.
pub fn prefix_counter_key() -> Vec<u8> {
    reserved_key(b"prefix-next")
}

/// Registry key holding one service's allocated prefix.
pub fn prefix_key(service_name: &str) -> Vec<u8> {
    let mut name = b"prefix-".to_vec();
    name.extend_from_slice(service_name.as_bytes());
    reserved_key(&name)
}

fn reserved_key(name: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + name.len());
    key.extend_from_slice(&RESERVED_PREFIX);
    key.extend_from_slice(name);
    key
}
