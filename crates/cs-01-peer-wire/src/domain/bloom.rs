//! # Bloom Filter Wire Form
//!
//! The filterload payload: a byte-backed bit vector plus the parameters the
//! serving node needs to run the filter. This subsystem transports and
//! bounds-checks the filter; membership testing happens in the SPV layer
//! that owns the hash functions.

use shared_types::network::{MAX_BLOOM_FILTER_SIZE, MAX_BLOOM_HASH_FUNCS};
use shared_types::{ByteReader, ByteWriter, EncodingError};

use crate::error::WireError;

/// Filter update behavior: never add outpoints on a match.
pub const UPDATE_NONE: u8 = 0;
/// Filter update behavior: add every matched outpoint.
pub const UPDATE_ALL: u8 = 1;
/// Filter update behavior: add outpoints only for pay-to-pubkey-like scripts.
pub const UPDATE_P2PUBKEY_ONLY: u8 = 2;

/// A peer-supplied SPV filter in its exact wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    /// The bit vector, byte-packed, least significant bit first.
    pub bits: Vec<u8>,
    /// Number of hash functions the filter was built with.
    pub hash_func_count: u32,
    /// Per-filter random tweak mixed into each hash function.
    pub tweak: u32,
    /// Update behavior flags (`UPDATE_*`).
    pub flags: u8,
}

impl BloomFilter {
    pub fn new(bits: Vec<u8>, hash_func_count: u32, tweak: u32, flags: u8) -> Self {
        Self {
            bits,
            hash_func_count,
            tweak,
            flags,
        }
    }

    /// Wire form: var-int byte length, the bit vector, LE32 hash function
    /// count, LE32 tweak, one flags byte.
    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_var_bytes(&self.bits);
        writer.put_u32_le(self.hash_func_count);
        writer.put_u32_le(self.tweak);
        writer.put_u8(self.flags);
    }

    /// Decodes and bounds-checks a filter.
    ///
    /// A declared bit-vector length that overruns the available bytes is a
    /// malformed payload; an in-bounds declaration larger than the protocol
    /// cap is rejected before any bytes are copied.
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self, WireError> {
        let declared = reader.read_var_int()?;
        if declared > MAX_BLOOM_FILTER_SIZE {
            return Err(WireError::FilterTooLarge {
                size: declared,
                max: MAX_BLOOM_FILTER_SIZE,
            });
        }
        let bits = reader.read_bytes(declared as usize)?.to_vec();

        let hash_func_count = reader.read_u32_le()?;
        if hash_func_count > MAX_BLOOM_HASH_FUNCS {
            return Err(WireError::TooManyHashFunctions {
                count: hash_func_count,
                max: MAX_BLOOM_HASH_FUNCS,
            });
        }

        Ok(Self {
            bits,
            hash_func_count,
            tweak: reader.read_u32_le()?,
            flags: reader.read_u8()?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.bits.len() + 12);
        self.encode(&mut writer);
        writer.into_bytes()
    }

    /// Decodes a standalone filter, rejecting trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let mut reader = ByteReader::new(bytes);
        let filter = Self::decode(&mut reader)?;
        reader.check_finished()?;
        Ok(filter)
    }
}
