//! Error types for the peer wire subsystem

use shared_types::EncodingError;
use thiserror::Error;

/// Errors that can occur while framing, encoding, or decoding wire traffic.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed {command} payload: {reason}")]
    MalformedPayload {
        command: &'static str,
        reason: String,
    },

    #[error("unknown command {name:?}")]
    UnknownCommand { name: String },

    #[error("message length {length} exceeds maximum {max}")]
    OversizedMessage { length: u32, max: u32 },

    #[error("checksum mismatch for {command}: header {expected}, payload {computed}")]
    ChecksumMismatch {
        command: &'static str,
        expected: String,
        computed: String,
    },

    #[error("invalid inventory kind {kind}")]
    InvalidInventoryKind { kind: u32 },

    #[error("filter size exceeds maximum: {size} > {max}")]
    FilterTooLarge { size: u64, max: u64 },

    #[error("too many filter hash functions: {count} > {max}")]
    TooManyHashFunctions { count: u32, max: u32 },

    #[error("buffer index {index} out of range (length {length})")]
    IndexOutOfRange { index: usize, length: usize },

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("connection I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl WireError {
    /// Builds the standard payload-decode failure, naming the command.
    pub fn malformed(command: &'static str, reason: impl std::fmt::Display) -> Self {
        WireError::MalformedPayload {
            command,
            reason: reason.to_string(),
        }
    }

    /// Attaches command context to errors raised below the dispatch layer.
    ///
    /// Domain decoders (inventory, bloom, raw byte reads) cannot know which
    /// command they are serving; the payload dispatcher folds their errors
    /// into `MalformedPayload` here so every decode failure names its
    /// command. Errors that already carry context pass through.
    pub(crate) fn with_command(self, command: &'static str) -> Self {
        match self {
            WireError::Encoding(e) => WireError::malformed(command, e),
            WireError::InvalidInventoryKind { kind } => {
                WireError::malformed(command, format!("invalid inventory kind {kind}"))
            }
            WireError::FilterTooLarge { size, max } => {
                WireError::malformed(command, format!("filter size {size} exceeds maximum {max}"))
            }
            WireError::TooManyHashFunctions { count, max } => WireError::malformed(
                command,
                format!("too many filter hash functions: {count} > {max}"),
            ),
            other => other,
        }
    }
}
