//! Storage error types.

use thiserror::Error;

/// Errors surfaced by [`KeyValueStore`](crate::ports::KeyValueStore)
/// implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store was closed; no further operations are possible.
    #[error("store is closed")]
    Closed,

    /// The underlying engine failed to read or write.
    #[error("storage I/O error: {message}")]
    Io { message: String },

    /// The engine reported on-disk corruption.
    #[error("storage corruption: {reason}")]
    Corruption { reason: String },
}

impl StoreError {
    pub(crate) fn io(message: impl Into<String>) -> Self {
        StoreError::Io {
            message: message.into(),
        }
    }
}
