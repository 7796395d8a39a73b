//! Indexing error types.

use cs_02_kv_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the registry and the index services.
///
/// A failure inside `commit_block`/`handle_reorg` always aborts the whole
/// block: mutations are computed first and written as one batch, so an
/// error means nothing was persisted. [`IndexingError::is_retryable`]
/// tells the ingestion driver whether re-submitting the same block after
/// clearing the fault can succeed.
#[derive(Debug, Error)]
pub enum IndexingError {
    /// Queried a service name that was never registered.
    #[error("unknown index service '{name}'")]
    UnknownService { name: String },

    /// Registered the same service name twice.
    #[error("index service '{name}' is already registered")]
    DuplicateService { name: String },

    /// A declared dependency was not registered first.
    #[error("service '{service}' depends on '{dependency}' which is not registered")]
    MissingDependency { service: String, dependency: String },

    /// The store was written by an incompatible schema revision.
    #[error("schema version mismatch: store has v{found}, this build expects v{expected}")]
    SchemaVersionMismatch { found: u32, expected: u32 },

    /// Every 2-byte service prefix has been handed out.
    #[error("service prefix space exhausted")]
    PrefixExhausted,

    /// The requested reorg does not line up with the indexed chain.
    #[error("invalid reorg: {reason}")]
    InvalidReorg { reason: String },

    /// An input references an output this index has never seen.
    #[error("previous output {outpoint} not found")]
    MissingPreviousOutput { outpoint: String },

    /// The timestamp service has no entry for a block being indexed.
    #[error("no committed timestamp for block {block_hash}")]
    MissingBlockTimestamp { block_hash: String },

    /// A record could not be serialized for storage.
    #[error("record serialization failed: {reason}")]
    Serialization { reason: String },

    /// A stored value does not decode back into its record shape.
    #[error("corrupt index entry at key {key}: {reason}")]
    Corruption { key: String, reason: String },

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IndexingError {
    /// Whether re-submitting the same block can succeed once the
    /// underlying fault (disk error, missing upstream data) is cleared.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IndexingError::Store(_) | IndexingError::MissingPreviousOutput { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(IndexingError::Store(StoreError::Io {
            message: "disk full".into()
        })
        .is_retryable());
        assert!(IndexingError::MissingPreviousOutput {
            outpoint: "00:0".into()
        }
        .is_retryable());

        assert!(!IndexingError::PrefixExhausted.is_retryable());
        assert!(!IndexingError::SchemaVersionMismatch {
            found: 2,
            expected: 1
        }
        .is_retryable());
        assert!(!IndexingError::InvalidReorg {
            reason: "tip mismatch".into()
        }
        .is_retryable());
    }
}
