//! # Store Errors

use shared_types::ProcessId;
use thiserror::Error;

/// Process store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record under the given key.
    #[error("Process not found: {0}")]
    NotFound(String),

    /// The record changed since it was loaded.
    #[error("Concurrent modification of {id}: expected version {expected}, stored {actual}")]
    Conflict {
        /// Process being saved
        id: ProcessId,
        /// Version carried by the caller's copy
        expected: u64,
        /// Version currently stored
        actual: u64,
    },

    /// Another process already owns the correlation id.
    #[error("Correlation id {correlation_id} already bound to {existing}")]
    DuplicateCorrelation {
        /// Counterparty id being indexed
        correlation_id: String,
        /// Process that owns it
        existing: ProcessId,
    },

    /// Backend failure reported by an adapter.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Concurrent modification; the operation may be retried from a fresh load.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
