//! # Outbound Ports
//!
//! The port the engines persist through. Relational or document adapters live
//! outside this workspace and must keep both lookup paths and the
//! conflict-detection contract.

use crate::domain::{StoreError, StoredProcess};
use async_trait::async_trait;
use shared_types::{ProcessId, Timestamp};

/// Versioned process storage.
#[async_trait]
pub trait ProcessStore<P: StoredProcess>: Send + Sync {
    /// Load by local id.
    async fn load(&self, id: ProcessId) -> Result<P, StoreError>;

    /// Load by the counterparty's id.
    async fn load_by_correlation_id(&self, correlation_id: &str) -> Result<P, StoreError>;

    /// All records carrying or referencing an agreement.
    async fn find_by_agreement_id(&self, agreement_id: &str) -> Result<Vec<P>, StoreError>;

    /// Non-terminal records not modified since `older_than`.
    async fn list_stale(&self, older_than: Timestamp) -> Result<Vec<P>, StoreError>;

    /// Compare-and-swap save.
    ///
    /// Succeeds only when the stored version equals `process.version()`
    /// (or nothing is stored and the version is 0). Returns the new version.
    async fn save(&self, process: &P) -> Result<u64, StoreError>;
}
