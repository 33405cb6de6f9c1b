//! # Stored Process Contract
//!
//! What the store needs to know about a record to index and version it.

use shared_types::{ProcessId, Timestamp};

/// A process record the store can persist.
///
/// `version` is 0 for a record that was never saved and is advanced by the
/// store on every successful save.
pub trait StoredProcess: Clone + Send + Sync + 'static {
    /// Local process id.
    fn process_id(&self) -> ProcessId;

    /// Counterparty's id for the same process, once known.
    fn correlation_id(&self) -> Option<&str>;

    /// Agreement this record carries or references.
    fn agreement_id(&self) -> Option<&str>;

    /// Version the record was loaded at.
    fn version(&self) -> u64;

    /// Overwrite the version after a save.
    fn set_version(&mut self, version: u64);

    /// Time of the last state change.
    fn last_modified(&self) -> Timestamp;

    /// Record reached a final state.
    fn is_terminal(&self) -> bool;
}
