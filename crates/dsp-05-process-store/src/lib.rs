//! # DSP-05 Process Store
//!
//! Storage port used by the negotiation and transfer engines.
//!
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Purpose
//!
//! Every engine operation loads a fresh copy of a process, mutates it and
//! writes it back. This crate defines the contract that makes that safe:
//!
//! - lookup by local id and by the counterparty's correlation id
//! - optimistic compare-and-swap on a `version` counter; a stale save fails
//!   with [`StoreError::Conflict`] and the caller retries
//! - [`ProcessLocks`] to serialize handlers of the same process inside one
//!   engine instance, so conflicts only arise across instances
//!
//! ## Module Structure
//!
//! ```text
//! dsp-05-process-store/
//! ├── domain/          # StoredProcess, StoreError
//! ├── ports/           # ProcessStore
//! ├── adapters/        # InMemoryProcessStore
//! └── locking.rs       # per-key async locks
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod locking;
pub mod ports;

pub use adapters::InMemoryProcessStore;
pub use domain::{StoreError, StoredProcess};
pub use locking::{ProcessGuard, ProcessLocks};
pub use ports::ProcessStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
