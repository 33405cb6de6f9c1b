//! # DSP-04 Transfer Process
//!
//! Governs access to a resource under a finalized contract agreement.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Refuse transfers whose agreement is not FINALIZED or belongs to
//!   another counterparty
//! - Apply start, suspension, completion and termination messages through
//!   a fixed transition table
//! - Hand the provider's data address to the consumer; moving the data
//!   itself happens elsewhere
//!
//! ## State Machine
//!
//! ```text
//! REQUESTED → STARTED ⇄ SUSPENDED
//!                 any non-terminal → COMPLETED | TERMINATED
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! dsp-04-transfer-process/
//! ├── domain/          # TransferProcess, transition table, outbound messages, errors
//! ├── ports/           # TransferProcessApi, AgreementLookup
//! ├── adapters/        # AgreementLookup over negotiation records
//! └── service.rs       # TransferEngine
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::NegotiationAgreementLookup;
pub use domain::{TransferConfig, TransferError, TransferOutcome, TransferProcess};
pub use ports::{AgreementLookup, AgreementRecord, TransferProcessApi};
pub use service::TransferEngine;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
