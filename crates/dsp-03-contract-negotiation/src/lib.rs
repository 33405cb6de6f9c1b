//! # DSP-03 Contract Negotiation
//!
//! Drives contract negotiations between a consumer and a provider.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Apply inbound protocol messages to negotiation processes through a
//!   fixed, total transition table
//! - Execute local actions of the hosting party and send the matching
//!   protocol message once the new state is durable
//! - Check the terms a consumer proposes against the provider's published
//!   offers before they reach a process
//! - Bound counter-offer loops and expire processes that stopped advancing
//!
//! ## State Machine
//!
//! ```text
//! REQUESTED ⇄ OFFERED → ACCEPTED → AGREED → VERIFIED → FINALIZED
//!     └──────────────────────────↗
//! any non-terminal state → TERMINATED
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! dsp-03-contract-negotiation/
//! ├── domain/          # NegotiationProcess, transition table, outbound messages, errors
//! ├── ports/           # ContractNegotiationApi, OfferEvaluator
//! ├── adapters/        # OfferCatalog
//! └── service.rs       # NegotiationEngine
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::OfferCatalog;
pub use domain::{NegotiationConfig, NegotiationError, NegotiationOutcome, NegotiationProcess};
pub use ports::{ContractNegotiationApi, OfferEvaluator};
pub use service::NegotiationEngine;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
