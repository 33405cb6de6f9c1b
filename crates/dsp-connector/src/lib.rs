//! # DSP Connector
//!
//! Wires the identity verifier, the message codec and both protocol engines
//! into one participant and answers protocol requests.
//!
//! **Protocol version:** 2025-1
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - [`DspConnector::handle`] takes an [`Endpoint`], the `Authorization`
//!   header and the body, and returns a [`DspResponse`] (status + JSON).
//! - [`DspTransport`] implements the engines' outbound `Transport` over a
//!   [`WireClient`], signing a token for every counterparty.
//! - Optional automation confirms agreements and starts transfers on spawned
//!   tokio tasks.
//!
//! The HTTP server and client are left to the embedding application; they
//! only need to map routes with [`Endpoint::parse`] and implement
//! [`WireClient`].
//!
//! ## Module Structure
//!
//! ```text
//! dsp-connector/
//! ├── config.rs        # ConnectorConfig, AutomationConfig, from_env, validate
//! ├── error.rs         # ConnectorError, status and reason code mapping
//! ├── endpoint.rs      # Endpoint routing table
//! ├── ports/           # WireClient, DataAddressProvider
//! ├── adapters/        # DspTransport
//! ├── automation.rs    # follow-up delivery and automatic steps
//! └── connector.rs     # DspConnector
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod automation;
pub mod config;
pub mod connector;
pub mod endpoint;
pub mod error;
pub mod ports;

pub use adapters::DspTransport;
pub use automation::{negotiation_action, should_start, NegotiationAction};
pub use config::{AutomationConfig, ConnectorConfig};
pub use connector::{ConnectorPorts, DspConnector, DspResponse};
pub use endpoint::{Endpoint, ProcessKind};
pub use error::ConnectorError;
pub use ports::{DataAddressProvider, WireClient, WireError, WireRequest, WireResponse};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
