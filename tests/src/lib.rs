//! # Dataspace Protocol Test Suite
//!
//! End-to-end flows between connectors talking over an in-process wire.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # LoopbackWire, Dataspace, Participant
//! └── integration/      # Cross-connector flows
//!     ├── negotiation_flows.rs
//!     ├── transfer_flows.rs
//!     └── resilience.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dsp-tests
//! cargo test -p dsp-tests integration::resilience::
//! ```

#![allow(dead_code)]

#[cfg(test)]
pub mod harness;
pub mod integration;
