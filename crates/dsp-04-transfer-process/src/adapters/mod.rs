//! # Adapters
//!
//! Outbound adapters for the transfer engine.

pub mod negotiation_agreements;

pub use negotiation_agreements::NegotiationAgreementLookup;
