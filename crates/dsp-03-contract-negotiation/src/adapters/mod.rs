//! # Adapters
//!
//! Outbound adapters for the negotiation engine.

pub mod offer_catalog;

pub use offer_catalog::OfferCatalog;
