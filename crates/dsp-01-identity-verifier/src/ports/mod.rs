//! Ports layer for identity verification.

pub mod inbound;
pub mod outbound;

pub use inbound::IdentityVerificationApi;
pub use outbound::{DidDocumentFetcher, KeyResolutionError, KeyResolver};
