//! Domain layer for contract negotiation.

pub mod config;
pub mod entities;
pub mod errors;
pub mod outbound;
pub mod transitions;

pub use config::NegotiationConfig;
pub use entities::{NegotiationOutcome, NegotiationProcess};
pub use errors::NegotiationError;
pub use transitions::Direction;
