//! Ports layer for the message codec.

pub mod outbound;

pub use outbound::{DeliveryError, Transport};
