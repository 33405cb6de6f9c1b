//! Ports for the connector: the wire the transport posts through and the
//! source of data addresses for automatic transfer starts.

pub mod outbound;

pub use outbound::*;
