//! Adapters implementing engine ports on top of the connector's ports.

pub mod transport;

pub use transport::DspTransport;
