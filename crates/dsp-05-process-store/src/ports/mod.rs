//! Ports layer for the process store.

pub mod outbound;

pub use outbound::ProcessStore;
