//! Adapters for the process store port.

pub mod memory;

pub use memory::InMemoryProcessStore;
