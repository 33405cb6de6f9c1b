//! Domain layer for the process store.

pub mod entities;
pub mod errors;

pub use entities::StoredProcess;
pub use errors::StoreError;
