//! Domain layer for transfer processes.

pub mod config;
pub mod entities;
pub mod errors;
pub mod outbound;
pub mod transitions;

pub use config::TransferConfig;
pub use entities::{TransferOutcome, TransferProcess};
pub use errors::TransferError;
pub use transitions::Direction;
