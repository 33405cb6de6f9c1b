//! # Shared Types Crate
//!
//! Domain model shared by the identity, codec, negotiation, transfer and store
//! crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: process identifiers, roles and lifecycle
//!   states are defined once and used on the wire and in storage alike.
//! - **Opaque Extensions**: policy and data address objects keep unknown
//!   members in an ordered map so they survive a decode/encode cycle.
//! - **Explicit Time**: engines never read the wall clock directly; they are
//!   handed a [`TimeSource`].

pub mod clock;
pub mod entities;
pub mod errors;
pub mod policy;
pub mod states;

pub use clock::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use entities::*;
pub use errors::*;
pub use policy::{Policy, PolicyKind};
pub use states::{NegotiationState, TransferState};
