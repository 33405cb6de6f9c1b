//! # DSP-02 Message Codec
//!
//! Typed Dataspace Protocol messages and their compact JSON-LD form.
//!
//! **Protocol version:** 2025-1
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Decode inbound payloads into [`ProtocolMessage`] values, rejecting
//!   unknown types and missing mandatory members with [`CodecError`].
//! - Encode outbound messages with sorted member order so equal messages
//!   always produce identical bytes (and digests).
//! - Keep unknown members of messages, policies and data addresses so they
//!   round-trip unchanged.
//!
//! The [`Transport`] port through which the engines hand messages to a
//! delivery collaborator is declared here as well, since its currency is
//! [`ProtocolMessage`].
//!
//! ## Module Structure
//!
//! ```text
//! dsp-02-message-codec/
//! ├── domain/          # message structs, envelope, errors, version metadata
//! ├── ports/           # Transport
//! └── codec.rs         # decode / encode / digest
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod domain;
pub mod ports;

pub use codec::{decode, decode_value, digest, encode, encode_message, encode_value};
pub use domain::*;
pub use ports::{DeliveryError, Transport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
