//! # Outbound Ports
//!
//! Delivery of protocol messages to a counterparty. Retries and backoff belong
//! to the implementation, never to the state machines.

use crate::domain::ProtocolMessage;
use async_trait::async_trait;
use shared_types::Role;
use thiserror::Error;

/// Delivery failures reported by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// No response from the counterparty.
    #[error("Counterparty at {address} unreachable: {reason}")]
    Unreachable {
        /// Callback address used
        address: String,
        /// Underlying failure
        reason: String,
    },

    /// Counterparty answered with an error status.
    #[error("Counterparty rejected {message_type} with status {status}")]
    Rejected {
        /// Message that was rejected
        message_type: String,
        /// Status code returned
        status: u16,
        /// Reason code from the error body
        code: Option<String>,
        /// Reason text from the error body
        reason: Option<String>,
    },

    /// Response body could not be decoded.
    #[error("Invalid acknowledgement: {0}")]
    InvalidAck(String),

    /// Message could not be prepared (encoding or token issuance).
    #[error("Failed to prepare message: {0}")]
    Preparation(String),
}

/// Sends a message and returns the counterparty's synchronous reply, if any.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `message` to `counterparty_id` at `counterparty_address`.
    ///
    /// `recipient` is the counterparty's role in the process; it decides which
    /// process id addresses the message on the counterparty's side.
    async fn send(
        &self,
        counterparty_id: &str,
        counterparty_address: &str,
        recipient: Role,
        message: &ProtocolMessage,
    ) -> Result<Option<ProtocolMessage>, DeliveryError>;
}
