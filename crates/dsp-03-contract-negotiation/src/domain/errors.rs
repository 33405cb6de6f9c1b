//! # Domain Errors

use dsp_02_message_codec::{DeliveryError, NegotiationMessageKind};
use dsp_05_process_store::StoreError;
use shared_types::{NegotiationState, PolicyError, ProcessId, Role};
use thiserror::Error;

/// Contract negotiation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    /// Offer or agreement failed semantic validation.
    #[error("Invalid offer: {0}")]
    InvalidOffer(String),

    /// Initial request carries no callback address.
    #[error("Initial contract request has no callbackAddress")]
    MissingCallbackAddress,

    /// Caller is not the recorded counterparty.
    #[error("Identity mismatch: process belongs to {expected}, caller is {actual}")]
    IdentityMismatch {
        /// Recorded counterparty
        expected: String,
        /// Verified caller
        actual: String,
    },

    /// Message kind not allowed from the current state or for this role.
    #[error("Illegal transition: {kind} on {role} process in state {state}")]
    IllegalTransition {
        /// Role of the process
        role: Role,
        /// Current state
        state: NegotiationState,
        /// Rejected message kind
        kind: NegotiationMessageKind,
    },

    /// Message names a counterparty process other than the bound one.
    #[error("Correlation mismatch on {process_id}: bound to {expected}, message carries {actual}")]
    CorrelationMismatch {
        /// Local process
        process_id: ProcessId,
        /// Bound counterparty id
        expected: String,
        /// Id in the message
        actual: String,
    },

    /// Operation not offered to this role.
    #[error("{operation} is not available to the {role} role")]
    RoleNotSupported {
        /// Role requested
        role: Role,
        /// Operation name
        operation: &'static str,
    },

    /// Process does not exist.
    #[error("Negotiation not found: {0}")]
    NotFound(String),

    /// Concurrent modification; retry from a fresh load.
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    /// Storage backend failure.
    #[error("Storage failure: {0}")]
    Storage(String),

    /// State was persisted but the outbound message was not delivered.
    #[error("Delivery for {process_id} failed: {source}")]
    Delivery {
        /// Process whose message was not delivered
        process_id: ProcessId,
        /// Transport failure
        source: DeliveryError,
    },
}

impl NegotiationError {
    /// Whether the caller should retry from a fresh load.
    pub fn is_conflict(&self) -> bool {
        matches!(self, NegotiationError::Conflict(_))
    }

    /// Short label for metrics.
    pub fn reason_label(&self) -> &'static str {
        match self {
            NegotiationError::InvalidOffer(_) => "invalid_offer",
            NegotiationError::MissingCallbackAddress => "missing_callback",
            NegotiationError::IdentityMismatch { .. } => "identity_mismatch",
            NegotiationError::IllegalTransition { .. } => "illegal_transition",
            NegotiationError::CorrelationMismatch { .. } => "correlation_mismatch",
            NegotiationError::RoleNotSupported { .. } => "role_not_supported",
            NegotiationError::NotFound(_) => "not_found",
            NegotiationError::Conflict(_) => "conflict",
            NegotiationError::Storage(_) => "storage",
            NegotiationError::Delivery { .. } => "delivery",
        }
    }
}

impl From<StoreError> for NegotiationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => NegotiationError::NotFound(key),
            StoreError::Conflict { .. } => NegotiationError::Conflict(e.to_string()),
            other => NegotiationError::Storage(other.to_string()),
        }
    }
}

impl From<PolicyError> for NegotiationError {
    fn from(e: PolicyError) -> Self {
        NegotiationError::InvalidOffer(e.to_string())
    }
}
