//! # Domain Errors

use dsp_02_message_codec::{DeliveryError, TransferMessageKind};
use dsp_05_process_store::StoreError;
use shared_types::{NegotiationState, ProcessId, Role, TransferState};
use thiserror::Error;

/// Transfer process errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Referenced agreement is unknown or its negotiation is not FINALIZED.
    #[error("Agreement {agreement_id} is not finalized (negotiation state: {state:?})")]
    AgreementNotFinalized {
        /// Referenced agreement
        agreement_id: String,
        /// State of the owning negotiation, if one was found
        state: Option<NegotiationState>,
    },

    /// Caller or counterparty is not the party the process or agreement belongs to.
    #[error("Identity mismatch: expected {expected}, got {actual}")]
    IdentityMismatch {
        /// Recorded counterparty
        expected: String,
        /// Presented identity
        actual: String,
    },

    /// Message kind not allowed from the current state or for this role.
    #[error("Illegal transition: {kind} on {role} transfer in state {state}")]
    IllegalTransition {
        /// Role of the process
        role: Role,
        /// Current state
        state: TransferState,
        /// Rejected message kind
        kind: TransferMessageKind,
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
    #[error("Transfer not found: {0}")]
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

impl TransferError {
    /// Whether the caller should retry from a fresh load.
    pub fn is_conflict(&self) -> bool {
        matches!(self, TransferError::Conflict(_))
    }

    /// Short label for metrics.
    pub fn reason_label(&self) -> &'static str {
        match self {
            TransferError::AgreementNotFinalized { .. } => "agreement_not_finalized",
            TransferError::IdentityMismatch { .. } => "identity_mismatch",
            TransferError::IllegalTransition { .. } => "illegal_transition",
            TransferError::CorrelationMismatch { .. } => "correlation_mismatch",
            TransferError::RoleNotSupported { .. } => "role_not_supported",
            TransferError::NotFound(_) => "not_found",
            TransferError::Conflict(_) => "conflict",
            TransferError::Storage(_) => "storage",
            TransferError::Delivery { .. } => "delivery",
        }
    }
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => TransferError::NotFound(key),
            StoreError::Conflict { .. } => TransferError::Conflict(e.to_string()),
            other => TransferError::Storage(other.to_string()),
        }
    }
}
