//! # Connector Errors
//!
//! Everything a protocol request can fail with, and the status code and
//! reason code each failure is answered with.

use dsp_01_identity_verifier::IdentityError;
use dsp_02_message_codec::CodecError;
use dsp_03_contract_negotiation::NegotiationError;
use dsp_04_transfer_process::TransferError;
use thiserror::Error;

/// Connector failures.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Configuration rejected by `validate`.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Request carried no bearer token.
    #[error("Missing authorization token")]
    MissingToken,

    /// Token failed verification.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Body is not a valid protocol message.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Message type or process id does not belong to the endpoint.
    #[error("{message_type} is not accepted at {endpoint}")]
    EndpointMismatch {
        /// Endpoint path
        endpoint: String,
        /// Received `@type`
        message_type: String,
    },

    /// Path segment is not a process id.
    #[error("Invalid process id: {0}")]
    InvalidProcessId(String),

    /// Negotiation engine rejection.
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    /// Transfer engine rejection.
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl ConnectorError {
    /// HTTP status the failure is answered with.
    pub fn status(&self) -> u16 {
        match self {
            ConnectorError::Config(_) => 500,
            ConnectorError::MissingToken | ConnectorError::Identity(_) => 401,
            ConnectorError::Codec(_)
            | ConnectorError::EndpointMismatch { .. }
            | ConnectorError::InvalidProcessId(_) => 400,
            ConnectorError::Negotiation(e) => match e {
                NegotiationError::IdentityMismatch { .. } => 403,
                NegotiationError::NotFound(_) => 404,
                NegotiationError::Conflict(_) => 409,
                NegotiationError::Storage(_) => 500,
                NegotiationError::Delivery { .. } => 502,
                NegotiationError::InvalidOffer(_)
                | NegotiationError::MissingCallbackAddress
                | NegotiationError::IllegalTransition { .. }
                | NegotiationError::CorrelationMismatch { .. }
                | NegotiationError::RoleNotSupported { .. } => 400,
            },
            ConnectorError::Transfer(e) => match e {
                TransferError::IdentityMismatch { .. } => 403,
                TransferError::NotFound(_) => 404,
                TransferError::Conflict(_) => 409,
                TransferError::Storage(_) => 500,
                TransferError::Delivery { .. } => 502,
                TransferError::AgreementNotFinalized { .. }
                | TransferError::IllegalTransition { .. }
                | TransferError::CorrelationMismatch { .. }
                | TransferError::RoleNotSupported { .. } => 400,
            },
        }
    }

    /// Reason code carried in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ConnectorError::Config(_) => "configuration",
            ConnectorError::MissingToken => "missing_token",
            ConnectorError::Identity(e) => e.reason_label(),
            ConnectorError::Codec(_) => "malformed_message",
            ConnectorError::EndpointMismatch { .. } => "endpoint_mismatch",
            ConnectorError::InvalidProcessId(_) => "invalid_process_id",
            ConnectorError::Negotiation(e) => e.reason_label(),
            ConnectorError::Transfer(e) => e.reason_label(),
        }
    }
}
