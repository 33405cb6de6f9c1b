//! # Codec Errors

use thiserror::Error;

/// Decode and encode failures. Every variant is a malformed-message rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Payload is not JSON.
    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(String),

    /// Payload is JSON but not an object.
    #[error("Payload is not a JSON object")]
    NotAnObject,

    /// `@context` absent or not referencing the DSP context.
    #[error("Unsupported or missing @context")]
    UnsupportedContext,

    /// `@type` absent or not a string.
    #[error("Missing @type")]
    MissingType,

    /// `@type` names no known message.
    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    /// Known message with missing or ill-typed members.
    #[error("Malformed {message_type}: {reason}")]
    MalformedMessage {
        /// Message type being decoded
        message_type: String,
        /// What was wrong
        reason: String,
    },

    /// Encoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl CodecError {
    pub(crate) fn malformed(message_type: &str, reason: impl Into<String>) -> Self {
        CodecError::MalformedMessage {
            message_type: message_type.to_string(),
            reason: reason.into(),
        }
    }
}
