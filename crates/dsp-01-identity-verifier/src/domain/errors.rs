//! # Domain Errors
//!
//! Authentication failures. Any of these must stop the calling handler before
//! it looks up or touches process state.

use thiserror::Error;

/// Token verification errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Not a compact JWS or claims are not parseable.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// `alg` is neither `EdDSA` nor `ES256K`.
    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Issuer is not in the trusted set.
    #[error("Untrusted issuer: {0}")]
    UntrustedIssuer(String),

    /// No key material could be resolved for the issuer.
    #[error("Unknown issuer {issuer}: {reason}")]
    UnknownIssuer {
        /// Issuer DID
        issuer: String,
        /// Resolution failure
        reason: String,
    },

    /// Signature does not verify under the issuer's key.
    #[error("Token signature invalid")]
    SignatureInvalid,

    /// `exp` is in the past.
    #[error("Token expired at {expired_at} (now {now})")]
    TokenExpired {
        /// Expiry claim
        expired_at: u64,
        /// Verification time
        now: u64,
    },

    /// `nbf` is in the future.
    #[error("Token not valid before {not_before} (now {now})")]
    TokenNotYetValid {
        /// Not-before claim
        not_before: u64,
        /// Verification time
        now: u64,
    },

    /// Expected audience is not among `aud`.
    #[error("Audience mismatch: expected {expected}, token is for {actual:?}")]
    AudienceMismatch {
        /// Audience the endpoint requires
        expected: String,
        /// Audiences in the token
        actual: Vec<String>,
    },

    /// Self-issued token with `iss != sub`.
    #[error("Token subject {subject} differs from issuer {issuer}")]
    SubjectMismatch {
        /// Issuer claim
        issuer: String,
        /// Subject claim
        subject: String,
    },

    /// `jti` already used within its lifetime.
    #[error("Token {0} already used")]
    TokenReplayed(String),
}

impl IdentityError {
    /// Short label for logs and metrics.
    pub fn reason_label(&self) -> &'static str {
        match self {
            IdentityError::MalformedToken(_) => "malformed",
            IdentityError::UnsupportedAlgorithm(_) => "algorithm",
            IdentityError::UntrustedIssuer(_) => "untrusted_issuer",
            IdentityError::UnknownIssuer { .. } => "unknown_issuer",
            IdentityError::SignatureInvalid => "signature",
            IdentityError::TokenExpired { .. } => "expired",
            IdentityError::TokenNotYetValid { .. } => "not_yet_valid",
            IdentityError::AudienceMismatch { .. } => "audience",
            IdentityError::SubjectMismatch { .. } => "subject",
            IdentityError::TokenReplayed(_) => "replay",
        }
    }
}
