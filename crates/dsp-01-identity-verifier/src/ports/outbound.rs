//! # Outbound Ports
//!
//! Key material resolution. Fetching DID documents over the network is the
//! host's concern and sits behind [`DidDocumentFetcher`].

use crate::domain::VerificationKey;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Key resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyResolutionError {
    /// The issuer is not known to this resolver.
    #[error("Unknown issuer: {0}")]
    UnknownIssuer(String),

    /// The issuer is known but has no key with this id.
    #[error("No key {key_id} for issuer {issuer}")]
    UnknownKey {
        /// Issuer DID
        issuer: String,
        /// Requested key id
        key_id: String,
    },

    /// The published key material could not be used.
    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    /// Fetching the issuer's document failed.
    #[error("Fetch failed: {0}")]
    Fetch(String),
}

/// Resolves an issuer's public key.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// Public key of `issuer`, selected by `key_id` when given.
    async fn resolve_key(
        &self,
        issuer: &str,
        key_id: Option<&str>,
    ) -> Result<VerificationKey, KeyResolutionError>;
}

/// Retrieves a DID document from its URL.
#[async_trait]
pub trait DidDocumentFetcher: Send + Sync {
    /// Raw JSON document at `url`.
    async fn fetch(&self, url: &str) -> Result<Value, KeyResolutionError>;
}
