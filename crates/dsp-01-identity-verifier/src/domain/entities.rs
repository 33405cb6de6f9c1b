//! # Domain Entities
//!
//! Token header and claims, the verified identity and verifier configuration.

use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::fmt;
use std::str::FromStr;

use super::errors::IdentityError;

/// JWS algorithms accepted on inbound tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// Ed25519.
    EdDsa,
    /// ECDSA over secp256k1 with SHA-256.
    Es256k,
    /// ECDSA over P-256 with SHA-256.
    Es256,
}

impl SigningAlgorithm {
    /// `alg` header value.
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::EdDsa => "EdDSA",
            SigningAlgorithm::Es256k => "ES256K",
            SigningAlgorithm::Es256 => "ES256",
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EdDSA" => Ok(SigningAlgorithm::EdDsa),
            "ES256K" => Ok(SigningAlgorithm::Es256k),
            "ES256" => Ok(SigningAlgorithm::Es256),
            other => Err(IdentityError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protected JWS header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Signing algorithm.
    pub alg: String,
    /// Key id, usually a DID URL such as `did:web:host#key-1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Media type, normally `JWT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// `aud` claim: a single value or a list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// Single audience.
    One(String),
    /// Several audiences.
    Many(Vec<String>),
}

impl Audience {
    /// Whether `expected` is one of the audiences.
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::One(aud) => aud == expected,
            Audience::Many(auds) => auds.iter().any(|aud| aud == expected),
        }
    }

    /// All audiences as a list.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Audience::One(aud) => vec![aud.clone()],
            Audience::Many(auds) => auds.clone(),
        }
    }
}

/// Registered claims read by the verifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer DID.
    pub iss: String,
    /// Subject DID.
    pub sub: String,
    /// Audience(s).
    pub aud: Audience,
    /// Expiry (seconds since epoch).
    pub exp: u64,
    /// Not before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    /// Issued at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// Token id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Space separated scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Identity established for one request. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityClaim {
    /// Verified caller DID.
    pub subject: String,
    /// Issuer DID.
    pub issuer: String,
    /// Audiences the token was issued for.
    pub audience: Vec<String>,
    /// Granted scopes.
    pub scope: Vec<String>,
    /// Token id, when present.
    pub token_id: Option<String>,
    /// Expiry of the underlying token.
    pub expires_at: Timestamp,
}

impl IdentityClaim {
    /// Build a claim from verified token claims.
    pub fn from_claims(claims: &TokenClaims) -> Self {
        Self {
            subject: claims.sub.clone(),
            issuer: claims.iss.clone(),
            audience: claims.aud.to_vec(),
            scope: claims
                .scope
                .as_deref()
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            token_id: claims.jti.clone(),
            expires_at: claims.exp,
        }
    }

    /// Claim for a caller whose identity was established out of band.
    pub fn for_subject(subject: impl Into<String>) -> Self {
        let subject = subject.into();
        Self {
            issuer: subject.clone(),
            subject,
            audience: Vec::new(),
            scope: Vec::new(),
            token_id: None,
            expires_at: u64::MAX,
        }
    }
}

/// Verifier settings.
#[derive(Clone, Debug)]
pub struct VerifierConfig {
    /// Issuers whose tokens are accepted. Empty trusts any issuer the key
    /// resolver can resolve.
    pub trusted_issuers: Vec<String>,
    /// Clock skew tolerated on `exp` and `nbf`.
    pub leeway_secs: u64,
    /// Require `iss == sub`.
    pub require_self_issued: bool,
    /// Reject tokens without a `jti`.
    pub require_token_id: bool,
    /// Remember `jti` values until expiry and reject reuse.
    pub replay_protection: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            trusted_issuers: Vec::new(),
            leeway_secs: 5,
            require_self_issued: true,
            require_token_id: false,
            replay_protection: true,
        }
    }
}
