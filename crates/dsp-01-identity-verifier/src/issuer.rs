//! # Token Issuer
//!
//! Signs the self-issued tokens attached to outbound protocol calls. The
//! audience is the counterparty's DID so the receiver can enforce it.

use crate::domain::jws;
use crate::domain::{Audience, SigningAlgorithm, TokenClaims, TokenHeader, VerificationKey};
use shared_types::TimeSource;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Token issuance failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueError {
    /// Private key bytes are not usable.
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    /// Header or claims could not be serialized.
    #[error("Token serialization failed: {0}")]
    Serialization(String),
}

/// Private signing key.
#[derive(Clone)]
pub enum SigningKeyMaterial {
    /// Ed25519 key, signs `EdDSA`.
    Ed25519(ed25519_dalek::SigningKey),
    /// secp256k1 key, signs `ES256K`.
    Secp256k1(k256::ecdsa::SigningKey),
    /// P-256 key, signs `ES256`.
    P256(p256::ecdsa::SigningKey),
}

impl SigningKeyMaterial {
    /// Ed25519 key from a 32 byte seed.
    pub fn ed25519(seed: &[u8; 32]) -> Self {
        SigningKeyMaterial::Ed25519(ed25519_dalek::SigningKey::from_bytes(seed))
    }

    /// secp256k1 key from a 32 byte scalar.
    pub fn secp256k1(secret: &[u8]) -> Result<Self, IssueError> {
        k256::ecdsa::SigningKey::from_slice(secret)
            .map(SigningKeyMaterial::Secp256k1)
            .map_err(|e| IssueError::InvalidKey(e.to_string()))
    }

    /// P-256 key from a 32 byte scalar.
    pub fn p256(secret: &[u8]) -> Result<Self, IssueError> {
        p256::ecdsa::SigningKey::from_slice(secret)
            .map(SigningKeyMaterial::P256)
            .map_err(|e| IssueError::InvalidKey(e.to_string()))
    }

    /// Matching public key.
    pub fn verification_key(&self) -> VerificationKey {
        match self {
            SigningKeyMaterial::Ed25519(key) => VerificationKey::Ed25519(key.verifying_key()),
            SigningKeyMaterial::Secp256k1(key) => VerificationKey::Secp256k1(*key.verifying_key()),
            SigningKeyMaterial::P256(key) => VerificationKey::P256(*key.verifying_key()),
        }
    }

    /// JWS algorithm.
    pub fn algorithm(&self) -> SigningAlgorithm {
        match self {
            SigningKeyMaterial::Ed25519(_) => SigningAlgorithm::EdDsa,
            SigningKeyMaterial::Secp256k1(_) => SigningAlgorithm::Es256k,
            SigningKeyMaterial::P256(_) => SigningAlgorithm::Es256,
        }
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        match self {
            SigningKeyMaterial::Ed25519(key) => {
                ed25519_dalek::Signer::sign(key, input).to_bytes().to_vec()
            }
            SigningKeyMaterial::Secp256k1(key) => {
                let signature: k256::ecdsa::Signature =
                    k256::ecdsa::signature::Signer::sign(key, input);
                signature.to_bytes().to_vec()
            }
            SigningKeyMaterial::P256(key) => {
                let signature: p256::ecdsa::Signature =
                    p256::ecdsa::signature::Signer::sign(key, input);
                signature.to_bytes().to_vec()
            }
        }
    }
}

impl std::fmt::Debug for SigningKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningKeyMaterial({})", self.algorithm())
    }
}

/// Issues tokens on behalf of one participant.
pub struct TokenIssuer {
    participant_id: String,
    key_id: String,
    material: SigningKeyMaterial,
    time: Arc<dyn TimeSource>,
}

impl TokenIssuer {
    /// Issuer for `participant_id` signing with `material`.
    ///
    /// `key_id` may be a bare fragment (`key-1`) or a full DID URL.
    pub fn new(
        participant_id: impl Into<String>,
        key_id: impl Into<String>,
        material: SigningKeyMaterial,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        let participant_id = participant_id.into();
        let key_id = key_id.into();
        let key_id = if key_id.contains('#') {
            key_id
        } else {
            format!("{participant_id}#{key_id}")
        };
        Self {
            participant_id,
            key_id,
            material,
            time,
        }
    }

    /// DID tokens are issued for.
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Public key matching the signing key.
    pub fn verification_key(&self) -> VerificationKey {
        self.material.verification_key()
    }

    /// Self-issued token for `audience`, valid for `ttl_secs`.
    pub fn issue(&self, audience: &str, ttl_secs: u64) -> Result<String, IssueError> {
        let now = self.time.now();
        let header = TokenHeader {
            alg: self.material.algorithm().as_str().to_string(),
            kid: Some(self.key_id.clone()),
            typ: Some("JWT".to_string()),
        };
        let claims = TokenClaims {
            iss: self.participant_id.clone(),
            sub: self.participant_id.clone(),
            aud: Audience::One(audience.to_string()),
            exp: now.saturating_add(ttl_secs),
            nbf: Some(now),
            iat: Some(now),
            jti: Some(Uuid::new_v4().to_string()),
            scope: None,
        };
        self.sign(&header, &claims)
    }

    /// Sign arbitrary header and claims with this issuer's key.
    pub fn sign(&self, header: &TokenHeader, claims: &TokenClaims) -> Result<String, IssueError> {
        let header = jws::encode_json(header).map_err(|e| IssueError::Serialization(e.to_string()))?;
        let claims = jws::encode_json(claims).map_err(|e| IssueError::Serialization(e.to_string()))?;
        let signing_input = format!("{header}.{claims}");
        let signature = self.material.sign(signing_input.as_bytes());
        Ok(format!("{signing_input}.{}", jws::encode_segment(&signature)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ManualTimeSource;

    #[test]
    fn test_issued_token_shape() {
        let issuer = TokenIssuer::new(
            "did:web:c",
            "key-1",
            SigningKeyMaterial::ed25519(&[1u8; 32]),
            Arc::new(ManualTimeSource::new(1_000)),
        );
        let token = issuer.issue("did:web:p", 60).unwrap();
        let parsed = jws::parse(&token).unwrap();
        assert_eq!(parsed.header.alg, "EdDSA");
        assert_eq!(parsed.header.kid.as_deref(), Some("did:web:c#key-1"));
        assert_eq!(parsed.claims.exp, 1_060);
        assert!(parsed.claims.jti.is_some());
        assert!(issuer
            .verification_key()
            .verify(SigningAlgorithm::EdDsa, parsed.signing_input.as_bytes(), &parsed.signature)
            .is_ok());
    }

    #[test]
    fn test_each_token_has_fresh_jti() {
        let issuer = TokenIssuer::new(
            "did:web:c",
            "did:web:c#key-7",
            SigningKeyMaterial::secp256k1(&[2u8; 32]).unwrap(),
            Arc::new(ManualTimeSource::new(1_000)),
        );
        let a = jws::parse(&issuer.issue("did:web:p", 60).unwrap()).unwrap().claims.jti;
        let b = jws::parse(&issuer.issue("did:web:p", 60).unwrap()).unwrap().claims.jti;
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_scalar_rejected() {
        assert!(SigningKeyMaterial::secp256k1(&[0u8; 32]).is_err());
    }
}
