//! # Verification Keys
//!
//! Public key material and its JWK form as published in DID documents.

use super::entities::SigningAlgorithm;
use super::errors::IdentityError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// JSON Web Key (public members only).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type: `OKP` or `EC`.
    pub kty: String,
    /// Curve: `Ed25519`, `secp256k1` or `P-256`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// Public x coordinate (or the Ed25519 key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Public y coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// Key id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// Resolved public key of an issuer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationKey {
    /// Ed25519 public key.
    Ed25519(ed25519_dalek::VerifyingKey),
    /// secp256k1 public key.
    Secp256k1(k256::ecdsa::VerifyingKey),
    /// P-256 public key.
    P256(p256::ecdsa::VerifyingKey),
}

impl VerificationKey {
    /// Algorithm this key verifies.
    pub fn algorithm(&self) -> SigningAlgorithm {
        match self {
            VerificationKey::Ed25519(_) => SigningAlgorithm::EdDsa,
            VerificationKey::Secp256k1(_) => SigningAlgorithm::Es256k,
            VerificationKey::P256(_) => SigningAlgorithm::Es256,
        }
    }

    /// Verify a JWS signature over `signing_input`.
    ///
    /// ECDSA signatures are accepted in either S form; JWS signers are not
    /// required to emit low-S.
    pub fn verify(
        &self,
        algorithm: SigningAlgorithm,
        signing_input: &[u8],
        signature: &[u8],
    ) -> Result<(), IdentityError> {
        if algorithm != self.algorithm() {
            return Err(IdentityError::SignatureInvalid);
        }
        match self {
            VerificationKey::Ed25519(key) => {
                let signature = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|_| IdentityError::SignatureInvalid)?;
                key.verify_strict(signing_input, &signature)
                    .map_err(|_| IdentityError::SignatureInvalid)
            }
            VerificationKey::Secp256k1(key) => {
                let signature = k256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| IdentityError::SignatureInvalid)?;
                let signature = signature.normalize_s().unwrap_or(signature);
                k256::ecdsa::signature::Verifier::verify(key, signing_input, &signature)
                    .map_err(|_| IdentityError::SignatureInvalid)
            }
            VerificationKey::P256(key) => {
                let signature = p256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| IdentityError::SignatureInvalid)?;
                let signature = signature.normalize_s().unwrap_or(signature);
                p256::ecdsa::signature::Verifier::verify(key, signing_input, &signature)
                    .map_err(|_| IdentityError::SignatureInvalid)
            }
        }
    }

    /// Parse a public JWK.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, String> {
        match (jwk.kty.as_str(), jwk.crv.as_deref()) {
            ("OKP", Some("Ed25519")) => {
                let x = decode_coordinate(jwk.x.as_deref(), "x")?;
                let bytes: [u8; 32] = x
                    .as_slice()
                    .try_into()
                    .map_err(|_| "Ed25519 key must be 32 bytes".to_string())?;
                ed25519_dalek::VerifyingKey::from_bytes(&bytes)
                    .map(VerificationKey::Ed25519)
                    .map_err(|e| e.to_string())
            }
            ("EC", Some("secp256k1")) => {
                let sec1 = uncompressed_point(jwk, "secp256k1")?;
                k256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
                    .map(VerificationKey::Secp256k1)
                    .map_err(|e| e.to_string())
            }
            ("EC", Some("P-256")) => {
                let sec1 = uncompressed_point(jwk, "P-256")?;
                p256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
                    .map(VerificationKey::P256)
                    .map_err(|e| e.to_string())
            }
            (kty, crv) => Err(format!("unsupported key type {kty}/{crv:?}")),
        }
    }

    /// Public JWK for publication in a DID document.
    pub fn to_jwk(&self, kid: Option<String>) -> Jwk {
        match self {
            VerificationKey::Ed25519(key) => Jwk {
                kty: "OKP".to_string(),
                crv: Some("Ed25519".to_string()),
                x: Some(URL_SAFE_NO_PAD.encode(key.as_bytes())),
                y: None,
                kid,
            },
            VerificationKey::Secp256k1(key) => {
                let point = key.to_encoded_point(false);
                Jwk {
                    kty: "EC".to_string(),
                    crv: Some("secp256k1".to_string()),
                    x: point.x().map(|x| URL_SAFE_NO_PAD.encode(x)),
                    y: point.y().map(|y| URL_SAFE_NO_PAD.encode(y)),
                    kid,
                }
            }
            VerificationKey::P256(key) => {
                let point = key.to_encoded_point(false);
                Jwk {
                    kty: "EC".to_string(),
                    crv: Some("P-256".to_string()),
                    x: point.x().map(|x| URL_SAFE_NO_PAD.encode(x)),
                    y: point.y().map(|y| URL_SAFE_NO_PAD.encode(y)),
                    kid,
                }
            }
        }
    }
}

/// SEC1 uncompressed point from the JWK's 32 byte `x` and `y`.
fn uncompressed_point(jwk: &Jwk, curve: &str) -> Result<Vec<u8>, String> {
    let x = decode_coordinate(jwk.x.as_deref(), "x")?;
    let y = decode_coordinate(jwk.y.as_deref(), "y")?;
    if x.len() != 32 || y.len() != 32 {
        return Err(format!("{curve} coordinates must be 32 bytes"));
    }
    let mut sec1 = Vec::with_capacity(65);
    sec1.push(0x04);
    sec1.extend_from_slice(&x);
    sec1.extend_from_slice(&y);
    Ok(sec1)
}

fn decode_coordinate(value: Option<&str>, name: &str) -> Result<Vec<u8>, String> {
    let value = value.ok_or_else(|| format!("JWK is missing '{name}'"))?;
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| format!("JWK '{name}' is not base64url: {e}"))
}
