//! # Compact JWS
//!
//! Splitting and decoding of `header.claims.signature` tokens.

use super::entities::{TokenClaims, TokenHeader};
use super::errors::IdentityError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A parsed but not yet verified token.
#[derive(Debug, Clone)]
pub struct CompactJws<'a> {
    /// Decoded header.
    pub header: TokenHeader,
    /// Decoded claims.
    pub claims: TokenClaims,
    /// `header.claims` as transmitted; the bytes the signature covers.
    pub signing_input: &'a str,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
}

/// Strip an optional `Bearer ` prefix.
pub fn strip_bearer(authorization: &str) -> &str {
    let trimmed = authorization.trim();
    match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => trimmed[7..].trim_start(),
        _ => trimmed,
    }
}

/// Split and decode a compact JWS.
pub fn parse(token: &str) -> Result<CompactJws<'_>, IdentityError> {
    let mut parts = token.split('.');
    let (Some(header), Some(claims), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(IdentityError::MalformedToken(
            "expected three dot-separated segments".to_string(),
        ));
    };

    let signing_input = &token[..header.len() + 1 + claims.len()];
    Ok(CompactJws {
        header: decode_json(header, "header")?,
        claims: decode_json(claims, "claims")?,
        signing_input,
        signature: decode_segment(signature, "signature")?,
    })
}

/// base64url-encode a JSON value for use as a segment.
pub fn encode_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(value)?))
}

/// base64url-encode raw bytes.
pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>, IdentityError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| IdentityError::MalformedToken(format!("{name} is not base64url: {e}")))
}

fn decode_json<T: DeserializeOwned>(segment: &str, name: &str) -> Result<T, IdentityError> {
    let bytes = decode_segment(segment, name)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| IdentityError::MalformedToken(format!("{name} is not valid: {e}")))
}
