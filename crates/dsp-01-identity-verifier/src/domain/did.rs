//! # did:web
//!
//! Mapping of `did:web` identifiers to document URLs and extraction of
//! verification keys from DID documents.

use super::keys::{Jwk, VerificationKey};
use serde::Deserialize;

/// Subset of a DID document the verifier reads.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    /// Document subject.
    pub id: String,
    /// Published keys.
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,
}

/// A verification method entry.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Method id, e.g. `did:web:host#key-1`.
    pub id: String,
    /// Method type, e.g. `JsonWebKey2020`.
    #[serde(rename = "type", default)]
    pub method_type: Option<String>,
    /// Controller DID.
    #[serde(default)]
    pub controller: Option<String>,
    /// Public key as JWK.
    #[serde(default)]
    pub public_key_jwk: Option<Jwk>,
}

/// URL of the DID document for a `did:web` identifier.
///
/// `did:web:example.com` maps to `https://example.com/.well-known/did.json`;
/// path segments map to `/seg/did.json`; `%3A` encodes a port separator.
pub fn did_web_document_url(did: &str) -> Option<String> {
    let rest = did.strip_prefix("did:web:")?;
    let rest = rest.split('#').next()?;
    if rest.is_empty() {
        return None;
    }

    let mut segments = rest.split(':');
    let host = segments.next()?.replace("%3A", ":").replace("%3a", ":");
    if host.is_empty() {
        return None;
    }
    let path: Vec<&str> = segments.collect();
    if path.iter().any(|segment| segment.is_empty()) {
        return None;
    }

    if path.is_empty() {
        Some(format!("https://{host}/.well-known/did.json"))
    } else {
        Some(format!("https://{host}/{}/did.json", path.join("/")))
    }
}

impl DidDocument {
    /// Key matching `key_id`, or the only key when no id is given.
    ///
    /// A key id matches a method either verbatim or as its `#fragment`.
    pub fn find_key(&self, key_id: Option<&str>) -> Option<Result<VerificationKey, String>> {
        let method = match key_id {
            Some(kid) => self.verification_method.iter().find(|m| {
                m.id == kid
                    || m.id.rsplit_once('#').map(|(_, fragment)| fragment)
                        == Some(kid.trim_start_matches('#'))
            }),
            None if self.verification_method.len() == 1 => self.verification_method.first(),
            None => None,
        }?;
        Some(match &method.public_key_jwk {
            Some(jwk) => VerificationKey::from_jwk(jwk),
            None => Err(format!("verification method {} has no publicKeyJwk", method.id)),
        })
    }
}
