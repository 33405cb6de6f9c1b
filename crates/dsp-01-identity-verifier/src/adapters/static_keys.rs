//! # Static Key Resolver
//!
//! Fixed issuer-to-key registry for tests and closed deployments.

use crate::domain::VerificationKey;
use crate::ports::{KeyResolutionError, KeyResolver};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory issuer registry. One key per issuer; the key id is ignored.
#[derive(Default)]
pub struct StaticKeyResolver {
    keys: RwLock<HashMap<String, VerificationKey>>,
}

impl StaticKeyResolver {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an issuer's key.
    pub fn register(&self, issuer: impl Into<String>, key: VerificationKey) {
        self.keys.write().insert(issuer.into(), key);
    }

    /// Remove an issuer.
    pub fn revoke(&self, issuer: &str) {
        self.keys.write().remove(issuer);
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve_key(
        &self,
        issuer: &str,
        _key_id: Option<&str>,
    ) -> Result<VerificationKey, KeyResolutionError> {
        self.keys
            .read()
            .get(issuer)
            .cloned()
            .ok_or_else(|| KeyResolutionError::UnknownIssuer(issuer.to_string()))
    }
}
