//! # did:web Key Resolver
//!
//! Resolves issuer keys from `did:web` documents, caching each document for a
//! configurable time. A key id missing from a cached document triggers a
//! refetch, which picks up key rotation before the cache expires. Refetches
//! for one document happen at most once per refetch interval.

use crate::domain::did::{did_web_document_url, DidDocument};
use crate::domain::VerificationKey;
use crate::ports::{DidDocumentFetcher, KeyResolutionError, KeyResolver};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{TimeSource, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Default document cache lifetime (one day).
pub const DEFAULT_DOCUMENT_TTL_SECS: u64 = 86_400;

/// Minimum spacing between fetches of the same document.
pub const DEFAULT_REFETCH_INTERVAL_SECS: u64 = 60;

struct CachedDocument {
    document: DidDocument,
    fetched_at: Timestamp,
}

/// [`KeyResolver`] backed by `did:web` documents.
pub struct DidWebKeyResolver {
    fetcher: Arc<dyn DidDocumentFetcher>,
    time: Arc<dyn TimeSource>,
    ttl_secs: u64,
    refetch_interval_secs: u64,
    cache: RwLock<HashMap<String, CachedDocument>>,
}

impl DidWebKeyResolver {
    /// Resolver with the default cache lifetime.
    pub fn new(fetcher: Arc<dyn DidDocumentFetcher>, time: Arc<dyn TimeSource>) -> Self {
        Self::with_ttl(fetcher, time, DEFAULT_DOCUMENT_TTL_SECS)
    }

    /// Resolver with a custom cache lifetime.
    pub fn with_ttl(
        fetcher: Arc<dyn DidDocumentFetcher>,
        time: Arc<dyn TimeSource>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            fetcher,
            time,
            ttl_secs,
            refetch_interval_secs: DEFAULT_REFETCH_INTERVAL_SECS,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Override the minimum spacing between fetches of one document.
    pub fn with_refetch_interval(mut self, secs: u64) -> Self {
        self.refetch_interval_secs = secs;
        self
    }

    /// Drop a cached document.
    pub fn invalidate(&self, did: &str) {
        self.cache.write().remove(did);
    }

    fn cached_key(
        &self,
        did: &str,
        key_id: Option<&str>,
    ) -> Option<Result<VerificationKey, KeyResolutionError>> {
        let cache = self.cache.read();
        let entry = cache.get(did)?;
        if self.time.now().saturating_sub(entry.fetched_at) >= self.ttl_secs {
            return None;
        }
        entry
            .document
            .find_key(key_id)
            .map(|key| key.map_err(KeyResolutionError::InvalidKey))
    }

    /// True while the cached document is younger than the refetch interval.
    fn recently_fetched(&self, did: &str) -> bool {
        self.cache.read().get(did).is_some_and(|entry| {
            let age = self.time.now().saturating_sub(entry.fetched_at);
            age < self.ttl_secs && age < self.refetch_interval_secs
        })
    }

    async fn fetch_document(&self, did: &str) -> Result<(), KeyResolutionError> {
        let url = did_web_document_url(did)
            .ok_or_else(|| KeyResolutionError::UnknownIssuer(did.to_string()))?;
        debug!("[dsp-01] fetching DID document for {} from {}", did, url);

        let raw = self.fetcher.fetch(&url).await?;
        let document: DidDocument = serde_json::from_value(raw)
            .map_err(|e| KeyResolutionError::Fetch(format!("invalid DID document: {e}")))?;
        if document.id != did {
            return Err(KeyResolutionError::UnknownIssuer(format!(
                "document at {url} describes {} instead of {did}",
                document.id
            )));
        }

        self.cache.write().insert(
            did.to_string(),
            CachedDocument {
                document,
                fetched_at: self.time.now(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl KeyResolver for DidWebKeyResolver {
    async fn resolve_key(
        &self,
        issuer: &str,
        key_id: Option<&str>,
    ) -> Result<VerificationKey, KeyResolutionError> {
        let unknown = || KeyResolutionError::UnknownKey {
            issuer: issuer.to_string(),
            key_id: key_id.unwrap_or("<none>").to_string(),
        };
        if let Some(found) = self.cached_key(issuer, key_id) {
            return found;
        }
        if self.recently_fetched(issuer) {
            debug!(
                "[dsp-01] key {:?} not in fresh document for {}, not refetching",
                key_id, issuer
            );
            return Err(unknown());
        }

        self.invalidate(issuer);
        self.fetch_document(issuer).await?;

        self.cached_key(issuer, key_id).unwrap_or_else(|| Err(unknown()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use shared_types::ManualTimeSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockFetcher {
        documents: RwLock<HashMap<String, Value>>,
        fetches: AtomicUsize,
    }

    impl MockFetcher {
        fn new() -> Self {
            Self {
                documents: RwLock::new(HashMap::new()),
                fetches: AtomicUsize::new(0),
            }
        }

        fn publish(&self, url: &str, document: Value) {
            self.documents.write().insert(url.to_string(), document);
        }
    }

    #[async_trait]
    impl DidDocumentFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<Value, KeyResolutionError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.documents
                .read()
                .get(url)
                .cloned()
                .ok_or_else(|| KeyResolutionError::Fetch(format!("404 {url}")))
        }
    }

    fn key(seed: u8) -> VerificationKey {
        VerificationKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(&[seed; 32]).verifying_key())
    }

    fn document(did: &str, keys: &[(&str, &VerificationKey)]) -> Value {
        let methods: Vec<Value> = keys
            .iter()
            .map(|(fragment, key)| {
                json!({
                    "id": format!("{did}#{fragment}"),
                    "type": "JsonWebKey2020",
                    "controller": did,
                    "publicKeyJwk": key.to_jwk(None)
                })
            })
            .collect();
        json!({ "id": did, "verificationMethod": methods })
    }

    const DID: &str = "did:web:consumer.example";
    const URL: &str = "https://consumer.example/.well-known/did.json";

    #[tokio::test]
    async fn test_resolves_and_caches() {
        let fetcher = Arc::new(MockFetcher::new());
        let k1 = key(1);
        fetcher.publish(URL, document(DID, &[("key-1", &k1)]));
        let resolver = DidWebKeyResolver::new(fetcher.clone(), Arc::new(ManualTimeSource::new(1_000)));

        assert_eq!(resolver.resolve_key(DID, Some("key-1")).await.unwrap(), k1);
        assert_eq!(resolver.resolve_key(DID, Some("key-1")).await.unwrap(), k1);
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_kid_refetches_once() {
        let fetcher = Arc::new(MockFetcher::new());
        let (k1, k2) = (key(1), key(2));
        fetcher.publish(URL, document(DID, &[("key-1", &k1)]));
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let resolver = DidWebKeyResolver::new(fetcher.clone(), clock.clone());
        resolver.resolve_key(DID, Some("key-1")).await.unwrap();

        fetcher.publish(URL, document(DID, &[("key-1", &k1), ("key-2", &k2)]));
        clock.advance(DEFAULT_REFETCH_INTERVAL_SECS);
        assert_eq!(resolver.resolve_key(DID, Some("key-2")).await.unwrap(), k2);
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);

        let err = resolver.resolve_key(DID, Some("key-9")).await.unwrap_err();
        assert!(matches!(err, KeyResolutionError::UnknownKey { .. }));
    }

    #[tokio::test]
    async fn test_unknown_kid_refetch_is_rate_limited() {
        let fetcher = Arc::new(MockFetcher::new());
        let (k1, k2) = (key(1), key(2));
        fetcher.publish(URL, document(DID, &[("key-1", &k1)]));
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let resolver = DidWebKeyResolver::new(fetcher.clone(), clock.clone());
        resolver.resolve_key(DID, Some("key-1")).await.unwrap();

        // A burst of bogus key ids costs no extra fetches.
        for i in 0..20 {
            let kid = format!("bogus-{i}");
            let err = resolver.resolve_key(DID, Some(&kid)).await.unwrap_err();
            assert!(matches!(err, KeyResolutionError::UnknownKey { .. }));
        }
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);

        // Rotation within the interval is not seen yet.
        fetcher.publish(URL, document(DID, &[("key-1", &k1), ("key-2", &k2)]));
        clock.advance(30);
        assert!(resolver.resolve_key(DID, Some("key-2")).await.is_err());
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);

        clock.advance(31);
        assert_eq!(resolver.resolve_key(DID, Some("key-2")).await.unwrap(), k2);
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);
        // Cached keys keep resolving without fetches.
        assert_eq!(resolver.resolve_key(DID, Some("key-1")).await.unwrap(), k1);
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refetch_interval_is_configurable() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.publish(URL, document(DID, &[("key-1", &key(1))]));
        let resolver =
            DidWebKeyResolver::new(fetcher.clone(), Arc::new(ManualTimeSource::new(1_000)))
                .with_refetch_interval(0);
        resolver.resolve_key(DID, Some("key-1")).await.unwrap();

        assert!(resolver.resolve_key(DID, Some("key-7")).await.is_err());
        assert!(resolver.resolve_key(DID, Some("key-8")).await.is_err());
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cache_expires() {
        let fetcher = Arc::new(MockFetcher::new());
        let k1 = key(1);
        fetcher.publish(URL, document(DID, &[("key-1", &k1)]));
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let resolver = DidWebKeyResolver::with_ttl(fetcher.clone(), clock.clone(), 60);

        resolver.resolve_key(DID, None).await.unwrap();
        clock.advance(61);
        resolver.resolve_key(DID, None).await.unwrap();
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_document_id_must_match() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.publish(URL, document("did:web:impostor.example", &[("key-1", &key(1))]));
        let resolver = DidWebKeyResolver::new(fetcher, Arc::new(ManualTimeSource::new(1_000)));

        let err = resolver.resolve_key(DID, Some("key-1")).await.unwrap_err();
        assert!(matches!(err, KeyResolutionError::UnknownIssuer(_)));
    }

    #[tokio::test]
    async fn test_non_web_did_is_unknown() {
        let resolver = DidWebKeyResolver::new(
            Arc::new(MockFetcher::new()),
            Arc::new(ManualTimeSource::new(0)),
        );
        assert!(matches!(
            resolver.resolve_key("did:key:z6Mkabc", None).await,
            Err(KeyResolutionError::UnknownIssuer(_))
        ));
    }
}
