//! # Identity Verification Service
//!
//! Application service implementing [`IdentityVerificationApi`].
//!
//! ## Architecture
//!
//! - Implements the inbound port (`IdentityVerificationApi`)
//! - Resolves issuer keys through the outbound `KeyResolver` port
//! - Delegates parsing and signature checks to the domain layer

use crate::domain::jws::{self, CompactJws};
use crate::domain::{IdentityClaim, IdentityError, ReplayGuard, SigningAlgorithm, VerifierConfig};
use crate::metrics;
use crate::ports::{IdentityVerificationApi, KeyResolver};
use async_trait::async_trait;
use shared_types::TimeSource;
use std::sync::Arc;
use tracing::{debug, warn};

/// Verifies DID-bound access tokens.
pub struct IdentityVerifier {
    resolver: Arc<dyn KeyResolver>,
    time: Arc<dyn TimeSource>,
    config: VerifierConfig,
    replay: ReplayGuard,
}

impl IdentityVerifier {
    /// Create a verifier.
    pub fn new(
        resolver: Arc<dyn KeyResolver>,
        time: Arc<dyn TimeSource>,
        config: VerifierConfig,
    ) -> Self {
        Self {
            resolver,
            time,
            config,
            replay: ReplayGuard::new(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    async fn verify_inner(
        &self,
        token: &str,
        expected_audience: &str,
    ) -> Result<IdentityClaim, IdentityError> {
        let token = jws::strip_bearer(token);
        let CompactJws {
            header,
            claims,
            signing_input,
            signature,
        } = jws::parse(token)?;

        let algorithm: SigningAlgorithm = header.alg.parse()?;

        if !self.config.trusted_issuers.is_empty()
            && !self.config.trusted_issuers.iter().any(|t| t == &claims.iss)
        {
            return Err(IdentityError::UntrustedIssuer(claims.iss));
        }

        let key = self
            .resolver
            .resolve_key(&claims.iss, header.kid.as_deref())
            .await
            .map_err(|e| IdentityError::UnknownIssuer {
                issuer: claims.iss.clone(),
                reason: e.to_string(),
            })?;

        key.verify(algorithm, signing_input.as_bytes(), &signature)?;

        let now = self.time.now();
        let leeway = self.config.leeway_secs;
        if claims.exp.saturating_add(leeway) <= now {
            return Err(IdentityError::TokenExpired {
                expired_at: claims.exp,
                now,
            });
        }
        if let Some(nbf) = claims.nbf {
            if nbf > now.saturating_add(leeway) {
                return Err(IdentityError::TokenNotYetValid {
                    not_before: nbf,
                    now,
                });
            }
        }

        if !claims.aud.contains(expected_audience) {
            return Err(IdentityError::AudienceMismatch {
                expected: expected_audience.to_string(),
                actual: claims.aud.to_vec(),
            });
        }

        if self.config.require_self_issued && claims.iss != claims.sub {
            return Err(IdentityError::SubjectMismatch {
                issuer: claims.iss,
                subject: claims.sub,
            });
        }

        match claims.jti.as_deref() {
            Some(jti) if self.config.replay_protection => {
                if self.replay.check_and_record(jti, claims.exp.saturating_add(leeway), now) {
                    return Err(IdentityError::TokenReplayed(jti.to_string()));
                }
            }
            None if self.config.require_token_id => {
                return Err(IdentityError::MalformedToken("missing jti".to_string()));
            }
            _ => {}
        }

        Ok(IdentityClaim::from_claims(&claims))
    }
}

#[async_trait]
impl IdentityVerificationApi for IdentityVerifier {
    async fn verify(
        &self,
        token: &str,
        expected_audience: &str,
    ) -> Result<IdentityClaim, IdentityError> {
        match self.verify_inner(token, expected_audience).await {
            Ok(claim) => {
                metrics::record_token_verified();
                debug!("[dsp-01] authenticated {}", claim.subject);
                Ok(claim)
            }
            Err(e) => {
                metrics::record_token_rejected(e.reason_label());
                warn!("[dsp-01] token rejected: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticKeyResolver;
    use crate::domain::{Audience, TokenClaims, TokenHeader};
    use crate::issuer::{SigningKeyMaterial, TokenIssuer};
    use shared_types::ManualTimeSource;

    const CONSUMER: &str = "did:web:consumer.example";
    const PROVIDER: &str = "did:web:provider.example";
    const NOW: u64 = 1_700_000_000;

    struct Fixture {
        verifier: IdentityVerifier,
        issuer: TokenIssuer,
        clock: Arc<ManualTimeSource>,
    }

    fn fixture(config: VerifierConfig) -> Fixture {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let material = SigningKeyMaterial::ed25519(&[11u8; 32]);
        let resolver = Arc::new(StaticKeyResolver::new());
        resolver.register(CONSUMER, material.verification_key());
        let issuer = TokenIssuer::new(CONSUMER, "key-1", material, clock.clone());
        Fixture {
            verifier: IdentityVerifier::new(resolver, clock.clone(), config),
            issuer,
            clock,
        }
    }

    #[tokio::test]
    async fn test_valid_token_yields_claim() {
        let f = fixture(VerifierConfig::default());
        let token = f.issuer.issue(PROVIDER, 300).unwrap();
        let claim = f.verifier.verify(&format!("Bearer {token}"), PROVIDER).await.unwrap();
        assert_eq!(claim.subject, CONSUMER);
        assert_eq!(claim.issuer, CONSUMER);
        assert_eq!(claim.audience, vec![PROVIDER.to_string()]);
        assert_eq!(claim.expires_at, NOW + 300);
    }

    #[tokio::test]
    async fn test_secp256k1_token_accepted() {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let material = SigningKeyMaterial::secp256k1(&[5u8; 32]).unwrap();
        let resolver = Arc::new(StaticKeyResolver::new());
        resolver.register(CONSUMER, material.verification_key());
        let issuer = TokenIssuer::new(CONSUMER, "key-1", material, clock.clone());
        let verifier = IdentityVerifier::new(resolver, clock, VerifierConfig::default());

        let token = issuer.issue(PROVIDER, 60).unwrap();
        assert!(verifier.verify(&token, PROVIDER).await.is_ok());
    }

    #[tokio::test]
    async fn test_es256_token_accepted() {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let material = SigningKeyMaterial::p256(&[6u8; 32]).unwrap();
        let resolver = Arc::new(StaticKeyResolver::new());
        resolver.register(CONSUMER, material.verification_key());
        let issuer = TokenIssuer::new(CONSUMER, "key-1", material, clock.clone());
        let verifier = IdentityVerifier::new(resolver, clock, VerifierConfig::default());

        let token = issuer.issue(PROVIDER, 60).unwrap();
        let claim = verifier.verify(&token, PROVIDER).await.unwrap();
        assert_eq!(claim.subject, CONSUMER);
    }

    #[tokio::test]
    async fn test_high_s_es256k_token_accepted() {
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use base64::Engine as _;

        let clock = Arc::new(ManualTimeSource::new(NOW));
        let material = SigningKeyMaterial::secp256k1(&[5u8; 32]).unwrap();
        let resolver = Arc::new(StaticKeyResolver::new());
        resolver.register(CONSUMER, material.verification_key());
        let issuer = TokenIssuer::new(CONSUMER, "key-1", material, clock.clone());
        let verifier = IdentityVerifier::new(resolver, clock, VerifierConfig::default());

        // Re-sign the same input with the mirrored S value, as signers that
        // skip normalization do.
        let token = issuer.issue(PROVIDER, 60).unwrap();
        let (signing_input, signature) = token.rsplit_once('.').unwrap();
        let signature = URL_SAFE_NO_PAD.decode(signature).unwrap();
        let signature = k256::ecdsa::Signature::from_slice(&signature).unwrap();
        let (r, s) = signature.split_scalars();
        let high = k256::ecdsa::Signature::from_scalars(r, -s).unwrap();
        let token = format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(high.to_bytes()));

        let claim = verifier.verify(&token, PROVIDER).await.unwrap();
        assert_eq!(claim.issuer, CONSUMER);
    }

    #[tokio::test]
    async fn test_audience_mismatch() {
        let f = fixture(VerifierConfig::default());
        let token = f.issuer.issue("did:web:someone-else", 300).unwrap();
        let err = f.verifier.verify(&token, PROVIDER).await.unwrap_err();
        assert!(matches!(err, IdentityError::AudienceMismatch { .. }));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let f = fixture(VerifierConfig::default());
        let token = f.issuer.issue(PROVIDER, 60).unwrap();
        f.clock.advance(60 + 6);
        let err = f.verifier.verify(&token, PROVIDER).await.unwrap_err();
        assert!(matches!(err, IdentityError::TokenExpired { .. }));
    }

    #[tokio::test]
    async fn test_leeway_tolerates_small_skew() {
        let f = fixture(VerifierConfig::default());
        let token = f.issuer.issue(PROVIDER, 60).unwrap();
        f.clock.advance(63);
        assert!(f.verifier.verify(&token, PROVIDER).await.is_ok());
    }

    #[tokio::test]
    async fn test_tampered_claims_fail_signature() {
        let f = fixture(VerifierConfig::default());
        let token = f.issuer.issue(PROVIDER, 300).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = TokenClaims {
            iss: CONSUMER.into(),
            sub: CONSUMER.into(),
            aud: Audience::One(PROVIDER.into()),
            exp: NOW + 10_000,
            nbf: None,
            iat: None,
            jti: None,
            scope: None,
        };
        let forged_token = format!(
            "{}.{}.{}",
            parts[0],
            jws::encode_json(&forged).unwrap(),
            parts[2]
        );
        let err = f.verifier.verify(&forged_token, PROVIDER).await.unwrap_err();
        assert_eq!(err, IdentityError::SignatureInvalid);
    }

    #[tokio::test]
    async fn test_wrong_key_fails_signature() {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let resolver = Arc::new(StaticKeyResolver::new());
        resolver.register(
            CONSUMER,
            SigningKeyMaterial::ed25519(&[99u8; 32]).verification_key(),
        );
        let issuer = TokenIssuer::new(
            CONSUMER,
            "key-1",
            SigningKeyMaterial::ed25519(&[11u8; 32]),
            clock.clone(),
        );
        let verifier = IdentityVerifier::new(resolver, clock, VerifierConfig::default());
        let token = issuer.issue(PROVIDER, 300).unwrap();
        assert_eq!(
            verifier.verify(&token, PROVIDER).await.unwrap_err(),
            IdentityError::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn test_unknown_and_untrusted_issuers() {
        let f = fixture(VerifierConfig {
            trusted_issuers: vec!["did:web:issuer.example".into()],
            ..VerifierConfig::default()
        });
        let token = f.issuer.issue(PROVIDER, 300).unwrap();
        assert!(matches!(
            f.verifier.verify(&token, PROVIDER).await,
            Err(IdentityError::UntrustedIssuer(_))
        ));

        let clock = Arc::new(ManualTimeSource::new(NOW));
        let verifier = IdentityVerifier::new(
            Arc::new(StaticKeyResolver::new()),
            clock,
            VerifierConfig::default(),
        );
        assert!(matches!(
            verifier.verify(&token, PROVIDER).await,
            Err(IdentityError::UnknownIssuer { .. })
        ));
    }

    #[tokio::test]
    async fn test_replayed_token_rejected() {
        let f = fixture(VerifierConfig::default());
        let token = f.issuer.issue(PROVIDER, 300).unwrap();
        assert!(f.verifier.verify(&token, PROVIDER).await.is_ok());
        assert!(matches!(
            f.verifier.verify(&token, PROVIDER).await,
            Err(IdentityError::TokenReplayed(_))
        ));
    }

    #[tokio::test]
    async fn test_not_yet_valid() {
        let f = fixture(VerifierConfig::default());
        let header = TokenHeader {
            alg: "EdDSA".into(),
            kid: Some("key-1".into()),
            typ: Some("JWT".into()),
        };
        let claims = TokenClaims {
            iss: CONSUMER.into(),
            sub: CONSUMER.into(),
            aud: Audience::Many(vec![PROVIDER.into()]),
            exp: NOW + 600,
            nbf: Some(NOW + 300),
            iat: Some(NOW),
            jti: None,
            scope: None,
        };
        let token = f.issuer.sign(&header, &claims).unwrap();
        assert!(matches!(
            f.verifier.verify(&token, PROVIDER).await,
            Err(IdentityError::TokenNotYetValid { .. })
        ));
    }

    #[tokio::test]
    async fn test_self_issued_rule() {
        let f = fixture(VerifierConfig::default());
        let header = TokenHeader {
            alg: "EdDSA".into(),
            kid: None,
            typ: None,
        };
        let claims = TokenClaims {
            iss: CONSUMER.into(),
            sub: "did:web:mallory.example".into(),
            aud: Audience::One(PROVIDER.into()),
            exp: NOW + 600,
            nbf: None,
            iat: None,
            jti: None,
            scope: None,
        };
        let token = f.issuer.sign(&header, &claims).unwrap();
        assert!(matches!(
            f.verifier.verify(&token, PROVIDER).await,
            Err(IdentityError::SubjectMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_unsupported_algorithm_and_garbage() {
        let f = fixture(VerifierConfig::default());
        let header = TokenHeader {
            alg: "HS256".into(),
            kid: None,
            typ: None,
        };
        let claims = TokenClaims {
            iss: CONSUMER.into(),
            sub: CONSUMER.into(),
            aud: Audience::One(PROVIDER.into()),
            exp: NOW + 600,
            nbf: None,
            iat: None,
            jti: None,
            scope: None,
        };
        let token = format!(
            "{}.{}.{}",
            jws::encode_json(&header).unwrap(),
            jws::encode_json(&claims).unwrap(),
            jws::encode_segment(&[0u8; 32])
        );
        assert!(matches!(
            f.verifier.verify(&token, PROVIDER).await,
            Err(IdentityError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            f.verifier.verify("not-a-token", PROVIDER).await,
            Err(IdentityError::MalformedToken(_))
        ));
    }
}
