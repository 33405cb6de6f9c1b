//! # DSP-01 Identity Verifier
//!
//! Authenticates every inbound protocol message against the caller's
//! decentralized identifier (DID).
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Tokens are compact JWS strings signed with `EdDSA` (Ed25519), `ES256K`
//! (secp256k1) or `ES256` (P-256). Verification yields an [`IdentityClaim`] that lives only for
//! the request it authenticates; nothing about a verified token is cached
//! apart from its `jti`, which is remembered until expiry to reject replays.
//!
//! ## Checks (in order)
//!
//! | Step | Failure |
//! |------|---------|
//! | compact JWS shape, JSON header and claims | `MalformedToken` |
//! | supported `alg` | `UnsupportedAlgorithm` |
//! | issuer in trusted set | `UntrustedIssuer` |
//! | key resolution for `iss`/`kid` | `UnknownIssuer` |
//! | signature | `SignatureInvalid` |
//! | `exp` (with leeway) | `TokenExpired` |
//! | `nbf` (with leeway) | `TokenNotYetValid` |
//! | `aud` contains expected audience | `AudienceMismatch` |
//! | `iss == sub` when self-issued tokens are required | `SubjectMismatch` |
//! | `jti` not seen before | `TokenReplayed` |
//!
//! ## Module Structure
//!
//! ```text
//! dsp-01-identity-verifier/
//! ├── domain/          # claims, keys, JWS parsing, did:web mapping, replay guard
//! ├── ports/           # IdentityVerificationApi, KeyResolver, DidDocumentFetcher
//! ├── adapters/        # StaticKeyResolver, DidWebKeyResolver
//! ├── issuer.rs        # TokenIssuer for outbound calls
//! └── service.rs       # IdentityVerifier
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod issuer;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{DidWebKeyResolver, StaticKeyResolver};
pub use domain::{
    Audience, IdentityClaim, IdentityError, Jwk, SigningAlgorithm, TokenClaims, TokenHeader,
    VerificationKey, VerifierConfig,
};
pub use issuer::{IssueError, SigningKeyMaterial, TokenIssuer};
pub use ports::{DidDocumentFetcher, IdentityVerificationApi, KeyResolutionError, KeyResolver};
pub use service::IdentityVerifier;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
