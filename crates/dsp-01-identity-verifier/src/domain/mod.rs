//! Domain layer for identity verification.

pub mod did;
pub mod entities;
pub mod errors;
pub mod jws;
pub mod keys;
pub mod replay;

pub use entities::{
    Audience, IdentityClaim, SigningAlgorithm, TokenClaims, TokenHeader, VerifierConfig,
};
pub use errors::IdentityError;
pub use keys::{Jwk, VerificationKey};
pub use replay::ReplayGuard;
