//! # Inbound Ports
//!
//! API offered to inbound protocol handlers.

use crate::domain::{IdentityClaim, IdentityError};
use async_trait::async_trait;

/// Token verification.
#[async_trait]
pub trait IdentityVerificationApi: Send + Sync {
    /// Verify `token` (optionally prefixed with `Bearer `) for `expected_audience`.
    async fn verify(
        &self,
        token: &str,
        expected_audience: &str,
    ) -> Result<IdentityClaim, IdentityError>;
}
