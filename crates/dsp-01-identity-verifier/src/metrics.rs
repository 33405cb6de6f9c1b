//! # Identity Metrics
//!
//! Prometheus counters for token verification.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! dsp-01-identity-verifier = { path = "...", features = ["metrics"] }
//! ```
//!
//! - `dsp_tokens_verified_total` - tokens accepted
//! - `dsp_tokens_rejected_total` - tokens rejected, labeled by reason

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Tokens accepted
    pub static ref TOKENS_VERIFIED: IntCounter = register_int_counter!(
        "dsp_tokens_verified_total",
        "Total number of access tokens accepted"
    )
    .expect("Failed to create TOKENS_VERIFIED metric");

    /// Tokens rejected, labeled by reason
    pub static ref TOKENS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "dsp_tokens_rejected_total",
        "Total number of access tokens rejected",
        &["reason"]
    )
    .expect("Failed to create TOKENS_REJECTED metric");
}

/// Record an accepted token
#[cfg(feature = "metrics")]
pub fn record_token_verified() {
    TOKENS_VERIFIED.inc();
}

/// Record a rejected token
#[cfg(feature = "metrics")]
pub fn record_token_rejected(reason: &str) {
    TOKENS_REJECTED.with_label_values(&[reason]).inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

/// Record an accepted token (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_token_verified() {}

/// Record a rejected token (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_token_rejected(_reason: &str) {}
