//! # Transfer Metrics
//!
//! Enable with the `metrics` feature.
//!
//! - `dsp_transfer_transitions_total` - state changes, labeled by target state
//! - `dsp_transfer_rejections_total` - refused messages, labeled by reason

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter_vec, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// State changes by target state
    pub static ref TRANSFER_TRANSITIONS: IntCounterVec = register_int_counter_vec!(
        "dsp_transfer_transitions_total",
        "Total number of transfer state changes",
        &["state"]
    )
    .expect("Failed to create TRANSFER_TRANSITIONS metric");

    /// Refused messages by reason
    pub static ref TRANSFER_REJECTIONS: IntCounterVec = register_int_counter_vec!(
        "dsp_transfer_rejections_total",
        "Total number of refused transfer messages",
        &["reason"]
    )
    .expect("Failed to create TRANSFER_REJECTIONS metric");
}

/// Record a state change
#[cfg(feature = "metrics")]
pub fn record_transition(state: &str) {
    TRANSFER_TRANSITIONS.with_label_values(&[state]).inc();
}

/// Record a refused message
#[cfg(feature = "metrics")]
pub fn record_rejection(reason: &str) {
    TRANSFER_REJECTIONS.with_label_values(&[reason]).inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

/// Record a state change (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_transition(_state: &str) {}

/// Record a refused message (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_rejection(_reason: &str) {}
