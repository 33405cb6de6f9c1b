//! # Negotiation Metrics
//!
//! Enable with the `metrics` feature.
//!
//! - `dsp_negotiation_transitions_total` - state changes, labeled by target state
//! - `dsp_negotiation_rejections_total` - refused messages, labeled by reason
//! - `dsp_negotiation_exhausted_total` - negotiations ended by the round bound

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// State changes by target state
    pub static ref NEGOTIATION_TRANSITIONS: IntCounterVec = register_int_counter_vec!(
        "dsp_negotiation_transitions_total",
        "Total number of negotiation state changes",
        &["state"]
    )
    .expect("Failed to create NEGOTIATION_TRANSITIONS metric");

    /// Refused messages by reason
    pub static ref NEGOTIATION_REJECTIONS: IntCounterVec = register_int_counter_vec!(
        "dsp_negotiation_rejections_total",
        "Total number of refused negotiation messages",
        &["reason"]
    )
    .expect("Failed to create NEGOTIATION_REJECTIONS metric");

    /// Negotiations ended by the round bound
    pub static ref NEGOTIATIONS_EXHAUSTED: IntCounter = register_int_counter!(
        "dsp_negotiation_exhausted_total",
        "Total number of negotiations terminated after too many offer rounds"
    )
    .expect("Failed to create NEGOTIATIONS_EXHAUSTED metric");
}

/// Record a state change
#[cfg(feature = "metrics")]
pub fn record_transition(state: &str) {
    NEGOTIATION_TRANSITIONS.with_label_values(&[state]).inc();
}

/// Record a refused message
#[cfg(feature = "metrics")]
pub fn record_rejection(reason: &str) {
    NEGOTIATION_REJECTIONS.with_label_values(&[reason]).inc();
}

/// Record a negotiation ended by the round bound
#[cfg(feature = "metrics")]
pub fn record_exhausted() {
    NEGOTIATIONS_EXHAUSTED.inc();
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

/// Record a negotiation ended by the round bound (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_exhausted() {}
