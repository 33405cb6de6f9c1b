//! # Negotiation Configuration

/// Reason recorded when the offer round bound is exceeded.
pub const REASON_EXHAUSTED: &str = "negotiation exhausted";

/// Reason recorded by the stale-process sweep.
pub const REASON_TIMED_OUT: &str = "negotiation timed out";

/// Engine settings, passed at construction.
#[derive(Clone, Debug)]
pub struct NegotiationConfig {
    /// Own DID; becomes the `assigner` of agreements we issue.
    pub participant_id: String,
    /// Own DSP base URL, sent as `callbackAddress`.
    pub callback_address: String,
    /// Offer/request rounds allowed before the negotiation is forced to end.
    pub max_offer_rounds: u32,
    /// Non-terminal processes idle longer than this are terminated by the sweep.
    pub process_timeout_secs: u64,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            participant_id: "did:web:localhost".to_string(),
            callback_address: "http://localhost:8282/api/dsp".to_string(),
            max_offer_rounds: 10,
            process_timeout_secs: 3_600,
        }
    }
}
