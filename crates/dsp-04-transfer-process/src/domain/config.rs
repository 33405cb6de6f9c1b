//! # Transfer Configuration

/// Reason recorded by the stale-process sweep.
pub const REASON_TIMED_OUT: &str = "transfer timed out";

/// Engine settings, passed at construction.
#[derive(Clone, Debug)]
pub struct TransferConfig {
    /// Own DSP base URL, sent as `callbackAddress`.
    pub callback_address: String,
    /// Format requested by `initiate`.
    pub default_format: String,
    /// Non-terminal processes idle longer than this are terminated by the sweep.
    pub process_timeout_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            callback_address: "http://localhost:8282/api/dsp".to_string(),
            default_format: "HttpData-PULL".to_string(),
            process_timeout_secs: 3_600,
        }
    }
}
