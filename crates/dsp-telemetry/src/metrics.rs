//! Prometheus text exposition.
//!
//! Engine crates built with their `metrics` feature register counters in the
//! default registry; hosts serve the output of [`gather_metrics`].

use crate::TelemetryError;
use prometheus::{Encoder, TextEncoder};

/// Encode every metric of the default registry in the text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsEncode(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsEncode(e.to_string()))
}
