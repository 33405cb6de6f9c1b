//! # DSP Telemetry
//!
//! Logging setup and metrics exposition for connector hosts.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dsp_telemetry::{init_tracing, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_tracing(&config).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DSP_SERVICE_NAME` | `dsp-connector` | Service name attached to logs |
//! | `DSP_LOG_LEVEL` | `info` | Log filter, falls back to `RUST_LOG` |
//! | `DSP_LOG_FORMAT` | `pretty` (`json` in containers) | `pretty` or `json` |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod metrics;
mod tracing_setup;

pub use config::{LogFormat, TelemetryConfig};
pub use metrics::gather_metrics;
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A global subscriber is already installed, or the filter is invalid.
    #[error("Failed to initialize tracing: {0}")]
    TracerInit(String),

    /// Metrics could not be encoded.
    #[error("Failed to encode metrics: {0}")]
    MetricsEncode(String),

    /// Unusable configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
