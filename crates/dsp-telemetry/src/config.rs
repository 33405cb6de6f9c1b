//! Telemetry configuration from environment variables.

use crate::TelemetryError;
use std::env;
use std::str::FromStr;

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable output for development.
    Pretty,
    /// One JSON object per line for log shippers.
    Json,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(TelemetryError::Config(format!("unknown log format '{other}'"))),
        }
    }
}

/// Configuration for logging.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to log lines
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error or a directive list)
    pub log_level: String,

    /// Output format
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "dsp-connector".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DSP_SERVICE_NAME`: Service name (default: dsp-connector)
    /// - `DSP_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `DSP_LOG_FORMAT`: `pretty` or `json` (default: json in containers)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();
        let default_format = if is_container {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        Self {
            service_name: env::var("DSP_SERVICE_NAME")
                .unwrap_or_else(|_| "dsp-connector".to_string()),

            log_level: env::var("DSP_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            log_format: env::var("DSP_LOG_FORMAT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_format),
        }
    }

    /// Same configuration under another service name.
    pub fn for_service(mut self, service_name: &str) -> Self {
        self.service_name = service_name.to_string();
        self
    }
}
