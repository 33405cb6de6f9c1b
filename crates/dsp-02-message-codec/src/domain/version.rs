//! # Version Metadata
//!
//! Body served at `/.well-known/dspace-version`.

use serde::{Deserialize, Serialize};

/// Protocol version this engine speaks.
pub const PROTOCOL_VERSION: &str = "2025-1";

/// Path prefix of the 2025-1 endpoints.
pub const PROTOCOL_PATH: &str = "/2025/1";

/// One supported protocol version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersion {
    /// Version label.
    pub version: String,
    /// Path relative to the connector's DSP base URL.
    pub path: String,
    /// Transport binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
}

/// Version discovery document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMetadata {
    /// Supported versions.
    pub protocol_versions: Vec<ProtocolVersion>,
}

/// Versions advertised by this engine.
pub fn supported_versions() -> VersionMetadata {
    VersionMetadata {
        protocol_versions: vec![ProtocolVersion {
            version: PROTOCOL_VERSION.to_string(),
            path: PROTOCOL_PATH.to_string(),
            binding: Some("HTTPS".to_string()),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_document_shape() {
        let json = serde_json::to_value(supported_versions()).unwrap();
        assert_eq!(json["protocolVersions"][0]["version"], "2025-1");
        assert_eq!(json["protocolVersions"][0]["path"], "/2025/1");
        assert_eq!(json["protocolVersions"][0]["binding"], "HTTPS");
    }
}
