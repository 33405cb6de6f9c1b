//! # Core Entities
//!
//! Identifiers, roles and opaque payload types used across the workspace.

use crate::errors::InvalidProcessId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Unknown JSON members preserved verbatim. Ordered so encoding is deterministic.
pub type Extensions = BTreeMap<String, serde_json::Value>;

/// Locally assigned process identifier.
///
/// Rendered as a `urn:uuid:` URN on the wire. Parsing also accepts a bare UUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProcessId(Uuid);

impl ProcessId {
    /// Assign a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "urn:uuid:{}", self.0)
    }
}

impl FromStr for ProcessId {
    type Err = InvalidProcessId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("urn:uuid:").unwrap_or(s);
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| InvalidProcessId(s.to_string()))
    }
}

impl TryFrom<String> for ProcessId {
    type Error = InvalidProcessId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProcessId> for String {
    fn from(id: ProcessId) -> Self {
        id.to_string()
    }
}

/// Side of the exchange a process belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Party requesting access to a resource.
    Consumer,
    /// Party offering the resource.
    Provider,
}

impl Role {
    /// The role of the other party.
    pub fn counterpart(self) -> Self {
        match self {
            Role::Consumer => Role::Provider,
            Role::Provider => Role::Consumer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Consumer => f.write_str("CONSUMER"),
            Role::Provider => f.write_str("PROVIDER"),
        }
    }
}

/// Why a process ended up terminated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationDetail {
    /// Machine readable reason code.
    pub code: Option<String>,
    /// Human readable reason.
    pub reason: Option<String>,
}

impl TerminationDetail {
    /// Detail with only a reason text.
    pub fn reason(reason: impl Into<String>) -> Self {
        Self {
            code: None,
            reason: Some(reason.into()),
        }
    }
}

/// Access coordinates for a started transfer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAddress {
    /// JSON-LD type marker, normally `DataAddress`.
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Endpoint type IRI, e.g. `https://w3id.org/idsa/v4.1/HTTP`.
    pub endpoint_type: String,
    /// Endpoint URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Additional endpoint properties such as an authorization token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_properties: Option<Vec<EndpointProperty>>,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl DataAddress {
    /// HTTP pull address with an optional authorization property.
    pub fn http(endpoint: impl Into<String>, authorization: Option<String>) -> Self {
        Self {
            kind: Some("DataAddress".to_string()),
            endpoint_type: "https://w3id.org/idsa/v4.1/HTTP".to_string(),
            endpoint: Some(endpoint.into()),
            endpoint_properties: authorization.map(|token| {
                vec![EndpointProperty {
                    kind: Some("EndpointProperty".to_string()),
                    name: "authorization".to_string(),
                    value: token,
                    extensions: Extensions::new(),
                }]
            }),
            extensions: Extensions::new(),
        }
    }
}

/// Name/value pair attached to a [`DataAddress`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EndpointProperty {
    /// JSON-LD type marker.
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Property name.
    pub name: String,
    /// Property value.
    pub value: String,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}
