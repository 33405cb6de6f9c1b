//! # Acknowledgements and Error Bodies
//!
//! Synchronous responses returned for accepted and rejected messages.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::{Extensions, NegotiationState, TransferState};

/// `ContractNegotiation`: state of a negotiation as seen by the responder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractNegotiationAck {
    /// Consumer's process id.
    pub consumer_pid: String,
    /// Provider's process id.
    pub provider_pid: String,
    /// Current state.
    pub state: NegotiationState,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// `ContractNegotiationError`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractNegotiationErrorMessage {
    /// Consumer's process id, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_pid: Option<String>,
    /// Provider's process id, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_pid: Option<String>,
    /// Reason code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Language-tagged reasons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Vec<Value>>,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// `TransferProcess`: state of a transfer as seen by the responder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferProcessAck {
    /// Consumer's process id.
    pub consumer_pid: String,
    /// Provider's process id.
    pub provider_pid: String,
    /// Current state.
    pub state: TransferState,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// `TransferError`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferErrorMessage {
    /// Consumer's process id, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_pid: Option<String>,
    /// Provider's process id, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_pid: Option<String>,
    /// Reason code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Language-tagged reasons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Vec<Value>>,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Wrap a reason text in the language-tagged form used on the wire.
pub fn reason_values(text: &str) -> Vec<Value> {
    vec![json!({ "@value": text, "@language": "en" })]
}

/// First readable reason, accepting tagged values and plain strings.
pub fn reason_text(reasons: &[Value]) -> Option<String> {
    reasons.iter().find_map(|reason| match reason {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("@value")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    })
}
