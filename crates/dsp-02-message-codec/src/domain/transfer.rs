//! # Transfer Messages
//!
//! Transfer process messages of protocol version 2025-1.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{DataAddress, Extensions, Role, TransferState};
use std::fmt;

/// `TransferRequestMessage`, sent by the consumer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequestMessage {
    /// Consumer's process id.
    pub consumer_pid: String,
    /// Agreement the transfer is governed by.
    pub agreement_id: String,
    /// Requested transfer format, e.g. `HttpData-PULL`.
    pub format: String,
    /// Consumer callback.
    pub callback_address: String,
    /// Destination for push transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_address: Option<DataAddress>,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// `TransferStartMessage`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferStartMessage {
    /// Consumer's process id.
    pub consumer_pid: String,
    /// Provider's process id.
    pub provider_pid: String,
    /// Access coordinates for pull transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_address: Option<DataAddress>,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// `TransferSuspensionMessage`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSuspensionMessage {
    /// Consumer's process id.
    pub consumer_pid: String,
    /// Provider's process id.
    pub provider_pid: String,
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

/// `TransferCompletionMessage`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCompletionMessage {
    /// Consumer's process id.
    pub consumer_pid: String,
    /// Provider's process id.
    pub provider_pid: String,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// `TransferTerminationMessage`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTerminationMessage {
    /// Consumer's process id.
    pub consumer_pid: String,
    /// Provider's process id.
    pub provider_pid: String,
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

/// What a transfer message asks the state machine to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferMessageKind {
    /// Open a transfer.
    Request,
    /// Start or resume.
    Start,
    /// Pause.
    Suspension,
    /// Finish.
    Completion,
    /// Abort.
    Termination,
}

impl TransferMessageKind {
    /// Every kind, for exhaustive table tests.
    pub const ALL: [TransferMessageKind; 5] = [
        Self::Request,
        Self::Start,
        Self::Suspension,
        Self::Completion,
        Self::Termination,
    ];

    /// State the message drives the process to.
    pub fn target_state(&self) -> TransferState {
        match self {
            Self::Request => TransferState::Requested,
            Self::Start => TransferState::Started,
            Self::Suspension => TransferState::Suspended,
            Self::Completion => TransferState::Completed,
            Self::Termination => TransferState::Terminated,
        }
    }

    /// Role that must send this kind from `from`; `None` when either may.
    pub fn sender(&self, from: Option<TransferState>) -> Option<Role> {
        match (self, from) {
            (Self::Request, _) => Some(Role::Consumer),
            (Self::Start, Some(TransferState::Suspended)) => None,
            (Self::Start, _) => Some(Role::Provider),
            _ => None,
        }
    }
}

impl fmt::Display for TransferMessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Any transfer process message.
#[derive(Clone, Debug, PartialEq)]
pub enum TransferMessage {
    /// `TransferRequestMessage`
    Request(TransferRequestMessage),
    /// `TransferStartMessage`
    Start(TransferStartMessage),
    /// `TransferSuspensionMessage`
    Suspension(TransferSuspensionMessage),
    /// `TransferCompletionMessage`
    Completion(TransferCompletionMessage),
    /// `TransferTerminationMessage`
    Termination(TransferTerminationMessage),
}

impl TransferMessage {
    /// Transition kind.
    pub fn kind(&self) -> TransferMessageKind {
        match self {
            Self::Request(_) => TransferMessageKind::Request,
            Self::Start(_) => TransferMessageKind::Start,
            Self::Suspension(_) => TransferMessageKind::Suspension,
            Self::Completion(_) => TransferMessageKind::Completion,
            Self::Termination(_) => TransferMessageKind::Termination,
        }
    }

    /// JSON-LD `@type`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Request(_) => "TransferRequestMessage",
            Self::Start(_) => "TransferStartMessage",
            Self::Suspension(_) => "TransferSuspensionMessage",
            Self::Completion(_) => "TransferCompletionMessage",
            Self::Termination(_) => "TransferTerminationMessage",
        }
    }

    /// Consumer's process id.
    pub fn consumer_pid(&self) -> &str {
        match self {
            Self::Request(m) => &m.consumer_pid,
            Self::Start(m) => &m.consumer_pid,
            Self::Suspension(m) => &m.consumer_pid,
            Self::Completion(m) => &m.consumer_pid,
            Self::Termination(m) => &m.consumer_pid,
        }
    }

    /// Provider's process id; absent only on requests.
    pub fn provider_pid(&self) -> Option<&str> {
        match self {
            Self::Request(_) => None,
            Self::Start(m) => Some(&m.provider_pid),
            Self::Suspension(m) => Some(&m.provider_pid),
            Self::Completion(m) => Some(&m.provider_pid),
            Self::Termination(m) => Some(&m.provider_pid),
        }
    }
}
