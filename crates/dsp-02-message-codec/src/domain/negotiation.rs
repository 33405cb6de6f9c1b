//! # Negotiation Messages
//!
//! Contract negotiation messages of protocol version 2025-1.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{Extensions, Policy, Role};
use std::fmt;

/// `ContractRequestMessage`, sent by the consumer to open or counter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRequestMessage {
    /// Consumer's process id.
    pub consumer_pid: String,
    /// Provider's process id; absent on the initial request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_pid: Option<String>,
    /// Proposed terms.
    pub offer: Policy,
    /// Consumer callback; mandatory on the initial request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_address: Option<String>,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// `ContractOfferMessage`, sent by the provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractOfferMessage {
    /// Provider's process id.
    pub provider_pid: String,
    /// Consumer's process id; absent when the provider initiates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_pid: Option<String>,
    /// Offered terms.
    pub offer: Policy,
    /// Provider callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_address: Option<String>,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Event carried by [`ContractNegotiationEventMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationEventType {
    /// Consumer accepts the current offer.
    Accepted,
    /// Provider concludes the negotiation.
    Finalized,
}

/// `ContractNegotiationEventMessage`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractNegotiationEventMessage {
    /// Consumer's process id.
    pub consumer_pid: String,
    /// Provider's process id.
    pub provider_pid: String,
    /// Event.
    pub event_type: NegotiationEventType,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// `ContractAgreementMessage`, sent by the provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAgreementMessage {
    /// Consumer's process id.
    pub consumer_pid: String,
    /// Provider's process id.
    pub provider_pid: String,
    /// Agreed terms.
    pub agreement: Policy,
    /// Provider callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_address: Option<String>,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// `ContractAgreementVerificationMessage`, sent by the consumer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAgreementVerificationMessage {
    /// Consumer's process id.
    pub consumer_pid: String,
    /// Provider's process id.
    pub provider_pid: String,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// `ContractNegotiationTerminationMessage`, sent by either party.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractNegotiationTerminationMessage {
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

/// What a negotiation message asks the state machine to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NegotiationMessageKind {
    /// Initial or counter request.
    Request,
    /// Initial or counter offer.
    Offer,
    /// `ACCEPTED` event.
    Accepted,
    /// Agreement delivery.
    Agreement,
    /// Agreement verification.
    Verification,
    /// `FINALIZED` event.
    Finalized,
    /// Termination.
    Termination,
}

impl NegotiationMessageKind {
    /// Every kind, for exhaustive table tests.
    pub const ALL: [NegotiationMessageKind; 7] = [
        Self::Request,
        Self::Offer,
        Self::Accepted,
        Self::Agreement,
        Self::Verification,
        Self::Finalized,
        Self::Termination,
    ];

    /// Role allowed to send this kind; `None` when either may.
    pub fn sender(&self) -> Option<Role> {
        match self {
            Self::Request | Self::Accepted | Self::Verification => Some(Role::Consumer),
            Self::Offer | Self::Agreement | Self::Finalized => Some(Role::Provider),
            Self::Termination => None,
        }
    }
}

impl fmt::Display for NegotiationMessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Any contract negotiation message.
#[derive(Clone, Debug, PartialEq)]
pub enum NegotiationMessage {
    /// `ContractRequestMessage`
    Request(ContractRequestMessage),
    /// `ContractOfferMessage`
    Offer(ContractOfferMessage),
    /// `ContractNegotiationEventMessage`
    Event(ContractNegotiationEventMessage),
    /// `ContractAgreementMessage`
    Agreement(ContractAgreementMessage),
    /// `ContractAgreementVerificationMessage`
    Verification(ContractAgreementVerificationMessage),
    /// `ContractNegotiationTerminationMessage`
    Termination(ContractNegotiationTerminationMessage),
}

impl NegotiationMessage {
    /// Transition kind.
    pub fn kind(&self) -> NegotiationMessageKind {
        match self {
            Self::Request(_) => NegotiationMessageKind::Request,
            Self::Offer(_) => NegotiationMessageKind::Offer,
            Self::Event(e) => match e.event_type {
                NegotiationEventType::Accepted => NegotiationMessageKind::Accepted,
                NegotiationEventType::Finalized => NegotiationMessageKind::Finalized,
            },
            Self::Agreement(_) => NegotiationMessageKind::Agreement,
            Self::Verification(_) => NegotiationMessageKind::Verification,
            Self::Termination(_) => NegotiationMessageKind::Termination,
        }
    }

    /// JSON-LD `@type`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Request(_) => "ContractRequestMessage",
            Self::Offer(_) => "ContractOfferMessage",
            Self::Event(_) => "ContractNegotiationEventMessage",
            Self::Agreement(_) => "ContractAgreementMessage",
            Self::Verification(_) => "ContractAgreementVerificationMessage",
            Self::Termination(_) => "ContractNegotiationTerminationMessage",
        }
    }

    /// Consumer's process id, when carried.
    pub fn consumer_pid(&self) -> Option<&str> {
        match self {
            Self::Request(m) => Some(&m.consumer_pid),
            Self::Offer(m) => m.consumer_pid.as_deref(),
            Self::Event(m) => Some(&m.consumer_pid),
            Self::Agreement(m) => Some(&m.consumer_pid),
            Self::Verification(m) => Some(&m.consumer_pid),
            Self::Termination(m) => Some(&m.consumer_pid),
        }
    }

    /// Provider's process id, when carried.
    pub fn provider_pid(&self) -> Option<&str> {
        match self {
            Self::Request(m) => m.provider_pid.as_deref(),
            Self::Offer(m) => Some(&m.provider_pid),
            Self::Event(m) => Some(&m.provider_pid),
            Self::Agreement(m) => Some(&m.provider_pid),
            Self::Verification(m) => Some(&m.provider_pid),
            Self::Termination(m) => Some(&m.provider_pid),
        }
    }
}
