//! # Protocol Message Envelope

use super::acks::{
    ContractNegotiationAck, ContractNegotiationErrorMessage, TransferErrorMessage,
    TransferProcessAck,
};
use super::context::default_context;
use super::negotiation::NegotiationMessage;
use super::transfer::TransferMessage;
use serde_json::Value;

/// Any message the engine sends or receives.
#[derive(Clone, Debug, PartialEq)]
pub enum ProtocolMessage {
    /// Negotiation state-changing message.
    Negotiation(NegotiationMessage),
    /// `ContractNegotiation` acknowledgement.
    NegotiationAck(ContractNegotiationAck),
    /// `ContractNegotiationError`.
    NegotiationError(ContractNegotiationErrorMessage),
    /// Transfer state-changing message.
    Transfer(TransferMessage),
    /// `TransferProcess` acknowledgement.
    TransferAck(TransferProcessAck),
    /// `TransferError`.
    TransferError(TransferErrorMessage),
}

impl ProtocolMessage {
    /// JSON-LD `@type`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Negotiation(m) => m.type_name(),
            Self::NegotiationAck(_) => "ContractNegotiation",
            Self::NegotiationError(_) => "ContractNegotiationError",
            Self::Transfer(m) => m.type_name(),
            Self::TransferAck(_) => "TransferProcess",
            Self::TransferError(_) => "TransferError",
        }
    }
}

impl From<NegotiationMessage> for ProtocolMessage {
    fn from(message: NegotiationMessage) -> Self {
        ProtocolMessage::Negotiation(message)
    }
}

impl From<TransferMessage> for ProtocolMessage {
    fn from(message: TransferMessage) -> Self {
        ProtocolMessage::Transfer(message)
    }
}

/// A decoded message together with the `@context` it arrived with.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    /// `@context` as received, or the default context for outbound messages.
    pub context: Value,
    /// The typed message.
    pub message: ProtocolMessage,
}

impl Envelope {
    /// Wrap a message with the default 2025-1 context.
    pub fn new(message: impl Into<ProtocolMessage>) -> Self {
        Self {
            context: default_context(),
            message: message.into(),
        }
    }
}
