//! # Codec
//!
//! Conversion between compact JSON-LD payloads and [`Envelope`] values.
//!
//! Decoding checks, in order: JSON object, `@context`, `@type`, the members
//! required by the message type, then cross-member rules (non-empty process
//! ids, callback on initial requests). Encoding emits members in sorted order.

use crate::domain::context::references_dspace_context;
use crate::domain::{
    CodecError, ContractNegotiationAck, ContractNegotiationErrorMessage, Envelope,
    NegotiationMessage, ProtocolMessage, TransferErrorMessage, TransferMessage,
    TransferProcessAck,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Decode a payload.
pub fn decode(bytes: &[u8]) -> Result<Envelope, CodecError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| CodecError::InvalidJson(e.to_string()))?;
    decode_value(value)
}

/// Decode an already parsed payload.
pub fn decode_value(value: Value) -> Result<Envelope, CodecError> {
    let Value::Object(mut members) = value else {
        return Err(CodecError::NotAnObject);
    };

    let context = members
        .remove("@context")
        .ok_or(CodecError::UnsupportedContext)?;
    if !references_dspace_context(&context) {
        return Err(CodecError::UnsupportedContext);
    }

    let type_name = match members.remove("@type") {
        Some(Value::String(t)) => t,
        _ => return Err(CodecError::MissingType),
    };

    let body = Value::Object(members);
    let message = match type_name.as_str() {
        "ContractRequestMessage" => negotiation(NegotiationMessage::Request(parse(&type_name, body)?)),
        "ContractOfferMessage" => negotiation(NegotiationMessage::Offer(parse(&type_name, body)?)),
        "ContractNegotiationEventMessage" => {
            negotiation(NegotiationMessage::Event(parse(&type_name, body)?))
        }
        "ContractAgreementMessage" => {
            negotiation(NegotiationMessage::Agreement(parse(&type_name, body)?))
        }
        "ContractAgreementVerificationMessage" => {
            negotiation(NegotiationMessage::Verification(parse(&type_name, body)?))
        }
        "ContractNegotiationTerminationMessage" => {
            negotiation(NegotiationMessage::Termination(parse(&type_name, body)?))
        }
        "ContractNegotiation" => {
            ProtocolMessage::NegotiationAck(parse::<ContractNegotiationAck>(&type_name, body)?)
        }
        "ContractNegotiationError" => ProtocolMessage::NegotiationError(parse::<
            ContractNegotiationErrorMessage,
        >(&type_name, body)?),
        "TransferRequestMessage" => transfer(TransferMessage::Request(parse(&type_name, body)?)),
        "TransferStartMessage" => transfer(TransferMessage::Start(parse(&type_name, body)?)),
        "TransferSuspensionMessage" => {
            transfer(TransferMessage::Suspension(parse(&type_name, body)?))
        }
        "TransferCompletionMessage" => {
            transfer(TransferMessage::Completion(parse(&type_name, body)?))
        }
        "TransferTerminationMessage" => {
            transfer(TransferMessage::Termination(parse(&type_name, body)?))
        }
        "TransferProcess" => {
            ProtocolMessage::TransferAck(parse::<TransferProcessAck>(&type_name, body)?)
        }
        "TransferError" => {
            ProtocolMessage::TransferError(parse::<TransferErrorMessage>(&type_name, body)?)
        }
        other => {
            debug!("[dsp-02] rejecting unknown message type {}", other);
            return Err(CodecError::UnknownMessageType(other.to_string()));
        }
    };

    validate(&message)?;
    Ok(Envelope { context, message })
}

/// Encode to a JSON value with `@context` and `@type` restored.
pub fn encode_value(envelope: &Envelope) -> Result<Value, CodecError> {
    let mut members = match &envelope.message {
        ProtocolMessage::Negotiation(m) => match m {
            NegotiationMessage::Request(inner) => to_members(inner)?,
            NegotiationMessage::Offer(inner) => to_members(inner)?,
            NegotiationMessage::Event(inner) => to_members(inner)?,
            NegotiationMessage::Agreement(inner) => to_members(inner)?,
            NegotiationMessage::Verification(inner) => to_members(inner)?,
            NegotiationMessage::Termination(inner) => to_members(inner)?,
        },
        ProtocolMessage::NegotiationAck(inner) => to_members(inner)?,
        ProtocolMessage::NegotiationError(inner) => to_members(inner)?,
        ProtocolMessage::Transfer(m) => match m {
            TransferMessage::Request(inner) => to_members(inner)?,
            TransferMessage::Start(inner) => to_members(inner)?,
            TransferMessage::Suspension(inner) => to_members(inner)?,
            TransferMessage::Completion(inner) => to_members(inner)?,
            TransferMessage::Termination(inner) => to_members(inner)?,
        },
        ProtocolMessage::TransferAck(inner) => to_members(inner)?,
        ProtocolMessage::TransferError(inner) => to_members(inner)?,
    };

    members.insert("@context".to_string(), envelope.context.clone());
    members.insert(
        "@type".to_string(),
        Value::String(envelope.message.type_name().to_string()),
    );
    Ok(Value::Object(members))
}

/// Encode to bytes.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, CodecError> {
    let value = encode_value(envelope)?;
    serde_json::to_vec(&value).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Encode a message under the default context.
pub fn encode_message(message: &ProtocolMessage) -> Result<Vec<u8>, CodecError> {
    encode(&Envelope::new(message.clone()))
}

/// SHA-256 over the canonical encoding.
pub fn digest(envelope: &Envelope) -> Result<[u8; 32], CodecError> {
    let bytes = encode(envelope)?;
    Ok(Sha256::digest(&bytes).into())
}

fn negotiation(message: NegotiationMessage) -> ProtocolMessage {
    ProtocolMessage::Negotiation(message)
}

fn transfer(message: TransferMessage) -> ProtocolMessage {
    ProtocolMessage::Transfer(message)
}

fn parse<T: DeserializeOwned>(type_name: &str, body: Value) -> Result<T, CodecError> {
    serde_json::from_value(body).map_err(|e| CodecError::malformed(type_name, e.to_string()))
}

fn to_members<T: Serialize>(message: &T) -> Result<Map<String, Value>, CodecError> {
    match serde_json::to_value(message) {
        Ok(Value::Object(members)) => Ok(members),
        Ok(_) => Err(CodecError::Serialization("message is not an object".into())),
        Err(e) => Err(CodecError::Serialization(e.to_string())),
    }
}

fn require_id(type_name: &str, field: &str, value: &str) -> Result<(), CodecError> {
    if value.trim().is_empty() {
        return Err(CodecError::malformed(type_name, format!("{field} is empty")));
    }
    Ok(())
}

fn validate(message: &ProtocolMessage) -> Result<(), CodecError> {
    let type_name = message.type_name();
    match message {
        ProtocolMessage::Negotiation(m) => {
            if let Some(pid) = m.consumer_pid() {
                require_id(type_name, "consumerPid", pid)?;
            }
            if let Some(pid) = m.provider_pid() {
                require_id(type_name, "providerPid", pid)?;
            }
            if let NegotiationMessage::Request(request) = m {
                let has_callback = request
                    .callback_address
                    .as_deref()
                    .is_some_and(|c| !c.trim().is_empty());
                if request.provider_pid.is_none() && !has_callback {
                    return Err(CodecError::malformed(
                        type_name,
                        "callbackAddress is required on an initial request",
                    ));
                }
            }
        }
        ProtocolMessage::Transfer(m) => {
            require_id(type_name, "consumerPid", m.consumer_pid())?;
            if let Some(pid) = m.provider_pid() {
                require_id(type_name, "providerPid", pid)?;
            }
            if let TransferMessage::Request(request) = m {
                require_id(type_name, "agreementId", &request.agreement_id)?;
                require_id(type_name, "format", &request.format)?;
                require_id(type_name, "callbackAddress", &request.callback_address)?;
            }
        }
        ProtocolMessage::NegotiationAck(ack) => {
            require_id(type_name, "consumerPid", &ack.consumer_pid)?;
            require_id(type_name, "providerPid", &ack.provider_pid)?;
        }
        ProtocolMessage::TransferAck(ack) => {
            require_id(type_name, "consumerPid", &ack.consumer_pid)?;
            require_id(type_name, "providerPid", &ack.provider_pid)?;
        }
        ProtocolMessage::NegotiationError(_) | ProtocolMessage::TransferError(_) => {}
    }
    Ok(())
}
