//! # Protocol Transport
//!
//! [`Transport`] over a [`WireClient`]:
//!
//! ```text
//! message ──> endpoint for recipient ──> encode ──> sign token (aud = counterparty)
//!         ──> POST ──> 2xx: decode ack | non-2xx: read error body ──> DeliveryError
//! ```

use crate::endpoint::Endpoint;
use crate::ports::{WireClient, WireRequest};
use async_trait::async_trait;
use dsp_01_identity_verifier::TokenIssuer;
use dsp_02_message_codec::{
    decode, encode_message, reason_text, DeliveryError, ProtocolMessage, Transport,
};
use shared_types::Role;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outbound delivery of protocol messages.
pub struct DspTransport {
    wire: Arc<dyn WireClient>,
    issuer: Arc<TokenIssuer>,
    token_ttl_secs: u64,
}

impl DspTransport {
    /// Transport posting through `wire` with tokens from `issuer`.
    pub fn new(wire: Arc<dyn WireClient>, issuer: Arc<TokenIssuer>, token_ttl_secs: u64) -> Self {
        Self {
            wire,
            issuer,
            token_ttl_secs,
        }
    }
}

#[async_trait]
impl Transport for DspTransport {
    async fn send(
        &self,
        counterparty_id: &str,
        counterparty_address: &str,
        recipient: Role,
        message: &ProtocolMessage,
    ) -> Result<Option<ProtocolMessage>, DeliveryError> {
        let message_type = message.type_name();
        let endpoint = Endpoint::for_message(message, recipient).ok_or_else(|| {
            DeliveryError::Preparation(format!("no {recipient} endpoint for {message_type}"))
        })?;
        let url = endpoint.url(counterparty_address);
        let body =
            encode_message(message).map_err(|e| DeliveryError::Preparation(e.to_string()))?;
        let token = self
            .issuer
            .issue(counterparty_id, self.token_ttl_secs)
            .map_err(|e| DeliveryError::Preparation(e.to_string()))?;

        debug!("[dsp-connector] POST {} ({})", url, message_type);
        let response = self
            .wire
            .post(WireRequest {
                url: url.clone(),
                authorization: format!("Bearer {token}"),
                body,
            })
            .await
            .map_err(|e| DeliveryError::Unreachable {
                address: url.clone(),
                reason: e.to_string(),
            })?;

        if !(200..300).contains(&response.status) {
            let (code, reason) = error_details(&response.body);
            warn!(
                "[dsp-connector] {} rejected {} with {} ({})",
                url,
                message_type,
                response.status,
                code.as_deref().unwrap_or("-")
            );
            return Err(DeliveryError::Rejected {
                message_type: message_type.to_string(),
                status: response.status,
                code,
                reason,
            });
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let envelope =
            decode(&response.body).map_err(|e| DeliveryError::InvalidAck(e.to_string()))?;
        match envelope.message {
            ack @ (ProtocolMessage::NegotiationAck(_) | ProtocolMessage::TransferAck(_)) => {
                Ok(Some(ack))
            }
            other => Err(DeliveryError::InvalidAck(format!(
                "expected an acknowledgement, got {}",
                other.type_name()
            ))),
        }
    }
}

/// Reason code and text of an error body, when it decodes.
fn error_details(body: &[u8]) -> (Option<String>, Option<String>) {
    match decode(body).map(|envelope| envelope.message) {
        Ok(ProtocolMessage::NegotiationError(e)) => {
            (e.code, e.reason.as_deref().and_then(reason_text))
        }
        Ok(ProtocolMessage::TransferError(e)) => (e.code, e.reason.as_deref().and_then(reason_text)),
        _ => (None, None),
    }
}
