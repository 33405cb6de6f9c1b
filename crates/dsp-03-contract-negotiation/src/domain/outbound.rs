//! # Outbound Messages
//!
//! Builds the protocol message a local action sends, from the process as
//! persisted after the action.

use super::{NegotiationConfig, NegotiationProcess};
use dsp_02_message_codec::{
    reason_values, ContractAgreementMessage, ContractAgreementVerificationMessage,
    ContractNegotiationEventMessage, ContractNegotiationTerminationMessage, ContractOfferMessage,
    ContractRequestMessage, NegotiationEventType, NegotiationMessage, NegotiationMessageKind,
};
use shared_types::Extensions;

/// Message of `kind` for `process`.
///
/// `None` when a pid the message must carry is not known yet, which only
/// happens for a consumer that never heard back from the provider.
pub fn build(
    process: &NegotiationProcess,
    kind: NegotiationMessageKind,
    config: &NegotiationConfig,
) -> Option<NegotiationMessage> {
    use NegotiationMessageKind as K;
    let consumer_pid = process.consumer_pid();
    let provider_pid = process.provider_pid();
    let callback = Some(config.callback_address.clone());

    let message = match kind {
        K::Request => NegotiationMessage::Request(ContractRequestMessage {
            consumer_pid: consumer_pid?,
            provider_pid,
            offer: process.offer.clone(),
            callback_address: callback,
            extensions: Extensions::new(),
        }),
        K::Offer => NegotiationMessage::Offer(ContractOfferMessage {
            provider_pid: provider_pid?,
            consumer_pid,
            offer: process.offer.clone(),
            callback_address: callback,
            extensions: Extensions::new(),
        }),
        K::Accepted | K::Finalized => {
            NegotiationMessage::Event(ContractNegotiationEventMessage {
                consumer_pid: consumer_pid?,
                provider_pid: provider_pid?,
                event_type: if kind == K::Accepted {
                    NegotiationEventType::Accepted
                } else {
                    NegotiationEventType::Finalized
                },
                extensions: Extensions::new(),
            })
        }
        K::Agreement => NegotiationMessage::Agreement(ContractAgreementMessage {
            consumer_pid: consumer_pid?,
            provider_pid: provider_pid?,
            agreement: process.agreement.clone()?,
            callback_address: callback,
            extensions: Extensions::new(),
        }),
        K::Verification => {
            NegotiationMessage::Verification(ContractAgreementVerificationMessage {
                consumer_pid: consumer_pid?,
                provider_pid: provider_pid?,
                extensions: Extensions::new(),
            })
        }
        K::Termination => {
            let detail = process.error_detail.clone().unwrap_or_default();
            NegotiationMessage::Termination(ContractNegotiationTerminationMessage {
                consumer_pid: consumer_pid?,
                provider_pid: provider_pid?,
                code: detail.code,
                reason: detail.reason.as_deref().map(reason_values),
                extensions: Extensions::new(),
            })
        }
    };
    Some(message)
}
