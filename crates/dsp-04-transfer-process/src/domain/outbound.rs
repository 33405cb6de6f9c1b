//! # Outbound Messages

use super::{TransferConfig, TransferProcess};
use dsp_02_message_codec::{
    reason_values, TransferCompletionMessage, TransferMessage, TransferMessageKind,
    TransferRequestMessage, TransferStartMessage, TransferSuspensionMessage,
    TransferTerminationMessage,
};
use shared_types::Extensions;

/// Message of `kind` for `process`, or `None` while a required pid is unknown.
pub fn build(
    process: &TransferProcess,
    kind: TransferMessageKind,
    config: &TransferConfig,
) -> Option<TransferMessage> {
    use TransferMessageKind as K;
    let consumer_pid = process.consumer_pid()?;
    let detail = process.error_detail.clone().unwrap_or_default();

    let message = match kind {
        K::Request => TransferMessage::Request(TransferRequestMessage {
            consumer_pid,
            agreement_id: process.agreement_id.clone(),
            format: process.format.clone(),
            callback_address: config.callback_address.clone(),
            data_address: process.data_address.clone(),
            extensions: Extensions::new(),
        }),
        K::Start => TransferMessage::Start(TransferStartMessage {
            consumer_pid,
            provider_pid: process.provider_pid()?,
            data_address: process.data_address.clone(),
            extensions: Extensions::new(),
        }),
        K::Suspension => TransferMessage::Suspension(TransferSuspensionMessage {
            consumer_pid,
            provider_pid: process.provider_pid()?,
            code: detail.code,
            reason: detail.reason.as_deref().map(reason_values),
            extensions: Extensions::new(),
        }),
        K::Completion => TransferMessage::Completion(TransferCompletionMessage {
            consumer_pid,
            provider_pid: process.provider_pid()?,
            extensions: Extensions::new(),
        }),
        K::Termination => TransferMessage::Termination(TransferTerminationMessage {
            consumer_pid,
            provider_pid: process.provider_pid()?,
            code: detail.code,
            reason: detail.reason.as_deref().map(reason_values),
            extensions: Extensions::new(),
        }),
    };
    Some(message)
}
