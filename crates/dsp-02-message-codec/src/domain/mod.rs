//! Domain layer for the message codec.

pub mod acks;
pub mod context;
pub mod errors;
pub mod message;
pub mod negotiation;
pub mod transfer;
pub mod version;

pub use acks::{
    reason_text, reason_values, ContractNegotiationAck, ContractNegotiationErrorMessage,
    TransferErrorMessage, TransferProcessAck,
};
pub use context::{default_context, DSPACE_CONTEXT, DSPACE_NAMESPACE, ODRL_NAMESPACE};
pub use errors::CodecError;
pub use message::{Envelope, ProtocolMessage};
pub use negotiation::{
    ContractAgreementMessage, ContractAgreementVerificationMessage,
    ContractNegotiationEventMessage, ContractNegotiationTerminationMessage, ContractOfferMessage,
    ContractRequestMessage, NegotiationEventType, NegotiationMessage, NegotiationMessageKind,
};
pub use transfer::{
    TransferCompletionMessage, TransferMessage, TransferMessageKind, TransferRequestMessage,
    TransferStartMessage, TransferSuspensionMessage, TransferTerminationMessage,
};
pub use version::{
    supported_versions, ProtocolVersion, VersionMetadata, PROTOCOL_PATH, PROTOCOL_VERSION,
};
