//! # Inbound Ports
//!
//! API trait defining what the contract negotiation subsystem can do.

use crate::domain::{NegotiationError, NegotiationOutcome, NegotiationProcess};
use async_trait::async_trait;
use dsp_01_identity_verifier::IdentityClaim;
use dsp_02_message_codec::{ContractNegotiationAck, NegotiationMessage};
use shared_types::{Policy, ProcessId, Role, Timestamp};

/// Contract negotiation API - inbound port.
///
/// Local actions persist the new state before the matching message is sent;
/// a delivery failure leaves the state in place and is reported as
/// [`NegotiationError::Delivery`].
#[async_trait]
pub trait ContractNegotiationApi: Send + Sync {
    /// Start a negotiation as consumer by sending a contract request.
    async fn initiate(
        &self,
        role: Role,
        offer: Policy,
        counterparty_id: &str,
        counterparty_address: &str,
    ) -> Result<NegotiationProcess, NegotiationError>;

    /// Apply a message received from an authenticated counterparty.
    async fn handle_inbound(
        &self,
        message: NegotiationMessage,
        caller: &IdentityClaim,
    ) -> Result<NegotiationOutcome, NegotiationError>;

    /// Send the follow-up message of an outcome, if any.
    async fn deliver_follow_up(&self, outcome: &NegotiationOutcome) -> Result<(), NegotiationError>;

    /// Provider: put a (counter-)offer on the table.
    async fn offer(&self, id: ProcessId, offer: Policy)
        -> Result<NegotiationProcess, NegotiationError>;

    /// Consumer: answer an offer with a counter-request.
    async fn counter_request(
        &self,
        id: ProcessId,
        offer: Policy,
    ) -> Result<NegotiationProcess, NegotiationError>;

    /// Consumer: accept the current offer.
    async fn accept(&self, id: ProcessId) -> Result<NegotiationProcess, NegotiationError>;

    /// Provider: issue an agreement for the current offer.
    async fn agree(&self, id: ProcessId) -> Result<NegotiationProcess, NegotiationError>;

    /// Consumer: verify a received agreement.
    async fn verify(&self, id: ProcessId) -> Result<NegotiationProcess, NegotiationError>;

    /// Provider: agree from REQUESTED or ACCEPTED, finalize from VERIFIED.
    async fn finalize(&self, id: ProcessId) -> Result<NegotiationProcess, NegotiationError>;

    /// Either side: terminate with a reason.
    async fn decline(
        &self,
        id: ProcessId,
        reason: Option<String>,
    ) -> Result<NegotiationProcess, NegotiationError>;

    /// Re-send the last message this side sent.
    async fn redeliver(&self, id: ProcessId) -> Result<NegotiationProcess, NegotiationError>;

    /// Terminate non-terminal processes idle since before the configured timeout.
    async fn expire_stale(&self, now: Timestamp) -> Result<Vec<ProcessId>, NegotiationError>;

    /// Current state, for the counterparty.
    async fn status(
        &self,
        id: ProcessId,
        caller: &IdentityClaim,
    ) -> Result<ContractNegotiationAck, NegotiationError>;

    /// Local lookup without an identity check.
    async fn get(&self, id: ProcessId) -> Result<NegotiationProcess, NegotiationError>;
}
