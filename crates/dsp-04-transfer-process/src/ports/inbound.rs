//! # Inbound Ports

use crate::domain::{TransferError, TransferOutcome, TransferProcess};
use async_trait::async_trait;
use dsp_01_identity_verifier::IdentityClaim;
use dsp_02_message_codec::{TransferMessage, TransferProcessAck};
use shared_types::{DataAddress, ProcessId, Role, Timestamp};

/// Transfer process API - inbound port.
///
/// Local actions persist the new state before the matching message is sent;
/// a delivery failure leaves the state in place and is reported as
/// [`TransferError::Delivery`].
#[async_trait]
pub trait TransferProcessApi: Send + Sync {
    /// Request a transfer under a finalized agreement, as consumer.
    async fn initiate(
        &self,
        agreement_id: &str,
        role: Role,
        counterparty_id: &str,
        counterparty_address: &str,
    ) -> Result<TransferProcess, TransferError>;

    /// Apply a message received from an authenticated counterparty.
    async fn handle_inbound(
        &self,
        message: TransferMessage,
        caller: &IdentityClaim,
    ) -> Result<TransferOutcome, TransferError>;

    /// Provider: start the transfer with the access coordinates.
    async fn start(
        &self,
        id: ProcessId,
        data_address: Option<DataAddress>,
    ) -> Result<TransferProcess, TransferError>;

    /// Either side: suspend a started transfer.
    async fn suspend(
        &self,
        id: ProcessId,
        reason: Option<String>,
    ) -> Result<TransferProcess, TransferError>;

    /// Either side: resume a suspended transfer.
    async fn resume(&self, id: ProcessId) -> Result<TransferProcess, TransferError>;

    /// Either side: mark the transfer completed.
    async fn complete(&self, id: ProcessId) -> Result<TransferProcess, TransferError>;

    /// Either side: terminate with a reason.
    async fn terminate(
        &self,
        id: ProcessId,
        reason: Option<String>,
    ) -> Result<TransferProcess, TransferError>;

    /// Re-send the message that produced the current state, if it was ours.
    async fn redeliver(&self, id: ProcessId) -> Result<TransferProcess, TransferError>;

    /// Terminate non-terminal processes idle since before the configured timeout.
    async fn expire_stale(&self, now: Timestamp) -> Result<Vec<ProcessId>, TransferError>;

    /// Current state, for the counterparty.
    async fn status(
        &self,
        id: ProcessId,
        caller: &IdentityClaim,
    ) -> Result<TransferProcessAck, TransferError>;

    /// Local lookup without an identity check.
    async fn get(&self, id: ProcessId) -> Result<TransferProcess, TransferError>;
}
