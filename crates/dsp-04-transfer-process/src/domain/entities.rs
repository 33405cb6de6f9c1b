//! # Transfer Entities

use super::errors::TransferError;
use dsp_02_message_codec::{TransferMessage, TransferProcessAck};
use dsp_05_process_store::StoredProcess;
use serde::{Deserialize, Serialize};
use shared_types::{
    DataAddress, Extensions, ProcessId, Role, TerminationDetail, Timestamp, TransferState,
};

/// One side's view of a transfer process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferProcess {
    /// Local process id.
    pub id: ProcessId,
    /// Counterparty's process id, once bound.
    pub correlation_id: Option<String>,
    /// Agreement governing the transfer; never changes.
    pub agreement_id: String,
    /// Our role.
    pub role: Role,
    /// Current state.
    pub state: TransferState,
    /// Verified identity of the counterparty.
    pub counterparty_id: String,
    /// Counterparty's DSP base URL.
    pub counterparty_address: String,
    /// Requested transfer format, e.g. `HttpData-PULL`.
    pub format: String,
    /// Access coordinates: the consumer's push target on request, the
    /// provider's endpoint once started.
    pub data_address: Option<DataAddress>,
    /// Code and reason of the latest suspension or termination.
    pub error_detail: Option<TerminationDetail>,
    /// Whether the current state was reached by a local action.
    pub produced_locally: bool,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last state change.
    pub last_modified: Timestamp,
    /// Store version; 0 until first saved.
    pub version: u64,
}

impl TransferProcess {
    /// Consumer-side process created by `initiate`.
    pub fn new_consumer(
        agreement_id: impl Into<String>,
        format: impl Into<String>,
        counterparty_id: impl Into<String>,
        counterparty_address: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: ProcessId::generate(),
            correlation_id: None,
            agreement_id: agreement_id.into(),
            role: Role::Consumer,
            state: TransferState::Requested,
            counterparty_id: counterparty_id.into(),
            counterparty_address: counterparty_address.into(),
            format: format.into(),
            data_address: None,
            error_detail: None,
            produced_locally: true,
            created_at: now,
            last_modified: now,
            version: 0,
        }
    }

    /// Provider-side process created by an inbound transfer request.
    pub fn new_provider(
        consumer_pid: impl Into<String>,
        agreement_id: impl Into<String>,
        format: impl Into<String>,
        counterparty_id: impl Into<String>,
        callback_address: impl Into<String>,
        data_address: Option<DataAddress>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: ProcessId::generate(),
            correlation_id: Some(consumer_pid.into()),
            agreement_id: agreement_id.into(),
            role: Role::Provider,
            state: TransferState::Requested,
            counterparty_id: counterparty_id.into(),
            counterparty_address: callback_address.into(),
            format: format.into(),
            data_address,
            error_detail: None,
            produced_locally: false,
            created_at: now,
            last_modified: now,
            version: 0,
        }
    }

    /// `consumerPid` as it appears on the wire.
    pub fn consumer_pid(&self) -> Option<String> {
        match self.role {
            Role::Consumer => Some(self.id.to_string()),
            Role::Provider => self.correlation_id.clone(),
        }
    }

    /// `providerPid` as it appears on the wire.
    pub fn provider_pid(&self) -> Option<String> {
        match self.role {
            Role::Provider => Some(self.id.to_string()),
            Role::Consumer => self.correlation_id.clone(),
        }
    }

    /// Counterparty pid a message carries for this process.
    pub fn counterparty_pid_in<'m>(&self, message: &'m TransferMessage) -> Option<&'m str> {
        match self.role {
            Role::Provider => Some(message.consumer_pid()),
            Role::Consumer => message.provider_pid(),
        }
    }

    /// Bind the counterparty's pid, or check it against the bound one.
    pub fn bind_correlation(&mut self, pid: &str) -> Result<(), TransferError> {
        match &self.correlation_id {
            Some(bound) if bound != pid => Err(TransferError::CorrelationMismatch {
                process_id: self.id,
                expected: bound.clone(),
                actual: pid.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.correlation_id = Some(pid.to_string());
                Ok(())
            }
        }
    }

    /// Move to `next`. Leaving SUSPENDED other than by termination drops the
    /// suspension detail; a termination has already written its own.
    pub fn transition_to(&mut self, next: TransferState, now: Timestamp, locally: bool) {
        if self.state == TransferState::Suspended && next != TransferState::Terminated {
            self.error_detail = None;
        }
        self.state = next;
        self.last_modified = now;
        self.produced_locally = locally;
    }

    /// Acknowledgement body describing this process.
    pub fn ack(&self) -> TransferProcessAck {
        TransferProcessAck {
            consumer_pid: self.consumer_pid().unwrap_or_default(),
            provider_pid: self.provider_pid().unwrap_or_default(),
            state: self.state,
            extensions: Extensions::new(),
        }
    }
}

impl StoredProcess for TransferProcess {
    fn process_id(&self) -> ProcessId {
        self.id
    }

    fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    fn agreement_id(&self) -> Option<&str> {
        Some(&self.agreement_id)
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn last_modified(&self) -> Timestamp {
        self.last_modified
    }

    fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Result of applying an inbound message.
#[derive(Clone, Debug)]
pub struct TransferOutcome {
    /// Process after the message was applied.
    pub process: TransferProcess,
    /// False for idempotent re-delivery.
    pub transitioned: bool,
}

impl TransferOutcome {
    /// Acknowledgement for the sender.
    pub fn ack(&self) -> TransferProcessAck {
        self.process.ack()
    }
}
