//! # Negotiation Entities
//!
//! The negotiation process record and the outcome of handling an inbound
//! message.

use super::errors::NegotiationError;
use dsp_02_message_codec::{ContractNegotiationAck, NegotiationMessage};
use dsp_05_process_store::StoredProcess;
use serde::{Deserialize, Serialize};
use shared_types::{
    Extensions, NegotiationState, Policy, ProcessId, Role, TerminationDetail, Timestamp,
};

/// One side's view of a contract negotiation.
///
/// The consumer's `id` is the `consumerPid` on the wire and `correlation_id`
/// holds the `providerPid` once learned; for the provider it is the reverse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NegotiationProcess {
    /// Local process id.
    pub id: ProcessId,
    /// Counterparty's process id, once bound.
    pub correlation_id: Option<String>,
    /// Our role.
    pub role: Role,
    /// Current state.
    pub state: NegotiationState,
    /// Verified identity of the counterparty.
    pub counterparty_id: String,
    /// Counterparty's DSP base URL.
    pub counterparty_address: String,
    /// Latest offer on the table.
    pub offer: Policy,
    /// Agreement, immutable once set.
    pub agreement: Option<Policy>,
    /// Offer/request rounds exchanged so far.
    pub offer_rounds: u32,
    /// Code and reason of the termination.
    pub error_detail: Option<TerminationDetail>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last state change.
    pub last_modified: Timestamp,
    /// Store version; 0 until first saved.
    pub version: u64,
}

impl NegotiationProcess {
    /// Consumer-side process created by `initiate`.
    pub fn new_consumer(
        offer: Policy,
        counterparty_id: impl Into<String>,
        counterparty_address: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self::new(
            Role::Consumer,
            None,
            offer,
            counterparty_id.into(),
            counterparty_address.into(),
            now,
        )
    }

    /// Provider-side process created by an inbound initial request.
    pub fn new_provider(
        consumer_pid: impl Into<String>,
        offer: Policy,
        counterparty_id: impl Into<String>,
        callback_address: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self::new(
            Role::Provider,
            Some(consumer_pid.into()),
            offer,
            counterparty_id.into(),
            callback_address.into(),
            now,
        )
    }

    fn new(
        role: Role,
        correlation_id: Option<String>,
        offer: Policy,
        counterparty_id: String,
        counterparty_address: String,
        now: Timestamp,
    ) -> Self {
        Self {
            id: ProcessId::generate(),
            correlation_id,
            role,
            state: NegotiationState::Requested,
            counterparty_id,
            counterparty_address,
            offer,
            agreement: None,
            offer_rounds: 0,
            error_detail: None,
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
    pub fn counterparty_pid_in<'m>(&self, message: &'m NegotiationMessage) -> Option<&'m str> {
        match self.role {
            Role::Provider => message.consumer_pid(),
            Role::Consumer => message.provider_pid(),
        }
    }

    /// Bind the counterparty's pid, or check it against the bound one.
    pub fn bind_correlation(&mut self, pid: &str) -> Result<(), NegotiationError> {
        match &self.correlation_id {
            Some(bound) if bound != pid => Err(NegotiationError::CorrelationMismatch {
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

    /// Record the agreement; rejected if a different one is already set.
    pub fn set_agreement(&mut self, agreement: Policy) -> Result<(), NegotiationError> {
        match &self.agreement {
            Some(existing) if *existing != agreement => Err(NegotiationError::InvalidOffer(
                format!("agreement {} is already recorded", existing.id),
            )),
            _ => {
                self.agreement = Some(agreement);
                Ok(())
            }
        }
    }

    /// Move to `next`.
    pub fn transition_to(&mut self, next: NegotiationState, now: Timestamp) {
        self.state = next;
        self.last_modified = now;
    }

    /// Move to TERMINATED with the given detail.
    pub fn terminate(&mut self, detail: TerminationDetail, now: Timestamp) {
        self.error_detail = Some(detail);
        self.transition_to(NegotiationState::Terminated, now);
    }

    /// Acknowledgement body describing this process.
    pub fn ack(&self) -> ContractNegotiationAck {
        ContractNegotiationAck {
            consumer_pid: self.consumer_pid().unwrap_or_default(),
            provider_pid: self.provider_pid().unwrap_or_default(),
            state: self.state,
            extensions: Extensions::new(),
        }
    }
}

impl StoredProcess for NegotiationProcess {
    fn process_id(&self) -> ProcessId {
        self.id
    }

    fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    fn agreement_id(&self) -> Option<&str> {
        self.agreement.as_ref().map(|a| a.id.as_str())
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
pub struct NegotiationOutcome {
    /// Process after the message was applied.
    pub process: NegotiationProcess,
    /// False for idempotent re-delivery.
    pub transitioned: bool,
    /// Message to send once the acknowledgement is returned.
    pub follow_up: Option<NegotiationMessage>,
}

impl NegotiationOutcome {
    /// Acknowledgement for the sender.
    pub fn ack(&self) -> ContractNegotiationAck {
        self.process.ack()
    }
}
