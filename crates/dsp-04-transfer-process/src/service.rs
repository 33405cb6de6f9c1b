//! # Transfer Service
//!
//! Application service implementing [`TransferProcessApi`].
//!
//! ## Architecture
//!
//! - Implements the inbound port (`TransferProcessApi`)
//! - Checks agreements through the outbound `AgreementLookup` port
//! - Persists through `ProcessStore` and sends through `Transport` once the
//!   new state is durable

use crate::domain::config::REASON_TIMED_OUT;
use crate::domain::transitions::{self, Direction};
use crate::domain::{outbound, TransferConfig, TransferError, TransferOutcome, TransferProcess};
use crate::metrics;
use crate::ports::{AgreementLookup, AgreementRecord, ProcessStore, TransferProcessApi, Transport};
use async_trait::async_trait;
use dsp_01_identity_verifier::IdentityClaim;
use dsp_02_message_codec::{
    reason_text, ProtocolMessage, TransferMessage, TransferMessageKind, TransferProcessAck,
    TransferRequestMessage,
};
use dsp_05_process_store::{ProcessLocks, StoreError};
use shared_types::{
    DataAddress, ProcessId, Role, TerminationDetail, TimeSource, Timestamp, TransferState,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

type K = TransferMessageKind;

enum Target {
    New,
    Duplicate(ProcessId),
    Existing(ProcessId),
}

/// Transfer process engine.
pub struct TransferEngine {
    store: Arc<dyn ProcessStore<TransferProcess>>,
    agreements: Arc<dyn AgreementLookup>,
    transport: Arc<dyn Transport>,
    time: Arc<dyn TimeSource>,
    config: TransferConfig,
    locks: ProcessLocks,
}

impl TransferEngine {
    /// Create an engine.
    pub fn new(
        store: Arc<dyn ProcessStore<TransferProcess>>,
        agreements: Arc<dyn AgreementLookup>,
        transport: Arc<dyn Transport>,
        time: Arc<dyn TimeSource>,
        config: TransferConfig,
    ) -> Self {
        Self {
            store,
            agreements,
            transport,
            time,
            config,
            locks: ProcessLocks::new(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Agreement must exist, be FINALIZED and belong to `party`.
    async fn finalized_agreement(
        &self,
        agreement_id: &str,
        party: &str,
    ) -> Result<AgreementRecord, TransferError> {
        let record = self.agreements.find_agreement(agreement_id).await?;
        let record = match record {
            Some(record) if record.is_finalized() => record,
            other => {
                return Err(TransferError::AgreementNotFinalized {
                    agreement_id: agreement_id.to_string(),
                    state: other.map(|r| r.negotiation_state),
                })
            }
        };
        if record.counterparty_id != party {
            return Err(TransferError::IdentityMismatch {
                expected: record.counterparty_id,
                actual: party.to_string(),
            });
        }
        Ok(record)
    }

    async fn locate(&self, message: &TransferMessage) -> Result<Target, TransferError> {
        if let TransferMessage::Request(request) = message {
            return match self.store.load_by_correlation_id(&request.consumer_pid).await {
                Ok(existing) => Ok(Target::Duplicate(existing.id)),
                Err(StoreError::NotFound(_)) => Ok(Target::New),
                Err(e) => Err(e.into()),
            };
        }
        for pid in [message.provider_pid(), Some(message.consumer_pid())]
            .into_iter()
            .flatten()
        {
            let Ok(id) = pid.parse::<ProcessId>() else {
                continue;
            };
            match self.store.load(id).await {
                Ok(process) => return Ok(Target::Existing(process.id)),
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(TransferError::NotFound(format!(
            "{} names no local transfer",
            message.type_name()
        )))
    }

    async fn handle_inner(
        &self,
        message: TransferMessage,
        caller: &IdentityClaim,
    ) -> Result<TransferOutcome, TransferError> {
        match (self.locate(&message).await?, message) {
            (Target::New, TransferMessage::Request(request)) => {
                self.create_from_request(request, caller).await
            }
            (Target::New, other) => Err(TransferError::NotFound(other.type_name().to_string())),
            (Target::Duplicate(id), _) => {
                let process = self.store.load(id).await?;
                check_caller(&process, caller)?;
                debug!("[dsp-04] {} transfer request re-delivered", id);
                Ok(unchanged(process))
            }
            (Target::Existing(id), message) => self.apply_inbound(id, message, caller).await,
        }
    }

    async fn create_from_request(
        &self,
        request: TransferRequestMessage,
        caller: &IdentityClaim,
    ) -> Result<TransferOutcome, TransferError> {
        let _guard = self
            .locks
            .acquire(&format!("correlation:{}", request.consumer_pid))
            .await;

        match self.store.load_by_correlation_id(&request.consumer_pid).await {
            Ok(existing) => {
                check_caller(&existing, caller)?;
                return Ok(unchanged(existing));
            }
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        self.finalized_agreement(&request.agreement_id, &caller.subject)
            .await?;

        let mut process = TransferProcess::new_provider(
            request.consumer_pid,
            request.agreement_id,
            request.format,
            caller.subject.clone(),
            request.callback_address,
            request.data_address,
            self.time.now(),
        );
        process.version = self.store.save(&process).await?;
        metrics::record_transition(process.state.as_str());
        info!(
            "[dsp-04] {} requested by {} under {} ({})",
            process.id, process.counterparty_id, process.agreement_id, process.format
        );

        Ok(TransferOutcome {
            process,
            transitioned: true,
        })
    }

    async fn apply_inbound(
        &self,
        id: ProcessId,
        message: TransferMessage,
        caller: &IdentityClaim,
    ) -> Result<TransferOutcome, TransferError> {
        let kind = message.kind();
        let _guard = self.locks.acquire(&id.to_string()).await;
        let mut process = self.store.load(id).await?;

        check_caller(&process, caller)?;
        if let Some(pid) = process.counterparty_pid_in(&message) {
            process.bind_correlation(pid)?;
        }

        // Duplicates never mutate, whichever side sent them.
        if process.state == kind.target_state() {
            debug!("[dsp-04] {} already {}, ignoring {}", id, process.state, kind);
            return Ok(unchanged(process));
        }
        if !transitions::sender_allowed(process.role, process.state, kind, Direction::Inbound) {
            return Err(illegal(&process, kind));
        }
        let next =
            transitions::next_state(process.state, kind).ok_or_else(|| illegal(&process, kind))?;

        match message {
            TransferMessage::Start(m) => {
                if m.data_address.is_some() {
                    process.data_address = m.data_address;
                }
            }
            TransferMessage::Suspension(m) => {
                process.error_detail = Some(TerminationDetail {
                    code: m.code,
                    reason: m.reason.as_deref().and_then(reason_text),
                });
            }
            TransferMessage::Termination(m) => {
                process.error_detail = Some(TerminationDetail {
                    code: m.code,
                    reason: m.reason.as_deref().and_then(reason_text),
                });
            }
            TransferMessage::Request(_) | TransferMessage::Completion(_) => {}
        }

        let from = process.state;
        process.transition_to(next, self.time.now(), false);
        process.version = self.store.save(&process).await?;
        metrics::record_transition(next.as_str());
        info!("[dsp-04] {} {} -> {} ({})", id, from, next, kind);

        Ok(TransferOutcome {
            process,
            transitioned: true,
        })
    }

    async fn apply_local<F>(
        &self,
        id: ProcessId,
        kind: TransferMessageKind,
        mutate: F,
    ) -> Result<TransferProcess, TransferError>
    where
        F: FnOnce(&mut TransferProcess) -> Result<(), TransferError> + Send,
    {
        let (process, message) = {
            let _guard = self.locks.acquire(&id.to_string()).await;
            let mut process = self.store.load(id).await?;

            if process.state == kind.target_state() {
                debug!("[dsp-04] {} already {}", id, process.state);
                return Ok(process);
            }
            if !transitions::sender_allowed(process.role, process.state, kind, Direction::Local) {
                return Err(illegal(&process, kind));
            }
            let next = transitions::next_state(process.state, kind)
                .ok_or_else(|| illegal(&process, kind))?;

            mutate(&mut process)?;
            let from = process.state;
            process.transition_to(next, self.time.now(), true);
            process.version = self.store.save(&process).await?;
            metrics::record_transition(next.as_str());
            info!("[dsp-04] {} {} -> {} ({})", id, from, next, kind);

            let message = outbound::build(&process, kind, &self.config);
            (process, message)
        };

        match message {
            Some(message) => self.send(process, message).await,
            None => {
                warn!(
                    "[dsp-04] {} has no counterparty pid yet, {} not sent",
                    process.id, kind
                );
                Ok(process)
            }
        }
    }

    async fn send(
        &self,
        process: TransferProcess,
        message: TransferMessage,
    ) -> Result<TransferProcess, TransferError> {
        let kind = message.kind();
        let reply = self
            .transport
            .send(
                &process.counterparty_id,
                &process.counterparty_address,
                process.role.counterpart(),
                &ProtocolMessage::Transfer(message),
            )
            .await
            .map_err(|source| {
                warn!("[dsp-04] {} delivery of {} failed: {}", process.id, kind, source);
                TransferError::Delivery {
                    process_id: process.id,
                    source,
                }
            })?;
        debug!("[dsp-04] {} delivered {}", process.id, kind);

        match reply {
            Some(ProtocolMessage::TransferAck(ack))
                if process.role == Role::Consumer && process.correlation_id.is_none() =>
            {
                self.bind_from_ack(process.id, &ack).await
            }
            _ => Ok(process),
        }
    }

    async fn bind_from_ack(
        &self,
        id: ProcessId,
        ack: &TransferProcessAck,
    ) -> Result<TransferProcess, TransferError> {
        let _guard = self.locks.acquire(&id.to_string()).await;
        let mut process = self.store.load(id).await?;
        if process.correlation_id.is_none() && !ack.provider_pid.is_empty() {
            process.bind_correlation(&ack.provider_pid)?;
            process.version = self.store.save(&process).await?;
            debug!("[dsp-04] {} bound to provider {}", id, ack.provider_pid);
        }
        Ok(process)
    }
}

#[async_trait]
impl TransferProcessApi for TransferEngine {
    async fn initiate(
        &self,
        agreement_id: &str,
        role: Role,
        counterparty_id: &str,
        counterparty_address: &str,
    ) -> Result<TransferProcess, TransferError> {
        if role != Role::Consumer {
            return Err(TransferError::RoleNotSupported {
                role,
                operation: "initiate",
            });
        }
        self.finalized_agreement(agreement_id, counterparty_id)
            .await?;

        let mut process = TransferProcess::new_consumer(
            agreement_id,
            self.config.default_format.clone(),
            counterparty_id,
            counterparty_address,
            self.time.now(),
        );
        process.version = self.store.save(&process).await?;
        metrics::record_transition(process.state.as_str());
        info!(
            "[dsp-04] {} requested from {} under {}",
            process.id, process.counterparty_id, agreement_id
        );

        match outbound::build(&process, K::Request, &self.config) {
            Some(message) => self.send(process, message).await,
            None => Ok(process),
        }
    }

    async fn handle_inbound(
        &self,
        message: TransferMessage,
        caller: &IdentityClaim,
    ) -> Result<TransferOutcome, TransferError> {
        let type_name = message.type_name();
        let result = self.handle_inner(message, caller).await;
        if let Err(e) = &result {
            metrics::record_rejection(e.reason_label());
            warn!("[dsp-04] rejected {} from {}: {}", type_name, caller.subject, e);
        }
        result
    }

    async fn start(
        &self,
        id: ProcessId,
        data_address: Option<DataAddress>,
    ) -> Result<TransferProcess, TransferError> {
        self.apply_local(id, K::Start, move |p| {
            if data_address.is_some() {
                p.data_address = data_address;
            }
            Ok(())
        })
        .await
    }

    async fn suspend(
        &self,
        id: ProcessId,
        reason: Option<String>,
    ) -> Result<TransferProcess, TransferError> {
        self.apply_local(id, K::Suspension, move |p| {
            p.error_detail = Some(TerminationDetail { code: None, reason });
            Ok(())
        })
        .await
    }

    async fn resume(&self, id: ProcessId) -> Result<TransferProcess, TransferError> {
        let process = self.store.load(id).await?;
        if process.state != TransferState::Suspended {
            return Err(illegal(&process, K::Start));
        }
        self.apply_local(id, K::Start, |_| Ok(())).await
    }

    async fn complete(&self, id: ProcessId) -> Result<TransferProcess, TransferError> {
        self.apply_local(id, K::Completion, |_| Ok(())).await
    }

    async fn terminate(
        &self,
        id: ProcessId,
        reason: Option<String>,
    ) -> Result<TransferProcess, TransferError> {
        self.apply_local(id, K::Termination, move |p| {
            p.error_detail = Some(TerminationDetail { code: None, reason });
            Ok(())
        })
        .await
    }

    async fn redeliver(&self, id: ProcessId) -> Result<TransferProcess, TransferError> {
        let process = self.store.load(id).await?;
        if !process.produced_locally {
            debug!("[dsp-04] {} has nothing to re-send in {}", id, process.state);
            return Ok(process);
        }
        match outbound::build(&process, transitions::kind_for(process.state), &self.config) {
            Some(message) => {
                info!("[dsp-04] {} re-sending {}", id, message.type_name());
                self.send(process, message).await
            }
            None => Ok(process),
        }
    }

    async fn expire_stale(&self, now: Timestamp) -> Result<Vec<ProcessId>, TransferError> {
        let cutoff = now.saturating_sub(self.config.process_timeout_secs);
        let stale = self.store.list_stale(cutoff).await?;
        let mut expired = Vec::new();

        for process in stale {
            let id = process.id;
            let result = self
                .apply_local(id, K::Termination, move |p| {
                    if p.last_modified >= cutoff {
                        return Err(TransferError::Conflict(format!("{id} advanced")));
                    }
                    p.error_detail = Some(TerminationDetail::reason(REASON_TIMED_OUT));
                    Ok(())
                })
                .await;
            match result {
                Ok(p) if p.state == TransferState::Terminated => expired.push(id),
                Ok(_) => {}
                Err(TransferError::Delivery { .. }) => expired.push(id),
                Err(e) if e.is_conflict() => debug!("[dsp-04] {} skipped by sweep: {}", id, e),
                Err(e) => warn!("[dsp-04] {} could not be expired: {}", id, e),
            }
        }

        if !expired.is_empty() {
            info!("[dsp-04] expired {} stale transfers", expired.len());
        }
        Ok(expired)
    }

    async fn status(
        &self,
        id: ProcessId,
        caller: &IdentityClaim,
    ) -> Result<TransferProcessAck, TransferError> {
        let process = self.store.load(id).await?;
        check_caller(&process, caller)?;
        Ok(process.ack())
    }

    async fn get(&self, id: ProcessId) -> Result<TransferProcess, TransferError> {
        Ok(self.store.load(id).await?)
    }
}

fn check_caller(process: &TransferProcess, caller: &IdentityClaim) -> Result<(), TransferError> {
    if process.counterparty_id != caller.subject {
        return Err(TransferError::IdentityMismatch {
            expected: process.counterparty_id.clone(),
            actual: caller.subject.clone(),
        });
    }
    Ok(())
}

fn illegal(process: &TransferProcess, kind: TransferMessageKind) -> TransferError {
    TransferError::IllegalTransition {
        role: process.role,
        state: process.state,
        kind,
    }
}

fn unchanged(process: TransferProcess) -> TransferOutcome {
    TransferOutcome {
        process,
        transitioned: false,
    }
}
