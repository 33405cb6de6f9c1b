//! # Negotiation Service
//!
//! Application service implementing [`ContractNegotiationApi`].
//!
//! ## Architecture
//!
//! - Implements the inbound port (`ContractNegotiationApi`)
//! - Persists through the outbound `ProcessStore` port with compare-and-swap
//! - Sends through the outbound `Transport` port after the state is durable
//!
//! Mutations of one process are serialized by [`ProcessLocks`]; the lock is
//! released before any message is sent.

use crate::domain::config::{REASON_EXHAUSTED, REASON_TIMED_OUT};
use crate::domain::transitions::{self, Direction};
use crate::domain::{
    outbound, NegotiationConfig, NegotiationError, NegotiationOutcome, NegotiationProcess,
};
use crate::metrics;
use crate::ports::{ContractNegotiationApi, OfferEvaluator, ProcessStore, Transport};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use dsp_01_identity_verifier::IdentityClaim;
use dsp_02_message_codec::{
    reason_text, ContractNegotiationAck, ContractRequestMessage, NegotiationMessage,
    NegotiationMessageKind, ProtocolMessage,
};
use dsp_05_process_store::{ProcessLocks, StoreError};
use shared_types::{
    NegotiationState, Policy, ProcessId, Role, TerminationDetail, TimeSource, Timestamp,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

type K = NegotiationMessageKind;

/// Where an inbound message lands.
enum Target {
    /// Initial request for an unknown consumer process.
    New,
    /// Initial request re-delivered for a process that already exists.
    Duplicate(ProcessId),
    /// Message for an existing local process.
    Existing(ProcessId),
}

/// Contract negotiation engine.
pub struct NegotiationEngine {
    store: Arc<dyn ProcessStore<NegotiationProcess>>,
    transport: Arc<dyn Transport>,
    offers: Arc<dyn OfferEvaluator>,
    time: Arc<dyn TimeSource>,
    config: NegotiationConfig,
    locks: ProcessLocks,
}

impl NegotiationEngine {
    /// Create an engine.
    pub fn new(
        store: Arc<dyn ProcessStore<NegotiationProcess>>,
        transport: Arc<dyn Transport>,
        offers: Arc<dyn OfferEvaluator>,
        time: Arc<dyn TimeSource>,
        config: NegotiationConfig,
    ) -> Self {
        Self {
            store,
            transport,
            offers,
            time,
            config,
            locks: ProcessLocks::new(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &NegotiationConfig {
        &self.config
    }

    async fn locate(&self, message: &NegotiationMessage) -> Result<Target, NegotiationError> {
        match message.kind() {
            K::Request => match message.provider_pid() {
                Some(pid) => Ok(Target::Existing(parse_pid(pid)?)),
                None => {
                    let consumer_pid = message.consumer_pid().unwrap_or_default();
                    match self.store.load_by_correlation_id(consumer_pid).await {
                        Ok(existing) => Ok(Target::Duplicate(existing.id)),
                        Err(StoreError::NotFound(_)) => Ok(Target::New),
                        Err(e) => Err(e.into()),
                    }
                }
            },
            K::Accepted | K::Verification => own_pid(message.provider_pid()),
            // Negotiations start from a consumer request only.
            K::Offer if message.consumer_pid().is_none() => {
                Err(NegotiationError::RoleNotSupported {
                    role: Role::Consumer,
                    operation: "provider-initiated negotiation",
                })
            }
            K::Offer | K::Agreement | K::Finalized => own_pid(message.consumer_pid()),
            K::Termination => {
                for pid in [message.provider_pid(), message.consumer_pid()]
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
                Err(NegotiationError::NotFound(
                    "termination names no local negotiation".to_string(),
                ))
            }
        }
    }

    async fn handle_inner(
        &self,
        message: NegotiationMessage,
        caller: &IdentityClaim,
    ) -> Result<NegotiationOutcome, NegotiationError> {
        match (self.locate(&message).await?, message) {
            (Target::New, NegotiationMessage::Request(request)) => {
                self.create_from_request(request, caller).await
            }
            (Target::New, other) => Err(NegotiationError::NotFound(other.type_name().to_string())),
            (Target::Duplicate(id), _) => {
                let process = self.store.load(id).await?;
                check_caller(&process, caller)?;
                debug!("[dsp-03] {} initial request re-delivered", id);
                Ok(unchanged(process))
            }
            (Target::Existing(id), message) => self.apply_inbound(id, message, caller).await,
        }
    }

    async fn create_from_request(
        &self,
        request: ContractRequestMessage,
        caller: &IdentityClaim,
    ) -> Result<NegotiationOutcome, NegotiationError> {
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

        request.offer.validate_offer()?;
        self.evaluate_offer(&request.offer, &caller.subject).await?;
        let callback = request
            .callback_address
            .filter(|c| !c.trim().is_empty())
            .ok_or(NegotiationError::MissingCallbackAddress)?;

        let mut process = NegotiationProcess::new_provider(
            request.consumer_pid,
            request.offer,
            caller.subject.clone(),
            callback,
            self.time.now(),
        );
        process.version = self.store.save(&process).await?;
        metrics::record_transition(process.state.as_str());
        info!(
            "[dsp-03] {} requested by {} for {}",
            process.id,
            process.counterparty_id,
            process.offer.target.as_deref().unwrap_or("-")
        );

        Ok(NegotiationOutcome {
            process,
            transitioned: true,
            follow_up: None,
        })
    }

    async fn apply_inbound(
        &self,
        id: ProcessId,
        message: NegotiationMessage,
        caller: &IdentityClaim,
    ) -> Result<NegotiationOutcome, NegotiationError> {
        let kind = message.kind();
        let _guard = self.locks.acquire(&id.to_string()).await;
        let mut process = self.store.load(id).await?;

        check_caller(&process, caller)?;
        if !transitions::sender_allowed(process.role, kind, Direction::Inbound) {
            return Err(illegal(&process, kind));
        }
        if let Some(pid) = process.counterparty_pid_in(&message) {
            process.bind_correlation(pid)?;
        }

        if process.state == transitions::target_state(kind) {
            debug!("[dsp-03] {} already {}, ignoring {}", id, process.state, kind);
            return Ok(unchanged(process));
        }
        let next =
            transitions::next_state(process.state, kind).ok_or_else(|| illegal(&process, kind))?;

        match message {
            NegotiationMessage::Request(m) => {
                m.offer.validate_offer()?;
                self.evaluate_offer(&m.offer, &process.counterparty_id).await?;
                process.offer = m.offer;
            }
            NegotiationMessage::Offer(m) => {
                m.offer.validate_offer()?;
                process.offer = m.offer;
            }
            NegotiationMessage::Agreement(m) => {
                m.agreement.validate_agreement()?;
                if m.agreement.target != process.offer.target {
                    return Err(NegotiationError::InvalidOffer(format!(
                        "agreement target {:?} does not match offer target {:?}",
                        m.agreement.target, process.offer.target
                    )));
                }
                process.set_agreement(m.agreement)?;
            }
            NegotiationMessage::Termination(m) => {
                process.error_detail = Some(TerminationDetail {
                    code: m.code,
                    reason: m.reason.as_deref().and_then(reason_text),
                });
            }
            NegotiationMessage::Event(_) | NegotiationMessage::Verification(_) => {}
        }

        let now = self.time.now();
        let exhausted = self.advance(&mut process, kind, next, now);
        process.version = self.store.save(&process).await?;

        let follow_up = if exhausted {
            outbound::build(&process, K::Termination, &self.config)
        } else {
            None
        };
        Ok(NegotiationOutcome {
            process,
            transitioned: true,
            follow_up,
        })
    }

    async fn evaluate_offer(&self, offer: &Policy, counterparty_id: &str) -> Result<(), NegotiationError> {
        self.offers
            .evaluate(offer, counterparty_id)
            .await
            .map_err(|reason| {
                warn!(
                    "[dsp-03] offer {} from {} rejected: {}",
                    offer.id, counterparty_id, reason
                );
                NegotiationError::InvalidOffer(reason)
            })
    }

    /// Apply `next`, or terminate when the offer round bound is exceeded.
    ///
    /// Returns true when the negotiation was ended by the bound.
    fn advance(
        &self,
        process: &mut NegotiationProcess,
        kind: NegotiationMessageKind,
        next: NegotiationState,
        now: Timestamp,
    ) -> bool {
        let from = process.state;
        if transitions::counts_offer_round(from, kind) {
            process.offer_rounds += 1;
            if process.offer_rounds > self.config.max_offer_rounds {
                process.terminate(TerminationDetail::reason(REASON_EXHAUSTED), now);
                metrics::record_exhausted();
                metrics::record_transition(NegotiationState::Terminated.as_str());
                warn!(
                    "[dsp-03] {} exhausted after {} offer rounds",
                    process.id, self.config.max_offer_rounds
                );
                return true;
            }
        }
        process.transition_to(next, now);
        metrics::record_transition(next.as_str());
        info!("[dsp-03] {} {} -> {} ({})", process.id, from, next, kind);
        false
    }

    async fn apply_local<F>(
        &self,
        id: ProcessId,
        kind: NegotiationMessageKind,
        mutate: F,
    ) -> Result<NegotiationProcess, NegotiationError>
    where
        F: FnOnce(&mut NegotiationProcess, Timestamp) -> Result<(), NegotiationError> + Send,
    {
        let (process, message) = {
            let _guard = self.locks.acquire(&id.to_string()).await;
            let mut process = self.store.load(id).await?;

            if !transitions::sender_allowed(process.role, kind, Direction::Local) {
                return Err(illegal(&process, kind));
            }
            if process.state == transitions::target_state(kind) {
                debug!("[dsp-03] {} already {}", id, process.state);
                return Ok(process);
            }
            let next = transitions::next_state(process.state, kind)
                .ok_or_else(|| illegal(&process, kind))?;

            let now = self.time.now();
            mutate(&mut process, now)?;
            let send_kind = if self.advance(&mut process, kind, next, now) {
                K::Termination
            } else {
                kind
            };
            process.version = self.store.save(&process).await?;
            let message = outbound::build(&process, send_kind, &self.config);
            (process, message)
        };

        match message {
            Some(message) => self.send(process, message).await,
            None => {
                warn!(
                    "[dsp-03] {} has no counterparty pid yet, {} not sent",
                    process.id, kind
                );
                Ok(process)
            }
        }
    }

    async fn send(
        &self,
        process: NegotiationProcess,
        message: NegotiationMessage,
    ) -> Result<NegotiationProcess, NegotiationError> {
        let kind = message.kind();
        let reply = self
            .transport
            .send(
                &process.counterparty_id,
                &process.counterparty_address,
                process.role.counterpart(),
                &ProtocolMessage::Negotiation(message),
            )
            .await
            .map_err(|source| {
                warn!("[dsp-03] {} delivery of {} failed: {}", process.id, kind, source);
                NegotiationError::Delivery {
                    process_id: process.id,
                    source,
                }
            })?;
        debug!("[dsp-03] {} delivered {}", process.id, kind);

        match reply {
            Some(ProtocolMessage::NegotiationAck(ack))
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
        ack: &ContractNegotiationAck,
    ) -> Result<NegotiationProcess, NegotiationError> {
        let _guard = self.locks.acquire(&id.to_string()).await;
        let mut process = self.store.load(id).await?;
        if process.correlation_id.is_none() && !ack.provider_pid.is_empty() {
            process.bind_correlation(&ack.provider_pid)?;
            process.version = self.store.save(&process).await?;
            debug!("[dsp-03] {} bound to provider {}", id, ack.provider_pid);
        }
        Ok(process)
    }
}

#[async_trait]
impl ContractNegotiationApi for NegotiationEngine {
    async fn initiate(
        &self,
        role: Role,
        offer: Policy,
        counterparty_id: &str,
        counterparty_address: &str,
    ) -> Result<NegotiationProcess, NegotiationError> {
        if role != Role::Consumer {
            return Err(NegotiationError::RoleNotSupported {
                role,
                operation: "initiate",
            });
        }
        offer.validate_offer()?;

        let mut process = NegotiationProcess::new_consumer(
            offer,
            counterparty_id,
            counterparty_address,
            self.time.now(),
        );
        process.version = self.store.save(&process).await?;
        metrics::record_transition(process.state.as_str());
        info!(
            "[dsp-03] {} initiated with {} at {}",
            process.id, process.counterparty_id, process.counterparty_address
        );

        match outbound::build(&process, K::Request, &self.config) {
            Some(message) => self.send(process, message).await,
            None => Ok(process),
        }
    }

    async fn handle_inbound(
        &self,
        message: NegotiationMessage,
        caller: &IdentityClaim,
    ) -> Result<NegotiationOutcome, NegotiationError> {
        let type_name = message.type_name();
        let result = self.handle_inner(message, caller).await;
        if let Err(e) = &result {
            metrics::record_rejection(e.reason_label());
            warn!("[dsp-03] rejected {} from {}: {}", type_name, caller.subject, e);
        }
        result
    }

    async fn deliver_follow_up(&self, outcome: &NegotiationOutcome) -> Result<(), NegotiationError> {
        if let Some(message) = &outcome.follow_up {
            self.send(outcome.process.clone(), message.clone()).await?;
        }
        Ok(())
    }

    async fn offer(
        &self,
        id: ProcessId,
        offer: Policy,
    ) -> Result<NegotiationProcess, NegotiationError> {
        offer.validate_offer()?;
        self.apply_local(id, K::Offer, move |p, _| {
            p.offer = offer;
            Ok(())
        })
        .await
    }

    async fn counter_request(
        &self,
        id: ProcessId,
        offer: Policy,
    ) -> Result<NegotiationProcess, NegotiationError> {
        offer.validate_offer()?;
        self.apply_local(id, K::Request, move |p, _| {
            p.offer = offer;
            Ok(())
        })
        .await
    }

    async fn accept(&self, id: ProcessId) -> Result<NegotiationProcess, NegotiationError> {
        self.apply_local(id, K::Accepted, |_, _| Ok(())).await
    }

    async fn agree(&self, id: ProcessId) -> Result<NegotiationProcess, NegotiationError> {
        let assigner = self.config.participant_id.clone();
        self.apply_local(id, K::Agreement, move |p, now| {
            let agreement = p.offer.to_agreement(
                format!("urn:uuid:{}", Uuid::new_v4()),
                assigner,
                p.counterparty_id.clone(),
                rfc3339(now),
            );
            p.set_agreement(agreement)
        })
        .await
    }

    async fn verify(&self, id: ProcessId) -> Result<NegotiationProcess, NegotiationError> {
        self.apply_local(id, K::Verification, |_, _| Ok(())).await
    }

    async fn finalize(&self, id: ProcessId) -> Result<NegotiationProcess, NegotiationError> {
        let process = self.store.load(id).await?;
        match process.state {
            NegotiationState::Requested | NegotiationState::Accepted => self.agree(id).await,
            _ => self.apply_local(id, K::Finalized, |_, _| Ok(())).await,
        }
    }

    async fn decline(
        &self,
        id: ProcessId,
        reason: Option<String>,
    ) -> Result<NegotiationProcess, NegotiationError> {
        self.apply_local(id, K::Termination, move |p, _| {
            p.error_detail = Some(TerminationDetail { code: None, reason });
            Ok(())
        })
        .await
    }

    async fn redeliver(&self, id: ProcessId) -> Result<NegotiationProcess, NegotiationError> {
        let process = self.store.load(id).await?;
        let message = transitions::last_sent_kind(process.role, process.state)
            .and_then(|kind| outbound::build(&process, kind, &self.config));
        match message {
            Some(message) => {
                info!("[dsp-03] {} re-sending {}", id, message.type_name());
                self.send(process, message).await
            }
            None => {
                debug!("[dsp-03] {} has nothing to re-send in {}", id, process.state);
                Ok(process)
            }
        }
    }

    async fn expire_stale(&self, now: Timestamp) -> Result<Vec<ProcessId>, NegotiationError> {
        let cutoff = now.saturating_sub(self.config.process_timeout_secs);
        let stale = self.store.list_stale(cutoff).await?;
        let mut expired = Vec::new();

        for process in stale {
            let id = process.id;
            let result = self
                .apply_local(id, K::Termination, move |p, _| {
                    if p.last_modified >= cutoff {
                        return Err(NegotiationError::Conflict(format!("{id} advanced")));
                    }
                    p.error_detail = Some(TerminationDetail::reason(REASON_TIMED_OUT));
                    Ok(())
                })
                .await;
            match result {
                Ok(p) if p.state == NegotiationState::Terminated => expired.push(id),
                Ok(_) => {}
                Err(NegotiationError::Delivery { .. }) => expired.push(id),
                Err(e) if e.is_conflict() => debug!("[dsp-03] {} skipped by sweep: {}", id, e),
                Err(e) => warn!("[dsp-03] {} could not be expired: {}", id, e),
            }
        }

        if !expired.is_empty() {
            info!("[dsp-03] expired {} stale negotiations", expired.len());
        }
        Ok(expired)
    }

    async fn status(
        &self,
        id: ProcessId,
        caller: &IdentityClaim,
    ) -> Result<ContractNegotiationAck, NegotiationError> {
        let process = self.store.load(id).await?;
        check_caller(&process, caller)?;
        Ok(process.ack())
    }

    async fn get(&self, id: ProcessId) -> Result<NegotiationProcess, NegotiationError> {
        Ok(self.store.load(id).await?)
    }
}

fn parse_pid(pid: &str) -> Result<ProcessId, NegotiationError> {
    pid.parse()
        .map_err(|_| NegotiationError::NotFound(pid.to_string()))
}

fn own_pid(pid: Option<&str>) -> Result<Target, NegotiationError> {
    let pid = pid.ok_or_else(|| {
        NegotiationError::NotFound("message does not name a local negotiation".to_string())
    })?;
    parse_pid(pid).map(Target::Existing)
}

fn check_caller(process: &NegotiationProcess, caller: &IdentityClaim) -> Result<(), NegotiationError> {
    if process.counterparty_id != caller.subject {
        return Err(NegotiationError::IdentityMismatch {
            expected: process.counterparty_id.clone(),
            actual: caller.subject.clone(),
        });
    }
    Ok(())
}

fn illegal(process: &NegotiationProcess, kind: NegotiationMessageKind) -> NegotiationError {
    NegotiationError::IllegalTransition {
        role: process.role,
        state: process.state,
        kind,
    }
}

fn unchanged(process: NegotiationProcess) -> NegotiationOutcome {
    NegotiationOutcome {
        process,
        transitioned: false,
        follow_up: None,
    }
}

fn rfc3339(now: Timestamp) -> String {
    i64::try_from(now)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}
