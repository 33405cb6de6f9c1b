//! # DSP Connector
//!
//! Entry point for protocol requests arriving at one participant.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   ┌─────────┐   ┌──────────────┐   ┌────────────────┐
//! │ verify token │──>│ decode  │──>│ endpoint/type│──>│ engine (retry  │──> ack
//! │  401         │   │  400    │   │ /pid  400    │   │ on conflict)   │
//! └──────────────┘   └─────────┘   └──────────────┘   └────────────────┘
//!                                                             │
//!                                          spawned: follow-up delivery, automation
//! ```
//!
//! Nothing touches process state before the token is verified. Failures are
//! answered with a `ContractNegotiationError` or `TransferError` body
//! carrying a reason code and text.

use crate::automation::Automation;
use crate::config::ConnectorConfig;
use crate::endpoint::{Endpoint, ProcessKind};
use crate::error::ConnectorError;
use crate::ports::DataAddressProvider;
use dsp_01_identity_verifier::{
    IdentityClaim, IdentityVerificationApi, IdentityVerifier, KeyResolver,
};
use dsp_02_message_codec::{
    decode, encode_message, reason_values, supported_versions, ContractNegotiationErrorMessage,
    NegotiationMessage, ProtocolMessage, Transport, TransferErrorMessage, TransferMessage,
};
use dsp_03_contract_negotiation::{
    ContractNegotiationApi, NegotiationEngine, NegotiationOutcome, NegotiationProcess,
    OfferEvaluator,
};
use dsp_04_transfer_process::{
    NegotiationAgreementLookup, TransferEngine, TransferOutcome, TransferProcess,
    TransferProcessApi,
};
use dsp_05_process_store::{InMemoryProcessStore, ProcessStore};
use shared_types::{Extensions, ProcessId, TimeSource};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Status and JSON body answering a protocol request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DspResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body, empty only when encoding failed.
    pub body: Vec<u8>,
}

impl DspResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn message(status: u16, message: &ProtocolMessage) -> Self {
        match encode_message(message) {
            Ok(body) => Self { status, body },
            Err(e) => {
                warn!("[dsp-connector] failed to encode {}: {}", message.type_name(), e);
                Self {
                    status: 500,
                    body: Vec::new(),
                }
            }
        }
    }
}

/// Collaborators the connector is wired with.
pub struct ConnectorPorts {
    /// Resolves verification keys of token issuers.
    pub key_resolver: Arc<dyn KeyResolver>,
    /// Outbound delivery, normally a [`crate::DspTransport`].
    pub transport: Arc<dyn Transport>,
    /// Checks consumer-proposed terms, normally an `OfferCatalog`.
    pub offers: Arc<dyn OfferEvaluator>,
    /// Clock shared by the verifier and the engines.
    pub time: Arc<dyn TimeSource>,
    /// Negotiation records.
    pub negotiation_store: Arc<dyn ProcessStore<NegotiationProcess>>,
    /// Transfer records.
    pub transfer_store: Arc<dyn ProcessStore<TransferProcess>>,
    /// Access coordinates for automatic transfer starts.
    pub data_addresses: Option<Arc<dyn DataAddressProvider>>,
}

impl ConnectorPorts {
    /// Ports backed by in-memory stores.
    pub fn in_memory(
        key_resolver: Arc<dyn KeyResolver>,
        transport: Arc<dyn Transport>,
        offers: Arc<dyn OfferEvaluator>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            key_resolver,
            transport,
            offers,
            time,
            negotiation_store: Arc::new(InMemoryProcessStore::<NegotiationProcess>::new()),
            transfer_store: Arc::new(InMemoryProcessStore::<TransferProcess>::new()),
            data_addresses: None,
        }
    }

    /// Attach a data address provider.
    pub fn with_data_addresses(mut self, provider: Arc<dyn DataAddressProvider>) -> Self {
        self.data_addresses = Some(provider);
        self
    }
}

/// Protocol engines of one participant behind a single request handler.
pub struct DspConnector {
    config: ConnectorConfig,
    time: Arc<dyn TimeSource>,
    verifier: Arc<dyn IdentityVerificationApi>,
    negotiations: Arc<NegotiationEngine>,
    transfers: Arc<TransferEngine>,
    automation: Automation,
}

impl DspConnector {
    /// Validate `config` and wire the engines.
    pub fn new(config: ConnectorConfig, ports: ConnectorPorts) -> Result<Self, ConnectorError> {
        config.validate()?;

        let verifier = Arc::new(IdentityVerifier::new(
            ports.key_resolver,
            ports.time.clone(),
            config.identity.clone(),
        ));
        let negotiations = Arc::new(NegotiationEngine::new(
            ports.negotiation_store.clone(),
            ports.transport.clone(),
            ports.offers,
            ports.time.clone(),
            config.negotiation.clone(),
        ));
        let agreements = Arc::new(NegotiationAgreementLookup::new(ports.negotiation_store));
        let transfers = Arc::new(TransferEngine::new(
            ports.transfer_store,
            agreements,
            ports.transport,
            ports.time.clone(),
            config.transfer.clone(),
        ));
        let automation = Automation::new(
            config.automation.clone(),
            negotiations.clone(),
            transfers.clone(),
            ports.data_addresses,
        );

        info!(
            "[dsp-connector] {} serving at {}",
            config.participant_id, config.callback_address
        );
        Ok(Self {
            config,
            time: ports.time,
            verifier,
            negotiations,
            transfers,
            automation,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// DID of this participant.
    pub fn participant_id(&self) -> &str {
        &self.config.participant_id
    }

    /// Contract negotiation engine, for operator actions.
    pub fn negotiations(&self) -> &Arc<NegotiationEngine> {
        &self.negotiations
    }

    /// Transfer process engine, for operator actions.
    pub fn transfers(&self) -> &Arc<TransferEngine> {
        &self.transfers
    }

    /// Handle one protocol request.
    ///
    /// `authorization` is the raw `Authorization` header value.
    #[instrument(skip(self, authorization, body), fields(participant = %self.config.participant_id))]
    pub async fn handle(
        &self,
        endpoint: &Endpoint,
        authorization: Option<&str>,
        body: &[u8],
    ) -> DspResponse {
        match self.dispatch(endpoint, authorization, body).await {
            Ok(response) => response,
            Err(error) => self.reject(endpoint, body, error),
        }
    }

    /// Terminate processes of both kinds that saw no activity within their
    /// configured timeout.
    pub async fn expire_stale(&self) -> Result<Vec<ProcessId>, ConnectorError> {
        let now = self.time.now();
        let mut expired = self.negotiations.expire_stale(now).await?;
        expired.extend(self.transfers.expire_stale(now).await?);
        if !expired.is_empty() {
            info!("[dsp-connector] expired {} stale processes", expired.len());
        }
        Ok(expired)
    }

    async fn dispatch(
        &self,
        endpoint: &Endpoint,
        authorization: Option<&str>,
        body: &[u8],
    ) -> Result<DspResponse, ConnectorError> {
        if *endpoint == Endpoint::Version {
            let body = serde_json::to_vec(&supported_versions())
                .map_err(|e| ConnectorError::Config(e.to_string()))?;
            return Ok(DspResponse { status: 200, body });
        }

        let token = authorization
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConnectorError::MissingToken)?;
        let caller = self
            .verifier
            .verify(token, &self.config.participant_id)
            .await?;

        match endpoint {
            Endpoint::NegotiationStatus(pid) => {
                let ack = self.negotiations.status(parse_pid(pid)?, &caller).await?;
                return Ok(DspResponse::message(200, &ProtocolMessage::NegotiationAck(ack)));
            }
            Endpoint::TransferStatus(pid) => {
                let ack = self.transfers.status(parse_pid(pid)?, &caller).await?;
                return Ok(DspResponse::message(200, &ProtocolMessage::TransferAck(ack)));
            }
            _ => {}
        }

        let message = decode(body)?.message;
        if !endpoint.accepts(&message) {
            return Err(ConnectorError::EndpointMismatch {
                endpoint: endpoint.to_string(),
                message_type: message.type_name().to_string(),
            });
        }

        let creates = endpoint.path_pid().is_none();
        match message {
            ProtocolMessage::Negotiation(message) => {
                let outcome = self.apply_negotiation(message, &caller).await?;
                let status = if creates && outcome.transitioned { 201 } else { 200 };
                let response =
                    DspResponse::message(status, &ProtocolMessage::NegotiationAck(outcome.ack()));
                self.automation.after_negotiation(outcome);
                Ok(response)
            }
            ProtocolMessage::Transfer(message) => {
                let outcome = self.apply_transfer(message, &caller).await?;
                let status = if creates && outcome.transitioned { 201 } else { 200 };
                let response =
                    DspResponse::message(status, &ProtocolMessage::TransferAck(outcome.ack()));
                self.automation.after_transfer(outcome);
                Ok(response)
            }
            other => Err(ConnectorError::EndpointMismatch {
                endpoint: endpoint.to_string(),
                message_type: other.type_name().to_string(),
            }),
        }
    }

    async fn apply_negotiation(
        &self,
        message: NegotiationMessage,
        caller: &IdentityClaim,
    ) -> Result<NegotiationOutcome, ConnectorError> {
        let mut attempt = 0;
        loop {
            match self.negotiations.handle_inbound(message.clone(), caller).await {
                Err(e) if e.is_conflict() && attempt < self.config.max_conflict_retries => {
                    attempt += 1;
                    debug!(
                        "[dsp-connector] conflict on {}, retry {}",
                        message.type_name(),
                        attempt
                    );
                }
                result => return Ok(result?),
            }
        }
    }

    async fn apply_transfer(
        &self,
        message: TransferMessage,
        caller: &IdentityClaim,
    ) -> Result<TransferOutcome, ConnectorError> {
        let mut attempt = 0;
        loop {
            match self.transfers.handle_inbound(message.clone(), caller).await {
                Err(e) if e.is_conflict() && attempt < self.config.max_conflict_retries => {
                    attempt += 1;
                    debug!(
                        "[dsp-connector] conflict on {}, retry {}",
                        message.type_name(),
                        attempt
                    );
                }
                result => return Ok(result?),
            }
        }
    }

    fn reject(&self, endpoint: &Endpoint, body: &[u8], error: ConnectorError) -> DspResponse {
        let status = error.status();
        warn!("[dsp-connector] {} answered {}: {}", endpoint, status, error);

        // Pids are echoed only for authenticated requests.
        let (consumer_pid, provider_pid) = if status == 401 {
            (None, None)
        } else {
            pids_of(endpoint, body)
        };
        let code = Some(error.code().to_string());
        let reason = Some(reason_values(&error.to_string()));

        let message = match endpoint.process_kind() {
            ProcessKind::Negotiation => {
                ProtocolMessage::NegotiationError(ContractNegotiationErrorMessage {
                    consumer_pid,
                    provider_pid,
                    code,
                    reason,
                    extensions: Extensions::new(),
                })
            }
            ProcessKind::Transfer | ProcessKind::Metadata => {
                ProtocolMessage::TransferError(TransferErrorMessage {
                    consumer_pid,
                    provider_pid,
                    code,
                    reason,
                    extensions: Extensions::new(),
                })
            }
        };
        DspResponse::message(status, &message)
    }
}

fn parse_pid(pid: &str) -> Result<ProcessId, ConnectorError> {
    pid.parse()
        .map_err(|_| ConnectorError::InvalidProcessId(pid.to_string()))
}

/// Process ids named by the request body, if it decodes.
fn pids_of(endpoint: &Endpoint, body: &[u8]) -> (Option<String>, Option<String>) {
    match decode(body).map(|envelope| envelope.message) {
        Ok(ProtocolMessage::Negotiation(m)) => (
            m.consumer_pid().map(str::to_string),
            m.provider_pid().map(str::to_string),
        ),
        Ok(ProtocolMessage::Transfer(m)) => (
            Some(m.consumer_pid().to_string()),
            m.provider_pid().map(str::to_string),
        ),
        _ => (None, endpoint.path_pid().map(str::to_string)),
    }
}
