//! # Test Harness
//!
//! A dataspace of connectors sharing one clock, one key registry and one
//! in-process wire. Messages posted by a connector's transport are routed to
//! the connector registered for the URL's base address and handled exactly
//! as an HTTP front end would handle them.

use async_trait::async_trait;
use dsp_01_identity_verifier::{SigningKeyMaterial, StaticKeyResolver, TokenIssuer};
use dsp_03_contract_negotiation::{
    ContractNegotiationApi, NegotiationEngine, NegotiationProcess, OfferCatalog,
};
use dsp_04_transfer_process::{TransferEngine, TransferProcess, TransferProcessApi};
use dsp_connector::{
    ConnectorConfig, ConnectorPorts, DataAddressProvider, DspConnector, DspTransport, Endpoint,
    WireClient, WireError, WireRequest, WireResponse,
};
use dsp_telemetry::{init_tracing, TelemetryConfig};
use parking_lot::RwLock;
use shared_types::{
    DataAddress, ManualTimeSource, NegotiationState, Policy, ProcessId, Role, TransferState,
};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

/// Start of the shared clock.
pub const EPOCH: u64 = 1_700_000_000;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let config = TelemetryConfig {
            log_level: "warn".to_string(),
            ..TelemetryConfig::default()
        }
        .for_service("dsp-tests");
        // Another test binary may already own the global subscriber.
        let _ = init_tracing(&config);
    });
}

// =============================================================================
// LOOPBACK WIRE
// =============================================================================

/// In-process `WireClient` routing by base address.
#[derive(Default)]
pub struct LoopbackWire {
    routes: RwLock<HashMap<String, Arc<DspConnector>>>,
    offline: RwLock<HashSet<String>>,
    delivered: AtomicUsize,
}

impl LoopbackWire {
    /// Route URLs under `base` to `connector`.
    pub fn register(&self, base: &str, connector: Arc<DspConnector>) {
        self.routes.write().insert(base.to_string(), connector);
    }

    /// Make `base` unreachable (or reachable again).
    pub fn set_offline(&self, base: &str, offline: bool) {
        if offline {
            self.offline.write().insert(base.to_string());
        } else {
            self.offline.write().remove(base);
        }
    }

    /// Requests that reached a connector.
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    fn route(&self, url: &str) -> Option<(String, Arc<DspConnector>)> {
        self.routes
            .read()
            .iter()
            .find(|(base, _)| url.starts_with(base.as_str()))
            .map(|(base, connector)| (base.clone(), connector.clone()))
    }
}

#[async_trait]
impl WireClient for LoopbackWire {
    async fn post(&self, request: WireRequest) -> Result<WireResponse, WireError> {
        let (base, connector) = self
            .route(&request.url)
            .ok_or_else(|| WireError(format!("no route to {}", request.url)))?;
        if self.offline.read().contains(&base) {
            return Err(WireError(format!("{base} is offline")));
        }

        let Some(endpoint) = Endpoint::parse("POST", &request.url[base.len()..]) else {
            return Ok(WireResponse {
                status: 404,
                body: Vec::new(),
            });
        };
        self.delivered.fetch_add(1, Ordering::SeqCst);
        let response = connector
            .handle(&endpoint, Some(&request.authorization), &request.body)
            .await;
        Ok(WireResponse {
            status: response.status,
            body: response.body,
        })
    }
}

// =============================================================================
// PARTICIPANTS
// =============================================================================

/// Data addresses pointing at a fixed HTTP endpoint.
pub struct StaticDataAddresses {
    /// Base URL of the data plane.
    pub endpoint: String,
}

#[async_trait]
impl DataAddressProvider for StaticDataAddresses {
    async fn data_address_for(&self, process: &TransferProcess) -> Option<DataAddress> {
        Some(DataAddress::http(
            format!("{}/{}", self.endpoint, process.agreement_id),
            Some("data-plane-token".to_string()),
        ))
    }
}

/// One connector in the dataspace.
pub struct Participant {
    /// DID.
    pub id: String,
    /// Callback address.
    pub address: String,
    /// Signs this participant's tokens.
    pub issuer: Arc<TokenIssuer>,
    /// Offers this participant accepts requests for.
    pub catalog: Arc<OfferCatalog>,
    /// The connector under test.
    pub connector: Arc<DspConnector>,
}

impl Participant {
    /// Negotiation engine.
    pub fn negotiations(&self) -> &Arc<NegotiationEngine> {
        self.connector.negotiations()
    }

    /// Transfer engine.
    pub fn transfers(&self) -> &Arc<TransferEngine> {
        self.connector.transfers()
    }

    /// `Authorization` header value for a call to `audience`.
    pub fn bearer_for(&self, audience: &str) -> String {
        format!("Bearer {}", self.issuer.issue(audience, 300).expect("token"))
    }
}

/// Connectors sharing a clock, a key registry and a wire.
pub struct Dataspace {
    /// Shared wire.
    pub wire: Arc<LoopbackWire>,
    /// Keys of every participant.
    pub resolver: Arc<StaticKeyResolver>,
    /// Shared clock.
    pub time: Arc<ManualTimeSource>,
    next_seed: AtomicU8,
}

impl Default for Dataspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Dataspace {
    /// Empty dataspace.
    pub fn new() -> Self {
        init_logging();
        Self {
            wire: Arc::new(LoopbackWire::default()),
            resolver: Arc::new(StaticKeyResolver::new()),
            time: Arc::new(ManualTimeSource::new(EPOCH)),
            next_seed: AtomicU8::new(1),
        }
    }

    /// Participant `did:web:{name}.example` with default configuration.
    pub fn join(&self, name: &str) -> Participant {
        self.join_with(name, |_| {}, None)
    }

    /// Participant with an adjusted configuration and an optional data
    /// address provider.
    pub fn join_with(
        &self,
        name: &str,
        configure: impl FnOnce(&mut ConnectorConfig),
        data_addresses: Option<Arc<dyn DataAddressProvider>>,
    ) -> Participant {
        let id = format!("did:web:{name}.example");
        let address = format!("https://{name}.example/api/dsp/2025/1");
        let seed = self.next_seed.fetch_add(1, Ordering::SeqCst);

        let issuer = Arc::new(TokenIssuer::new(
            id.as_str(),
            "key-1",
            SigningKeyMaterial::ed25519(&[seed; 32]),
            self.time.clone(),
        ));
        self.resolver.register(id.as_str(), issuer.verification_key());

        let mut config = ConnectorConfig::new(id.as_str(), address.as_str());
        configure(&mut config);
        let transport = Arc::new(DspTransport::new(
            self.wire.clone(),
            issuer.clone(),
            config.token_ttl_secs,
        ));
        let catalog = Arc::new(OfferCatalog::new());
        let mut ports = ConnectorPorts::in_memory(
            self.resolver.clone(),
            transport,
            catalog.clone(),
            self.time.clone(),
        );
        if let Some(provider) = data_addresses {
            ports = ports.with_data_addresses(provider);
        }
        let connector = Arc::new(DspConnector::new(config, ports).expect("valid connector"));
        self.wire.register(&address, connector.clone());

        Participant {
            id,
            address,
            issuer,
            catalog,
            connector,
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Offer for `target`, published in `provider`'s catalog.
pub fn offer(provider: &Participant, target: &str) -> Policy {
    let mut policy = Policy::offer(format!("urn:offer:{target}"), target);
    policy.assigner = Some(provider.id.clone());
    provider
        .catalog
        .publish(policy.clone())
        .expect("publishable offer");
    policy
}

/// Counterparty process id bound on `process`.
pub fn counterparty_pid(correlation_id: &Option<String>) -> ProcessId {
    correlation_id
        .as_deref()
        .expect("correlation bound")
        .parse()
        .expect("process id")
}

/// Poll `check` until it yields a value.
pub async fn eventually<T, F, Fut>(what: &str, mut check: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for _ in 0..400 {
        if let Some(value) = check().await {
            return value;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Wait until negotiation `id` at `participant` is in `state`.
pub async fn negotiation_in(
    participant: &Participant,
    id: ProcessId,
    state: NegotiationState,
) -> NegotiationProcess {
    eventually(&format!("negotiation {id} {state}"), || async move {
        participant
            .negotiations()
            .get(id)
            .await
            .ok()
            .filter(|p| p.state == state)
    })
    .await
}

/// Wait until transfer `id` at `participant` is in `state`.
pub async fn transfer_in(
    participant: &Participant,
    id: ProcessId,
    state: TransferState,
) -> TransferProcess {
    eventually(&format!("transfer {id} {state}"), || async move {
        participant
            .transfers()
            .get(id)
            .await
            .ok()
            .filter(|p| p.state == state)
    })
    .await
}

/// Run a negotiation for `target` to FINALIZED on both sides.
///
/// Returns the consumer's and the provider's records.
pub async fn finalized_agreement(
    consumer: &Participant,
    provider: &Participant,
    target: &str,
) -> (NegotiationProcess, NegotiationProcess) {
    let started = consumer
        .negotiations()
        .initiate(
            Role::Consumer,
            offer(provider, target),
            &provider.id,
            &provider.address,
        )
        .await
        .expect("initiate");
    let provider_pid = counterparty_pid(&started.correlation_id);

    provider
        .negotiations()
        .finalize(provider_pid)
        .await
        .expect("provider agrees");

    let consumer_side = negotiation_in(consumer, started.id, NegotiationState::Finalized).await;
    let provider_side = negotiation_in(provider, provider_pid, NegotiationState::Finalized).await;
    (consumer_side, provider_side)
}
