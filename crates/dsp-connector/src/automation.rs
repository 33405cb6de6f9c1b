//! # Follow-up Automation
//!
//! Work triggered by an accepted inbound message runs on spawned tokio tasks
//! after the acknowledgement has been produced, so the sender never waits for
//! a message travelling back to itself.

use crate::config::AutomationConfig;
use crate::ports::DataAddressProvider;
use dsp_03_contract_negotiation::{
    ContractNegotiationApi, NegotiationEngine, NegotiationOutcome, NegotiationProcess,
};
use dsp_04_transfer_process::{TransferEngine, TransferOutcome, TransferProcess, TransferProcessApi};
use shared_types::{NegotiationState, Role, TransferState};
use std::sync::Arc;
use tracing::{info, warn};

/// Negotiation step taken without operator action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NegotiationAction {
    /// Provider agrees to the current offer.
    Agree,
    /// Consumer verifies the received agreement.
    Verify,
    /// Provider finalizes the verified agreement.
    Finalize,
}

/// Automatic step for `process`, if the configuration asks for one.
pub fn negotiation_action(
    config: &AutomationConfig,
    process: &NegotiationProcess,
) -> Option<NegotiationAction> {
    match (process.role, process.state) {
        (Role::Provider, NegotiationState::Requested | NegotiationState::Accepted)
            if config.auto_agree_requests =>
        {
            Some(NegotiationAction::Agree)
        }
        (Role::Consumer, NegotiationState::Agreed) if config.auto_verify_agreements => {
            Some(NegotiationAction::Verify)
        }
        (Role::Provider, NegotiationState::Verified) if config.auto_finalize_verified => {
            Some(NegotiationAction::Finalize)
        }
        _ => None,
    }
}

/// Whether a requested transfer should be started automatically.
pub fn should_start(config: &AutomationConfig, process: &TransferProcess) -> bool {
    config.auto_start_transfers
        && process.role == Role::Provider
        && process.state == TransferState::Requested
}

/// Spawns follow-up work for accepted inbound messages.
pub(crate) struct Automation {
    config: AutomationConfig,
    negotiations: Arc<NegotiationEngine>,
    transfers: Arc<TransferEngine>,
    data_addresses: Option<Arc<dyn DataAddressProvider>>,
}

impl Automation {
    pub(crate) fn new(
        config: AutomationConfig,
        negotiations: Arc<NegotiationEngine>,
        transfers: Arc<TransferEngine>,
        data_addresses: Option<Arc<dyn DataAddressProvider>>,
    ) -> Self {
        Self {
            config,
            negotiations,
            transfers,
            data_addresses,
        }
    }

    /// Deliver the outcome's follow-up message and run the automatic step.
    pub(crate) fn after_negotiation(&self, outcome: NegotiationOutcome) {
        let action = if outcome.transitioned {
            negotiation_action(&self.config, &outcome.process)
        } else {
            None
        };
        if outcome.follow_up.is_none() && action.is_none() {
            return;
        }

        let engine = self.negotiations.clone();
        tokio::spawn(async move {
            let id = outcome.process.id;
            if let Err(e) = engine.deliver_follow_up(&outcome).await {
                warn!("[dsp-connector] {} follow-up delivery failed: {}", id, e);
            }
            let Some(action) = action else {
                return;
            };
            info!("[dsp-connector] {} automatic {:?}", id, action);
            let result = match action {
                NegotiationAction::Agree => engine.agree(id).await,
                NegotiationAction::Verify => engine.verify(id).await,
                NegotiationAction::Finalize => engine.finalize(id).await,
            };
            if let Err(e) = result {
                warn!("[dsp-connector] {} automatic {:?} failed: {}", id, action, e);
            }
        });
    }

    /// Start a requested transfer when a data address is available.
    pub(crate) fn after_transfer(&self, outcome: TransferOutcome) {
        if !outcome.transitioned || !should_start(&self.config, &outcome.process) {
            return;
        }
        let Some(provider) = self.data_addresses.clone() else {
            warn!(
                "[dsp-connector] {} auto-start enabled without a data address provider",
                outcome.process.id
            );
            return;
        };

        let engine = self.transfers.clone();
        tokio::spawn(async move {
            let process = outcome.process;
            let Some(address) = provider.data_address_for(&process).await else {
                info!("[dsp-connector] {} has no data address, left REQUESTED", process.id);
                return;
            };
            if let Err(e) = engine.start(process.id, Some(address)).await {
                warn!("[dsp-connector] {} automatic start failed: {}", process.id, e);
            }
        });
    }
}
