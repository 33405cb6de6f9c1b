//! # Agreement Lookup over Negotiation Records
//!
//! Reads agreements from the negotiation store through its agreement-id
//! lookup path.

use crate::domain::TransferError;
use crate::ports::{AgreementLookup, AgreementRecord};
use async_trait::async_trait;
use dsp_03_contract_negotiation::NegotiationProcess;
use dsp_05_process_store::ProcessStore;
use shared_types::NegotiationState;
use std::sync::Arc;
use tracing::debug;

/// [`AgreementLookup`] backed by a negotiation [`ProcessStore`].
pub struct NegotiationAgreementLookup {
    store: Arc<dyn ProcessStore<NegotiationProcess>>,
}

impl NegotiationAgreementLookup {
    /// Create a lookup over the given negotiation store.
    pub fn new(store: Arc<dyn ProcessStore<NegotiationProcess>>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AgreementLookup for NegotiationAgreementLookup {
    async fn find_agreement(
        &self,
        agreement_id: &str,
    ) -> Result<Option<AgreementRecord>, TransferError> {
        let mut negotiations = self.store.find_by_agreement_id(agreement_id).await?;
        debug!(
            "[dsp-04] agreement {} found on {} negotiations",
            agreement_id,
            negotiations.len()
        );
        // A FINALIZED negotiation wins over any other carrying the same id.
        negotiations.sort_by_key(|n| n.state != NegotiationState::Finalized);
        Ok(negotiations.into_iter().next().map(|n| AgreementRecord {
            agreement_id: agreement_id.to_string(),
            negotiation_state: n.state,
            counterparty_id: n.counterparty_id,
            target: n.offer.target,
        }))
    }
}
