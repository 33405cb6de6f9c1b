//! # Outbound Ports
//!
//! Besides storage and transport, the transfer engine needs to know whether
//! an agreement exists and who it was concluded with.

use crate::domain::TransferError;
use async_trait::async_trait;
pub use dsp_02_message_codec::{DeliveryError, Transport};
pub use dsp_05_process_store::ProcessStore;
use shared_types::NegotiationState;

/// What the transfer engine needs to know about an agreement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgreementRecord {
    /// Agreement `@id`.
    pub agreement_id: String,
    /// State of the negotiation that produced it.
    pub negotiation_state: NegotiationState,
    /// The other party of the agreement.
    pub counterparty_id: String,
    /// Governed resource.
    pub target: Option<String>,
}

impl AgreementRecord {
    /// Only agreements of FINALIZED negotiations may govern transfers.
    pub fn is_finalized(&self) -> bool {
        self.negotiation_state == NegotiationState::Finalized
    }
}

/// Agreement lookup - outbound port.
#[async_trait]
pub trait AgreementLookup: Send + Sync {
    /// Find the agreement with this id, if any negotiation carries it.
    async fn find_agreement(&self, agreement_id: &str)
        -> Result<Option<AgreementRecord>, TransferError>;
}
