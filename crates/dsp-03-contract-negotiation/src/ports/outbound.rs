//! # Outbound Ports
//!
//! The engine depends on the process store, the message transport and an
//! offer evaluator. The first two are owned by their crates and re-exported
//! here for adapters.

use async_trait::async_trait;
use shared_types::Policy;

pub use dsp_02_message_codec::{DeliveryError, Transport};
pub use dsp_05_process_store::ProcessStore;

/// Provider-side check of the terms a consumer puts forward.
///
/// Called for the initial contract request and for every counter-request
/// before anything is stored. A rejection ends the request with
/// `InvalidOffer`.
#[async_trait]
pub trait OfferEvaluator: Send + Sync {
    /// `Err` carries the rejection reason.
    async fn evaluate(&self, offer: &Policy, counterparty_id: &str) -> Result<(), String>;
}
