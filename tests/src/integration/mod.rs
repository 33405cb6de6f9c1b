//! Cross-connector integration flows.

pub mod negotiation_flows;
pub mod resilience;
pub mod transfer_flows;
