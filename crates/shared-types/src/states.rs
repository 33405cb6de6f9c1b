//! # Lifecycle States
//!
//! Wire-visible states of negotiation and transfer processes. The transition
//! tables live with the engines; these enums only know which states are final.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Contract negotiation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationState {
    /// Consumer has requested (or counter-requested) terms.
    Requested,
    /// Provider has offered (or counter-offered) terms.
    Offered,
    /// Consumer accepted the last offer.
    Accepted,
    /// Provider sent the agreement.
    Agreed,
    /// Consumer verified the agreement.
    Verified,
    /// Negotiation concluded successfully.
    Finalized,
    /// Negotiation ended without agreement.
    Terminated,
}

impl NegotiationState {
    /// No further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Terminated)
    }

    /// Upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Offered => "OFFERED",
            Self::Accepted => "ACCEPTED",
            Self::Agreed => "AGREED",
            Self::Verified => "VERIFIED",
            Self::Finalized => "FINALIZED",
            Self::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transfer process state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferState {
    /// Consumer requested a transfer.
    Requested,
    /// Provider started the transfer.
    Started,
    /// Transfer paused by either side.
    Suspended,
    /// Transfer finished successfully.
    Completed,
    /// Transfer ended abnormally.
    Terminated,
}

impl TransferState {
    /// No further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Terminated)
    }

    /// Upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Started => "STARTED",
            Self::Suspended => "SUSPENDED",
            Self::Completed => "COMPLETED",
            Self::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
