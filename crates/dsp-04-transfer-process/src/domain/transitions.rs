//! # Transition Table
//!
//! | From             | Kind        | To         | Sender            |
//! |------------------|-------------|------------|-------------------|
//! | REQUESTED        | Start       | STARTED    | provider          |
//! | SUSPENDED        | Start       | STARTED    | either (resume)   |
//! | STARTED          | Suspension  | SUSPENDED  | either            |
//! | any non-terminal | Completion  | COMPLETED  | either            |
//! | any non-terminal | Termination | TERMINATED | either            |
//!
//! Requests only create processes and never apply to an existing one.

use dsp_02_message_codec::TransferMessageKind;
use shared_types::{Role, TransferState};

/// Where a message originates relative to the process owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Received from the counterparty.
    Inbound,
    /// Produced by a local action.
    Local,
}

/// Next state for `kind` in `from`, or `None` when illegal.
pub fn next_state(from: TransferState, kind: TransferMessageKind) -> Option<TransferState> {
    use TransferMessageKind as K;
    use TransferState as S;
    match (from, kind) {
        (S::Requested | S::Suspended, K::Start) => Some(S::Started),
        (S::Started, K::Suspension) => Some(S::Suspended),
        (s, K::Completion) if !s.is_terminal() => Some(S::Completed),
        (s, K::Termination) if !s.is_terminal() => Some(S::Terminated),
        _ => None,
    }
}

/// Whether a process in `role` and `state` may see `kind` from `direction`.
pub fn sender_allowed(
    role: Role,
    state: TransferState,
    kind: TransferMessageKind,
    direction: Direction,
) -> bool {
    match (kind.sender(Some(state)), direction) {
        (None, _) => true,
        (Some(sender), Direction::Inbound) => sender != role,
        (Some(sender), Direction::Local) => sender == role,
    }
}

/// Kind of the message that leads into `state`.
pub fn kind_for(state: TransferState) -> TransferMessageKind {
    use TransferMessageKind as K;
    match state {
        TransferState::Requested => K::Request,
        TransferState::Started => K::Start,
        TransferState::Suspended => K::Suspension,
        TransferState::Completed => K::Completion,
        TransferState::Terminated => K::Termination,
    }
}
