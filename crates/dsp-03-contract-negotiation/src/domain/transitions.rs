//! # Transition Table
//!
//! Every (state, message kind) pair not listed here is illegal.
//!
//! | From                 | Kind         | To         |
//! |----------------------|--------------|------------|
//! | REQUESTED            | Offer        | OFFERED    |
//! | OFFERED              | Request      | REQUESTED  |
//! | OFFERED              | Accepted     | ACCEPTED   |
//! | REQUESTED, ACCEPTED  | Agreement    | AGREED     |
//! | AGREED               | Verification | VERIFIED   |
//! | VERIFIED             | Finalized    | FINALIZED  |
//! | any non-terminal     | Termination  | TERMINATED |

use dsp_02_message_codec::NegotiationMessageKind;
use shared_types::{NegotiationState, Role};

/// Where a message originates relative to the process owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Received from the counterparty.
    Inbound,
    /// Produced by a local action.
    Local,
}

/// State a message kind leads to.
pub fn target_state(kind: NegotiationMessageKind) -> NegotiationState {
    use NegotiationMessageKind as K;
    match kind {
        K::Request => NegotiationState::Requested,
        K::Offer => NegotiationState::Offered,
        K::Accepted => NegotiationState::Accepted,
        K::Agreement => NegotiationState::Agreed,
        K::Verification => NegotiationState::Verified,
        K::Finalized => NegotiationState::Finalized,
        K::Termination => NegotiationState::Terminated,
    }
}

/// Next state for `kind` in `from`, or `None` when illegal.
pub fn next_state(from: NegotiationState, kind: NegotiationMessageKind) -> Option<NegotiationState> {
    use NegotiationMessageKind as K;
    use NegotiationState as S;
    match (from, kind) {
        (S::Requested, K::Offer) => Some(S::Offered),
        (S::Offered, K::Request) => Some(S::Requested),
        (S::Offered, K::Accepted) => Some(S::Accepted),
        (S::Requested | S::Accepted, K::Agreement) => Some(S::Agreed),
        (S::Agreed, K::Verification) => Some(S::Verified),
        (S::Verified, K::Finalized) => Some(S::Finalized),
        (s, K::Termination) if !s.is_terminal() => Some(S::Terminated),
        _ => None,
    }
}

/// Offer/request exchanges that count toward the round bound.
pub fn counts_offer_round(from: NegotiationState, kind: NegotiationMessageKind) -> bool {
    use NegotiationMessageKind as K;
    use NegotiationState as S;
    matches!((from, kind), (S::Requested, K::Offer) | (S::Offered, K::Request))
}

/// Whether a process in `role` may see `kind` arriving from `direction`.
pub fn sender_allowed(role: Role, kind: NegotiationMessageKind, direction: Direction) -> bool {
    match (kind.sender(), direction) {
        (None, _) => true,
        (Some(sender), Direction::Inbound) => sender != role,
        (Some(sender), Direction::Local) => sender == role,
    }
}

/// Kind of the message this side last sent to reach `state`, if it was ours.
pub fn last_sent_kind(role: Role, state: NegotiationState) -> Option<NegotiationMessageKind> {
    use NegotiationMessageKind as K;
    use NegotiationState as S;
    match (role, state) {
        (_, S::Terminated) => Some(K::Termination),
        (Role::Consumer, S::Requested) => Some(K::Request),
        (Role::Consumer, S::Accepted) => Some(K::Accepted),
        (Role::Consumer, S::Verified) => Some(K::Verification),
        (Role::Provider, S::Offered) => Some(K::Offer),
        (Role::Provider, S::Agreed) => Some(K::Agreement),
        (Role::Provider, S::Finalized) => Some(K::Finalized),
        _ => None,
    }
}
