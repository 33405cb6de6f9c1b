//! # Protocol Endpoints
//!
//! One endpoint per message type per process kind, relative to a
//! connector's callback address:
//!
//! ```text
//! GET  /negotiations/{pid}                          ContractNegotiation
//! POST /negotiations/request                        ContractRequestMessage (initial)
//! POST /negotiations/{pid}/request                  ContractRequestMessage (counter)
//! POST /negotiations/{pid}/offers                   ContractOfferMessage (counter)
//! POST /negotiations/{pid}/events                   ContractNegotiationEventMessage
//! POST /negotiations/{pid}/agreement                ContractAgreementMessage
//! POST /negotiations/{pid}/agreement/verification   ContractAgreementVerificationMessage
//! POST /negotiations/{pid}/termination              ContractNegotiationTerminationMessage
//! GET  /transfers/{pid}                             TransferProcess
//! POST /transfers/request                           TransferRequestMessage
//! POST /transfers/{pid}/start                       TransferStartMessage
//! POST /transfers/{pid}/suspension                  TransferSuspensionMessage
//! POST /transfers/{pid}/completion                  TransferCompletionMessage
//! POST /transfers/{pid}/termination                 TransferTerminationMessage
//! GET  /.well-known/dspace-version                  version metadata
//! ```
//!
//! `{pid}` is always the recipient's own process id. Negotiations start only
//! from a consumer request, so there is no route for an initial offer.

use dsp_02_message_codec::{NegotiationMessage, ProtocolMessage, TransferMessage};
use shared_types::Role;
use std::fmt;

/// Which engine an endpoint belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessKind {
    /// Contract negotiation endpoints.
    Negotiation,
    /// Transfer process endpoints.
    Transfer,
    /// Version discovery.
    Metadata,
}

/// A protocol endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET /.well-known/dspace-version`
    Version,
    /// `GET /negotiations/{pid}`
    NegotiationStatus(String),
    /// `POST /negotiations/request`
    NegotiationRequest,
    /// `POST /negotiations/{pid}/request`
    NegotiationCounterRequest(String),
    /// `POST /negotiations/{pid}/offers`
    NegotiationOffer(String),
    /// `POST /negotiations/{pid}/events`
    NegotiationEvent(String),
    /// `POST /negotiations/{pid}/agreement`
    NegotiationAgreement(String),
    /// `POST /negotiations/{pid}/agreement/verification`
    NegotiationVerification(String),
    /// `POST /negotiations/{pid}/termination`
    NegotiationTermination(String),
    /// `GET /transfers/{pid}`
    TransferStatus(String),
    /// `POST /transfers/request`
    TransferRequest,
    /// `POST /transfers/{pid}/start`
    TransferStart(String),
    /// `POST /transfers/{pid}/suspension`
    TransferSuspension(String),
    /// `POST /transfers/{pid}/completion`
    TransferCompletion(String),
    /// `POST /transfers/{pid}/termination`
    TransferTermination(String),
}

impl Endpoint {
    /// Route a request. `path` is relative to the callback address.
    pub fn parse(method: &str, path: &str) -> Option<Endpoint> {
        let path = path.split('?').next().unwrap_or(path);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let endpoint = match (method.to_ascii_uppercase().as_str(), segments.as_slice()) {
            ("GET", [".well-known", "dspace-version"]) => Endpoint::Version,
            ("GET", ["negotiations", id]) => Endpoint::NegotiationStatus(id.to_string()),
            ("POST", ["negotiations", "request"]) => Endpoint::NegotiationRequest,
            ("POST", ["negotiations", id, "request"]) => Endpoint::NegotiationCounterRequest(id.to_string()),
            ("POST", ["negotiations", id, "offers"]) => Endpoint::NegotiationOffer(id.to_string()),
            ("POST", ["negotiations", id, "events"]) => Endpoint::NegotiationEvent(id.to_string()),
            ("POST", ["negotiations", id, "agreement"]) => Endpoint::NegotiationAgreement(id.to_string()),
            ("POST", ["negotiations", id, "agreement", "verification"]) => {
                Endpoint::NegotiationVerification(id.to_string())
            }
            ("POST", ["negotiations", id, "termination"]) => {
                Endpoint::NegotiationTermination(id.to_string())
            }
            ("GET", ["transfers", id]) => Endpoint::TransferStatus(id.to_string()),
            ("POST", ["transfers", "request"]) => Endpoint::TransferRequest,
            ("POST", ["transfers", id, "start"]) => Endpoint::TransferStart(id.to_string()),
            ("POST", ["transfers", id, "suspension"]) => Endpoint::TransferSuspension(id.to_string()),
            ("POST", ["transfers", id, "completion"]) => Endpoint::TransferCompletion(id.to_string()),
            ("POST", ["transfers", id, "termination"]) => Endpoint::TransferTermination(id.to_string()),
            _ => return None,
        };
        Some(endpoint)
    }

    /// Endpoint at which `recipient` expects `message`.
    ///
    /// `None` for acknowledgements, error bodies, and messages that do not
    /// carry the recipient's process id yet.
    pub fn for_message(message: &ProtocolMessage, recipient: Role) -> Option<Endpoint> {
        match message {
            ProtocolMessage::Negotiation(m) => {
                let pid = match recipient {
                    Role::Provider => m.provider_pid(),
                    Role::Consumer => m.consumer_pid(),
                }
                .map(str::to_string);
                match m {
                    NegotiationMessage::Request(_) => Some(
                        pid.map_or(Endpoint::NegotiationRequest, Endpoint::NegotiationCounterRequest),
                    ),
                    NegotiationMessage::Offer(_) => pid.map(Endpoint::NegotiationOffer),
                    NegotiationMessage::Event(_) => pid.map(Endpoint::NegotiationEvent),
                    NegotiationMessage::Agreement(_) => pid.map(Endpoint::NegotiationAgreement),
                    NegotiationMessage::Verification(_) => {
                        pid.map(Endpoint::NegotiationVerification)
                    }
                    NegotiationMessage::Termination(_) => pid.map(Endpoint::NegotiationTermination),
                }
            }
            ProtocolMessage::Transfer(m) => {
                let pid = match recipient {
                    Role::Provider => m.provider_pid().map(str::to_string),
                    Role::Consumer => Some(m.consumer_pid().to_string()),
                };
                match m {
                    TransferMessage::Request(_) => Some(Endpoint::TransferRequest),
                    TransferMessage::Start(_) => pid.map(Endpoint::TransferStart),
                    TransferMessage::Suspension(_) => pid.map(Endpoint::TransferSuspension),
                    TransferMessage::Completion(_) => pid.map(Endpoint::TransferCompletion),
                    TransferMessage::Termination(_) => pid.map(Endpoint::TransferTermination),
                }
            }
            _ => None,
        }
    }

    /// HTTP method.
    pub fn method(&self) -> &'static str {
        match self {
            Endpoint::Version | Endpoint::NegotiationStatus(_) | Endpoint::TransferStatus(_) => {
                "GET"
            }
            _ => "POST",
        }
    }

    /// Path relative to the callback address.
    pub fn path(&self) -> String {
        match self {
            Endpoint::Version => "/.well-known/dspace-version".to_string(),
            Endpoint::NegotiationStatus(pid) => format!("/negotiations/{pid}"),
            Endpoint::NegotiationRequest => "/negotiations/request".to_string(),
            Endpoint::NegotiationCounterRequest(pid) => format!("/negotiations/{pid}/request"),
            Endpoint::NegotiationOffer(pid) => format!("/negotiations/{pid}/offers"),
            Endpoint::NegotiationEvent(pid) => format!("/negotiations/{pid}/events"),
            Endpoint::NegotiationAgreement(pid) => format!("/negotiations/{pid}/agreement"),
            Endpoint::NegotiationVerification(pid) => {
                format!("/negotiations/{pid}/agreement/verification")
            }
            Endpoint::NegotiationTermination(pid) => format!("/negotiations/{pid}/termination"),
            Endpoint::TransferStatus(pid) => format!("/transfers/{pid}"),
            Endpoint::TransferRequest => "/transfers/request".to_string(),
            Endpoint::TransferStart(pid) => format!("/transfers/{pid}/start"),
            Endpoint::TransferSuspension(pid) => format!("/transfers/{pid}/suspension"),
            Endpoint::TransferCompletion(pid) => format!("/transfers/{pid}/completion"),
            Endpoint::TransferTermination(pid) => format!("/transfers/{pid}/termination"),
        }
    }

    /// Absolute URL under `base`.
    pub fn url(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.path())
    }

    /// Engine the endpoint belongs to.
    pub fn process_kind(&self) -> ProcessKind {
        match self {
            Endpoint::Version => ProcessKind::Metadata,
            Endpoint::NegotiationStatus(_)
            | Endpoint::NegotiationRequest
            | Endpoint::NegotiationCounterRequest(_)
            | Endpoint::NegotiationOffer(_)
            | Endpoint::NegotiationEvent(_)
            | Endpoint::NegotiationAgreement(_)
            | Endpoint::NegotiationVerification(_)
            | Endpoint::NegotiationTermination(_) => ProcessKind::Negotiation,
            _ => ProcessKind::Transfer,
        }
    }

    /// Process id in the path.
    pub fn path_pid(&self) -> Option<&str> {
        match self {
            Endpoint::Version
            | Endpoint::NegotiationRequest
            | Endpoint::TransferRequest => None,
            Endpoint::NegotiationStatus(pid)
            | Endpoint::NegotiationCounterRequest(pid)
            | Endpoint::NegotiationOffer(pid)
            | Endpoint::NegotiationEvent(pid)
            | Endpoint::NegotiationAgreement(pid)
            | Endpoint::NegotiationVerification(pid)
            | Endpoint::NegotiationTermination(pid)
            | Endpoint::TransferStatus(pid)
            | Endpoint::TransferStart(pid)
            | Endpoint::TransferSuspension(pid)
            | Endpoint::TransferCompletion(pid)
            | Endpoint::TransferTermination(pid) => Some(pid),
        }
    }

    /// Whether `message` may be posted here: the type must match and the
    /// path id must be one of the message's process ids.
    pub fn accepts(&self, message: &ProtocolMessage) -> bool {
        use NegotiationMessage as N;
        use ProtocolMessage as P;
        use TransferMessage as T;

        let type_matches = match (self, message) {
            (Endpoint::NegotiationRequest, P::Negotiation(N::Request(m))) => {
                m.provider_pid.is_none()
            }
            (Endpoint::NegotiationCounterRequest(_), P::Negotiation(N::Request(m))) => {
                m.provider_pid.is_some()
            }
            (Endpoint::NegotiationOffer(_), P::Negotiation(N::Offer(m))) => m.consumer_pid.is_some(),
            (Endpoint::NegotiationEvent(_), P::Negotiation(N::Event(_)))
            | (Endpoint::NegotiationAgreement(_), P::Negotiation(N::Agreement(_)))
            | (Endpoint::NegotiationVerification(_), P::Negotiation(N::Verification(_)))
            | (Endpoint::NegotiationTermination(_), P::Negotiation(N::Termination(_)))
            | (Endpoint::TransferRequest, P::Transfer(T::Request(_)))
            | (Endpoint::TransferStart(_), P::Transfer(T::Start(_)))
            | (Endpoint::TransferSuspension(_), P::Transfer(T::Suspension(_)))
            | (Endpoint::TransferCompletion(_), P::Transfer(T::Completion(_)))
            | (Endpoint::TransferTermination(_), P::Transfer(T::Termination(_))) => true,
            _ => false,
        };
        if !type_matches {
            return false;
        }

        match self.path_pid() {
            None => true,
            Some(pid) => match message {
                P::Negotiation(m) => m.consumer_pid() == Some(pid) || m.provider_pid() == Some(pid),
                P::Transfer(m) => m.consumer_pid() == pid || m.provider_pid() == Some(pid),
                _ => false,
            },
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}
