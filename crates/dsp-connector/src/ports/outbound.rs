//! # Outbound Ports
//!
//! Collaborators the embedding application provides.

use async_trait::async_trait;
use dsp_04_transfer_process::TransferProcess;
use shared_types::DataAddress;
use thiserror::Error;

/// A protocol message ready to be posted.
#[derive(Clone, Debug)]
pub struct WireRequest {
    /// Absolute endpoint URL.
    pub url: String,
    /// Value of the `Authorization` header.
    pub authorization: String,
    /// JSON-LD body.
    pub body: Vec<u8>,
}

/// Raw response from the counterparty.
#[derive(Clone, Debug)]
pub struct WireResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, possibly empty.
    pub body: Vec<u8>,
}

/// No response was received.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct WireError(pub String);

/// HTTP client used by the outbound transport.
#[async_trait]
pub trait WireClient: Send + Sync {
    /// POST `request` and return whatever the counterparty answered.
    async fn post(&self, request: WireRequest) -> Result<WireResponse, WireError>;
}

/// Supplies access coordinates when a requested transfer is started
/// automatically.
#[async_trait]
pub trait DataAddressProvider: Send + Sync {
    /// Data address for `process`, or `None` to leave the transfer REQUESTED.
    async fn data_address_for(&self, process: &TransferProcess) -> Option<DataAddress>;
}
