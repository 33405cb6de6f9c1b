//! # Connector Configuration
//!
//! Unified configuration for the engines hosted by one connector.
//!
//! The participant id and callback address appear once at the top level and
//! are copied into the engine configs by [`ConnectorConfig::new`];
//! [`ConnectorConfig::validate`] rejects configs where they drifted apart.

use crate::error::ConnectorError;
use dsp_01_identity_verifier::VerifierConfig;
use dsp_03_contract_negotiation::NegotiationConfig;
use dsp_04_transfer_process::TransferConfig;
use std::env;
use std::str::FromStr;
use tracing::warn;

/// Complete connector configuration.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// DID of this participant; the audience inbound tokens must name.
    pub participant_id: String,
    /// Base URL of this connector's protocol endpoints.
    pub callback_address: String,
    /// Token verification.
    pub identity: VerifierConfig,
    /// Contract negotiation engine.
    pub negotiation: NegotiationConfig,
    /// Transfer process engine.
    pub transfer: TransferConfig,
    /// Protocol confirmations performed without operator action.
    pub automation: AutomationConfig,
    /// Lifetime of tokens issued for outbound messages.
    pub token_ttl_secs: u64,
    /// Re-runs of an inbound message after a version conflict.
    pub max_conflict_retries: u32,
}

/// Automatic follow-up actions.
#[derive(Debug, Clone)]
pub struct AutomationConfig {
    /// Provider agrees to requested or accepted offers.
    pub auto_agree_requests: bool,
    /// Consumer verifies received agreements.
    pub auto_verify_agreements: bool,
    /// Provider finalizes verified agreements.
    pub auto_finalize_verified: bool,
    /// Provider starts requested transfers (needs a data address provider).
    pub auto_start_transfers: bool,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            auto_agree_requests: false,
            auto_verify_agreements: true,
            auto_finalize_verified: true,
            auto_start_transfers: false,
        }
    }
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        let negotiation = NegotiationConfig::default();
        Self::new(negotiation.participant_id, negotiation.callback_address)
    }
}

impl ConnectorConfig {
    /// Configuration for `participant_id` reachable at `callback_address`.
    pub fn new(participant_id: impl Into<String>, callback_address: impl Into<String>) -> Self {
        let participant_id = participant_id.into();
        let callback_address = callback_address.into();
        Self {
            negotiation: NegotiationConfig {
                participant_id: participant_id.clone(),
                callback_address: callback_address.clone(),
                ..NegotiationConfig::default()
            },
            transfer: TransferConfig {
                callback_address: callback_address.clone(),
                ..TransferConfig::default()
            },
            identity: VerifierConfig::default(),
            automation: AutomationConfig::default(),
            token_ttl_secs: 300,
            max_conflict_retries: 3,
            participant_id,
            callback_address,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DSP_PARTICIPANT_ID`: participant DID
    /// - `DSP_CALLBACK_ADDRESS`: base URL of the protocol endpoints
    /// - `DSP_TRUSTED_ISSUERS`: comma separated issuer DIDs (empty trusts any resolvable issuer)
    /// - `DSP_TOKEN_LEEWAY_SECS`, `DSP_TOKEN_TTL_SECS`
    /// - `DSP_MAX_OFFER_ROUNDS`, `DSP_PROCESS_TIMEOUT_SECS`, `DSP_TRANSFER_FORMAT`
    /// - `DSP_MAX_CONFLICT_RETRIES`
    /// - `DSP_AUTO_AGREE`, `DSP_AUTO_VERIFY`, `DSP_AUTO_FINALIZE`, `DSP_AUTO_START`
    ///
    /// Unset variables keep their defaults; unparseable ones are logged and
    /// ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut config = Self::new(
            env::var("DSP_PARTICIPANT_ID").unwrap_or(defaults.participant_id),
            env::var("DSP_CALLBACK_ADDRESS").unwrap_or(defaults.callback_address),
        );

        if let Ok(issuers) = env::var("DSP_TRUSTED_ISSUERS") {
            config.identity.trusted_issuers = issuers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(leeway) = env_parse("DSP_TOKEN_LEEWAY_SECS") {
            config.identity.leeway_secs = leeway;
        }
        if let Some(ttl) = env_parse("DSP_TOKEN_TTL_SECS") {
            config.token_ttl_secs = ttl;
        }
        if let Some(rounds) = env_parse("DSP_MAX_OFFER_ROUNDS") {
            config.negotiation.max_offer_rounds = rounds;
        }
        if let Some(timeout) = env_parse("DSP_PROCESS_TIMEOUT_SECS") {
            config.negotiation.process_timeout_secs = timeout;
            config.transfer.process_timeout_secs = timeout;
        }
        if let Ok(format) = env::var("DSP_TRANSFER_FORMAT") {
            config.transfer.default_format = format;
        }
        if let Some(retries) = env_parse("DSP_MAX_CONFLICT_RETRIES") {
            config.max_conflict_retries = retries;
        }
        if let Some(flag) = env_flag("DSP_AUTO_AGREE") {
            config.automation.auto_agree_requests = flag;
        }
        if let Some(flag) = env_flag("DSP_AUTO_VERIFY") {
            config.automation.auto_verify_agreements = flag;
        }
        if let Some(flag) = env_flag("DSP_AUTO_FINALIZE") {
            config.automation.auto_finalize_verified = flag;
        }
        if let Some(flag) = env_flag("DSP_AUTO_START") {
            config.automation.auto_start_transfers = flag;
        }
        config
    }

    /// Check the configuration before wiring the engines.
    ///
    /// # Returns
    ///
    /// Returns `Err` if:
    /// - the participant id is not a DID
    /// - the callback address is not an http(s) URL
    /// - an engine config names a different participant or callback address
    /// - an offer round bound, timeout or token lifetime is zero
    pub fn validate(&self) -> Result<(), ConnectorError> {
        if !self.participant_id.starts_with("did:") {
            return Err(ConnectorError::Config(format!(
                "participant id '{}' is not a DID",
                self.participant_id
            )));
        }
        if !(self.callback_address.starts_with("https://")
            || self.callback_address.starts_with("http://"))
        {
            return Err(ConnectorError::Config(format!(
                "callback address '{}' is not an http(s) URL",
                self.callback_address
            )));
        }
        if self.negotiation.participant_id != self.participant_id {
            return Err(ConnectorError::Config(
                "negotiation participant id differs from connector participant id".to_string(),
            ));
        }
        if self.negotiation.callback_address != self.callback_address
            || self.transfer.callback_address != self.callback_address
        {
            return Err(ConnectorError::Config(
                "engine callback address differs from connector callback address".to_string(),
            ));
        }
        if self.negotiation.max_offer_rounds == 0 {
            return Err(ConnectorError::Config("max_offer_rounds must be at least 1".to_string()));
        }
        if self.negotiation.process_timeout_secs == 0 || self.transfer.process_timeout_secs == 0 {
            return Err(ConnectorError::Config("process timeout must be positive".to_string()));
        }
        if self.token_ttl_secs == 0 {
            return Err(ConnectorError::Config("token ttl must be positive".to_string()));
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("[dsp-connector] ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let raw = env::var(key).ok()?;
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!("[dsp-connector] ignoring {}={:?}: expected a boolean", key, raw);
            None
        }
    }
}
