//! # Offer Catalog
//!
//! In-memory [`OfferEvaluator`] holding the offers a provider publishes per
//! target. An incoming offer is acceptable when it matches one of the
//! offers published for its target:
//!
//! - `permission`, `prohibition` and `obligation` are equal, where an absent
//!   member, `null` and an empty array are the same and a single rule equals
//!   a one-element array
//! - an `assigner`, when present on both, is the same party
//! - an `assignee` on the published offer restricts it to that partner
//! - an `assignee` on the incoming offer names the caller
//!
//! `@id`, `timestamp` and extension members are not compared.

use crate::domain::NegotiationError;
use crate::ports::OfferEvaluator;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::Policy;
use std::collections::HashMap;
use tracing::debug;

/// Offers published by this participant, keyed by target.
#[derive(Default)]
pub struct OfferCatalog {
    offers: RwLock<HashMap<String, Vec<Policy>>>,
}

impl OfferCatalog {
    /// Empty catalog; every offer is rejected until something is published.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an offer under its target. An offer with the same `@id`
    /// replaces the earlier one.
    pub fn publish(&self, offer: Policy) -> Result<(), NegotiationError> {
        offer.validate_offer()?;
        let target = offer.target.clone().unwrap_or_default();
        debug!("[dsp-03] publishing {} for {}", offer.id, target);

        let mut offers = self.offers.write();
        let published = offers.entry(target).or_default();
        published.retain(|p| p.id != offer.id);
        published.push(offer);
        Ok(())
    }

    /// Remove every offer for `target`. Returns how many were removed.
    pub fn withdraw(&self, target: &str) -> usize {
        self.offers
            .write()
            .remove(target)
            .map_or(0, |removed| removed.len())
    }

    /// Offers currently published for `target`.
    pub fn offers_for(&self, target: &str) -> Vec<Policy> {
        self.offers.read().get(target).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl OfferEvaluator for OfferCatalog {
    async fn evaluate(&self, offer: &Policy, counterparty_id: &str) -> Result<(), String> {
        let target = offer
            .target
            .as_deref()
            .ok_or_else(|| "offer names no target".to_string())?;
        let offers = self.offers.read();
        let published = offers
            .get(target)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| format!("no offer is published for {target}"))?;

        if published
            .iter()
            .any(|p| terms_match(p, offer, counterparty_id))
        {
            Ok(())
        } else {
            Err(format!(
                "offer {} does not match the terms published for {target}",
                offer.id
            ))
        }
    }
}

fn terms_match(published: &Policy, offer: &Policy, counterparty_id: &str) -> bool {
    if published
        .assignee
        .as_deref()
        .is_some_and(|partner| partner != counterparty_id)
    {
        return false;
    }
    if offer
        .assignee
        .as_deref()
        .is_some_and(|assignee| assignee != counterparty_id)
    {
        return false;
    }
    if let (Some(expected), Some(actual)) = (&published.assigner, &offer.assigner) {
        if expected != actual {
            return false;
        }
    }
    rules(&published.permission) == rules(&offer.permission)
        && rules(&published.prohibition) == rules(&offer.prohibition)
        && rules(&published.obligation) == rules(&offer.obligation)
}

/// Rule list in a comparable form.
fn rules(member: &Option<Value>) -> Vec<Value> {
    match member {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(single) => vec![single.clone()],
    }
}
