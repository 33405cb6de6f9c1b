//! # ODRL Policies
//!
//! Offers and agreements exchanged during negotiation. Rule arrays are kept as
//! raw JSON; the engine only inspects identifiers, parties and target.

use crate::entities::Extensions;
use crate::errors::PolicyError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// ODRL policy type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyKind {
    /// Terms proposed during negotiation.
    Offer,
    /// Terms both parties agreed on.
    Agreement,
    /// Catalog-level policy set.
    Set,
}

impl PolicyKind {
    /// Compact JSON-LD type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Offer => "Offer",
            PolicyKind::Agreement => "Agreement",
            PolicyKind::Set => "Set",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A policy document as carried in `offer` and `agreement` members.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Policy identifier.
    #[serde(rename = "@id")]
    pub id: String,
    /// Policy type.
    #[serde(rename = "@type")]
    pub kind: PolicyKind,
    /// Identifier of the governed resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Party granting the rights.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigner: Option<String>,
    /// Party receiving the rights.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// Permission rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<Value>,
    /// Prohibition rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prohibition: Option<Value>,
    /// Obligation rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obligation: Option<Value>,
    /// Signing time of an agreement (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Unknown members.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Policy {
    /// Minimal offer for a target.
    pub fn offer(id: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: PolicyKind::Offer,
            target: Some(target.into()),
            assigner: None,
            assignee: None,
            permission: None,
            prohibition: None,
            obligation: None,
            timestamp: None,
            extensions: Extensions::new(),
        }
    }

    /// Check the members an offer must carry.
    pub fn validate_offer(&self) -> Result<(), PolicyError> {
        self.expect_kind(PolicyKind::Offer)?;
        if self.id.trim().is_empty() {
            return Err(PolicyError::MissingField("@id"));
        }
        require(&self.target, "target")?;
        Ok(())
    }

    /// Check the members an agreement must carry.
    pub fn validate_agreement(&self) -> Result<(), PolicyError> {
        self.expect_kind(PolicyKind::Agreement)?;
        if self.id.trim().is_empty() {
            return Err(PolicyError::MissingField("@id"));
        }
        require(&self.target, "target")?;
        require(&self.assigner, "assigner")?;
        require(&self.assignee, "assignee")?;
        require(&self.timestamp, "timestamp")?;
        Ok(())
    }

    /// Derive an agreement from this offer.
    ///
    /// Rules and extensions are carried over; identity members are replaced.
    pub fn to_agreement(
        &self,
        agreement_id: impl Into<String>,
        assigner: impl Into<String>,
        assignee: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Policy {
        Policy {
            id: agreement_id.into(),
            kind: PolicyKind::Agreement,
            target: self.target.clone(),
            assigner: Some(assigner.into()),
            assignee: Some(assignee.into()),
            permission: self.permission.clone(),
            prohibition: self.prohibition.clone(),
            obligation: self.obligation.clone(),
            timestamp: Some(timestamp.into()),
            extensions: self.extensions.clone(),
        }
    }

    fn expect_kind(&self, expected: PolicyKind) -> Result<(), PolicyError> {
        if self.kind != expected {
            return Err(PolicyError::WrongKind {
                expected: expected.as_str(),
                actual: self.kind.to_string(),
            });
        }
        Ok(())
    }
}

fn require(value: &Option<String>, field: &'static str) -> Result<(), PolicyError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(PolicyError::MissingField(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_offer() -> Policy {
        let mut offer = Policy::offer("urn:uuid:offer-1", "urn:uuid:dataset-1");
        offer.permission = Some(json!([{ "action": "use" }]));
        offer
    }

    #[test]
    fn test_valid_offer() {
        assert!(sample_offer().validate_offer().is_ok());
    }

    #[test]
    fn test_offer_without_target_rejected() {
        let mut offer = sample_offer();
        offer.target = None;
        assert_eq!(
            offer.validate_offer(),
            Err(PolicyError::MissingField("target"))
        );
    }

    #[test]
    fn test_offer_with_blank_id_rejected() {
        let mut offer = sample_offer();
        offer.id = "  ".into();
        assert_eq!(offer.validate_offer(), Err(PolicyError::MissingField("@id")));
    }

    #[test]
    fn test_agreement_is_not_an_offer() {
        let agreement = sample_offer().to_agreement("a-1", "did:web:p", "did:web:c", "2025-01-01T00:00:00Z");
        assert!(matches!(
            agreement.validate_offer(),
            Err(PolicyError::WrongKind { .. })
        ));
        assert!(agreement.validate_agreement().is_ok());
    }

    #[test]
    fn test_agreement_copies_rules_and_target() {
        let offer = sample_offer();
        let agreement = offer.to_agreement("a-1", "did:web:p", "did:web:c", "2025-01-01T00:00:00Z");
        assert_eq!(agreement.target, offer.target);
        assert_eq!(agreement.permission, offer.permission);
        assert_eq!(agreement.assignee.as_deref(), Some("did:web:c"));
    }

    #[test]
    fn test_policy_json_shape() {
        let json = json!({
            "@id": "urn:uuid:offer-1",
            "@type": "Offer",
            "target": "urn:uuid:dataset-1",
            "permission": [{ "action": "use" }],
            "x:note": { "nested": true }
        });
        let policy: Policy = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(policy.kind, PolicyKind::Offer);
        assert!(policy.extensions.contains_key("x:note"));
        assert_eq!(serde_json::to_value(&policy).unwrap(), json);
    }
}
