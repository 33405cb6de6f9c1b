//! # Negotiation Flows
//!
//! Consumer and provider connectors negotiating over the loopback wire.
//!
//! ## Flow Tested
//!
//! ```text
//! consumer                         provider
//!   initiate ── Request ──────────>  REQUESTED
//!   OFFERED  <───────────── Offer ── offer
//!   accept ──── ACCEPTED event ───>  ACCEPTED
//!   AGREED   <───────── Agreement ── finalize (agree)
//!   (auto) ──── Verification ─────>  VERIFIED
//!   FINALIZED <── FINALIZED event ── (auto)
//! ```

#[cfg(test)]
mod tests {
    use crate::harness::{counterparty_pid, negotiation_in, offer, Dataspace};
    use dsp_02_message_codec::{
        decode, encode_message, ContractRequestMessage, DeliveryError, NegotiationMessage,
        ProtocolMessage,
    };
    use dsp_03_contract_negotiation::{ContractNegotiationApi, NegotiationError};
    use dsp_connector::Endpoint;
    use shared_types::{Extensions, NegotiationState, Policy, PolicyKind, Role};

    // =============================================================================
    // HAPPY PATH
    // =============================================================================

    #[tokio::test]
    async fn test_offer_accept_agree_reaches_finalized() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join("provider");

        let started = consumer
            .negotiations()
            .initiate(
                Role::Consumer,
                offer(&provider, "urn:dataset:weather"),
                &provider.id,
                &provider.address,
            )
            .await
            .unwrap();
        assert_eq!(started.state, NegotiationState::Requested);
        let provider_pid = counterparty_pid(&started.correlation_id);

        let at_provider = provider.negotiations().get(provider_pid).await.unwrap();
        assert_eq!(at_provider.state, NegotiationState::Requested);
        assert_eq!(at_provider.counterparty_id, consumer.id);
        assert_eq!(at_provider.correlation_id.as_deref(), Some(started.id.to_string().as_str()));

        let mut counter = offer(&provider, "urn:dataset:weather");
        counter.id = "urn:offer:weather-v2".to_string();
        provider
            .negotiations()
            .offer(provider_pid, counter)
            .await
            .unwrap();
        let offered = negotiation_in(&consumer, started.id, NegotiationState::Offered).await;
        assert_eq!(offered.offer.id, "urn:offer:weather-v2");

        consumer.negotiations().accept(started.id).await.unwrap();
        negotiation_in(&provider, provider_pid, NegotiationState::Accepted).await;

        provider.negotiations().finalize(provider_pid).await.unwrap();

        let consumer_side = negotiation_in(&consumer, started.id, NegotiationState::Finalized).await;
        let provider_side =
            negotiation_in(&provider, provider_pid, NegotiationState::Finalized).await;

        let agreement = consumer_side.agreement.expect("agreement stored");
        assert_eq!(agreement.kind, PolicyKind::Agreement);
        assert_eq!(agreement.assigner.as_deref(), Some(provider.id.as_str()));
        assert_eq!(agreement.assignee.as_deref(), Some(consumer.id.as_str()));
        assert_eq!(agreement.target.as_deref(), Some("urn:dataset:weather"));
        assert!(agreement.timestamp.is_some());
        assert_eq!(provider_side.agreement.map(|a| a.id), Some(agreement.id));
    }

    #[tokio::test]
    async fn test_auto_agree_provider_needs_no_operator() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join_with(
            "provider",
            |config| config.automation.auto_agree_requests = true,
            None,
        );

        let started = consumer
            .negotiations()
            .initiate(
                Role::Consumer,
                offer(&provider, "urn:dataset:traffic"),
                &provider.id,
                &provider.address,
            )
            .await
            .unwrap();

        let finalized = negotiation_in(&consumer, started.id, NegotiationState::Finalized).await;
        assert!(finalized.agreement.is_some());
    }

    // =============================================================================
    // OFFER EVALUATION
    // =============================================================================

    #[tokio::test]
    async fn test_provider_refuses_terms_it_never_published() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join("provider");
        offer(&provider, "urn:dataset:weather");

        let mut invented = Policy::offer("urn:offer:invented", "urn:dataset:not-in-any-catalog");
        invented.permission = Some(serde_json::json!([{ "action": "distribute" }]));
        let mut widened = offer(&provider, "urn:dataset:weather");
        widened.permission = Some(serde_json::json!([{ "action": "distribute" }]));

        for terms in [invented, widened] {
            let err = consumer
                .negotiations()
                .initiate(Role::Consumer, terms, &provider.id, &provider.address)
                .await
                .unwrap_err();
            let process_id = match err {
                NegotiationError::Delivery {
                    process_id,
                    source: DeliveryError::Rejected { status, code, .. },
                } => {
                    assert_eq!(status, 400);
                    assert_eq!(code.as_deref(), Some("invalid_offer"));
                    process_id
                }
                other => panic!("expected a rejection, got {other}"),
            };
            // The provider never answered with its pid, so nothing could be agreed.
            let pending = consumer.negotiations().get(process_id).await.unwrap();
            assert_eq!(pending.state, NegotiationState::Requested);
            assert!(pending.correlation_id.is_none());
            assert!(pending.agreement.is_none());
        }
    }

    #[tokio::test]
    async fn test_counter_request_outside_catalog_is_refused() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join("provider");

        let started = consumer
            .negotiations()
            .initiate(
                Role::Consumer,
                offer(&provider, "urn:dataset:energy"),
                &provider.id,
                &provider.address,
            )
            .await
            .unwrap();
        let provider_pid = counterparty_pid(&started.correlation_id);
        provider
            .negotiations()
            .offer(provider_pid, offer(&provider, "urn:dataset:energy"))
            .await
            .unwrap();
        negotiation_in(&consumer, started.id, NegotiationState::Offered).await;
        let before = provider.negotiations().get(provider_pid).await.unwrap();

        let mut widened = offer(&provider, "urn:dataset:energy");
        widened.permission = Some(serde_json::json!([{ "action": "resell" }]));
        let err = consumer
            .negotiations()
            .counter_request(started.id, widened)
            .await
            .unwrap_err();
        assert!(matches!(err, NegotiationError::Delivery { .. }));

        let after = provider.negotiations().get(provider_pid).await.unwrap();
        assert_eq!(after.state, NegotiationState::Offered);
        assert_eq!(after.version, before.version);
        assert_eq!(after.offer.permission, None);
    }

    // =============================================================================
    // TERMINATION
    // =============================================================================

    #[tokio::test]
    async fn test_offer_rounds_are_bounded() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join_with(
            "provider",
            |config| config.negotiation.max_offer_rounds = 2,
            None,
        );

        let started = consumer
            .negotiations()
            .initiate(
                Role::Consumer,
                offer(&provider, "urn:dataset:energy"),
                &provider.id,
                &provider.address,
            )
            .await
            .unwrap();
        let provider_pid = counterparty_pid(&started.correlation_id);

        // Round 1: provider offers.
        provider
            .negotiations()
            .offer(provider_pid, offer(&provider, "urn:dataset:energy"))
            .await
            .unwrap();
        negotiation_in(&consumer, started.id, NegotiationState::Offered).await;

        // Round 2: consumer counters.
        consumer
            .negotiations()
            .counter_request(started.id, offer(&provider, "urn:dataset:energy"))
            .await
            .unwrap();
        negotiation_in(&provider, provider_pid, NegotiationState::Requested).await;

        // Round 3 exceeds the bound: the provider terminates instead.
        let ended = provider
            .negotiations()
            .offer(provider_pid, offer(&provider, "urn:dataset:energy"))
            .await
            .unwrap();
        assert_eq!(ended.state, NegotiationState::Terminated);

        let consumer_side =
            negotiation_in(&consumer, started.id, NegotiationState::Terminated).await;
        let detail = consumer_side.error_detail.expect("termination detail");
        assert_eq!(detail.reason.as_deref(), Some("negotiation exhausted"));
    }

    #[tokio::test]
    async fn test_consumer_decline_terminates_both_sides() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join("provider");

        let started = consumer
            .negotiations()
            .initiate(
                Role::Consumer,
                offer(&provider, "urn:dataset:maps"),
                &provider.id,
                &provider.address,
            )
            .await
            .unwrap();
        let provider_pid = counterparty_pid(&started.correlation_id);

        consumer
            .negotiations()
            .decline(started.id, Some("price too high".to_string()))
            .await
            .unwrap();

        let at_provider =
            negotiation_in(&provider, provider_pid, NegotiationState::Terminated).await;
        assert_eq!(
            at_provider.error_detail.and_then(|d| d.reason).as_deref(),
            Some("price too high")
        );
    }

    // =============================================================================
    // AUTHENTICATION
    // =============================================================================

    #[tokio::test]
    async fn test_wrong_audience_creates_no_record() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join("provider");
        let bystander = dataspace.join("bystander");

        let body = encode_message(&ProtocolMessage::Negotiation(NegotiationMessage::Request(
            ContractRequestMessage {
                consumer_pid: "urn:uuid:5f0c0a4e-0b7e-4c1b-9a57-2f5d1c3e8a10".to_string(),
                provider_pid: None,
                offer: offer(&provider, "urn:dataset:weather"),
                callback_address: Some(consumer.address.clone()),
                extensions: Extensions::new(),
            },
        )))
        .unwrap();

        // Token minted for another participant.
        let misdirected = consumer.bearer_for(&bystander.id);
        let rejected = provider
            .connector
            .handle(&Endpoint::NegotiationRequest, Some(&misdirected), &body)
            .await;
        assert_eq!(rejected.status, 401);
        match decode(&rejected.body).unwrap().message {
            ProtocolMessage::NegotiationError(e) => {
                assert_eq!(e.code.as_deref(), Some("audience"));
                assert_eq!(e.consumer_pid, None);
            }
            other => panic!("unexpected {}", other.type_name()),
        }

        // The same request, correctly addressed, is a creation rather than a duplicate.
        let addressed = consumer.bearer_for(&provider.id);
        let created = provider
            .connector
            .handle(&Endpoint::NegotiationRequest, Some(&addressed), &body)
            .await;
        assert_eq!(created.status, 201);
    }

    #[tokio::test]
    async fn test_third_party_cannot_drive_foreign_negotiation() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join("provider");
        let intruder = dataspace.join("intruder");

        let started = consumer
            .negotiations()
            .initiate(
                Role::Consumer,
                offer(&provider, "urn:dataset:weather"),
                &provider.id,
                &provider.address,
            )
            .await
            .unwrap();
        let provider_pid = counterparty_pid(&started.correlation_id);

        let termination = ProtocolMessage::Negotiation(NegotiationMessage::Termination(
            dsp_02_message_codec::ContractNegotiationTerminationMessage {
                consumer_pid: started.id.to_string(),
                provider_pid: provider_pid.to_string(),
                code: None,
                reason: None,
                extensions: Extensions::new(),
            },
        ));
        let response = provider
            .connector
            .handle(
                &Endpoint::NegotiationTermination(provider_pid.to_string()),
                Some(&intruder.bearer_for(&provider.id)),
                &encode_message(&termination).unwrap(),
            )
            .await;
        assert_eq!(response.status, 403);

        let untouched = provider.negotiations().get(provider_pid).await.unwrap();
        assert_eq!(untouched.state, NegotiationState::Requested);
    }
}
