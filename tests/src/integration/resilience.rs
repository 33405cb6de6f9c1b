//! # Resilience
//!
//! Duplicate delivery, concurrent requests, unreachable counterparties,
//! stale-process expiry and replayed tokens across two connectors.

#[cfg(test)]
mod tests {
    use crate::harness::{counterparty_pid, negotiation_in, offer, Dataspace};
    use dsp_02_message_codec::{
        decode, encode_message, ContractRequestMessage, NegotiationMessage, ProtocolMessage,
    };
    use dsp_03_contract_negotiation::{ContractNegotiationApi, NegotiationError};
    use dsp_connector::Endpoint;
    use shared_types::{Extensions, NegotiationState, Role};
    use std::collections::HashSet;

    fn initial_request(consumer_pid: &str, callback: &str, offer: shared_types::Policy) -> Vec<u8> {
        encode_message(&ProtocolMessage::Negotiation(NegotiationMessage::Request(
            ContractRequestMessage {
                consumer_pid: consumer_pid.to_string(),
                provider_pid: None,
                offer,
                callback_address: Some(callback.to_string()),
                extensions: Extensions::new(),
            },
        )))
        .unwrap()
    }

    // =============================================================================
    // IDEMPOTENT REDELIVERY
    // =============================================================================

    #[tokio::test]
    async fn test_redelivered_messages_are_no_ops() {
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
        let provider_pid = counterparty_pid(&started.correlation_id);
        let before = provider.negotiations().get(provider_pid).await.unwrap();

        // Request again while REQUESTED.
        let delivered = dataspace.wire.delivered();
        consumer.negotiations().redeliver(started.id).await.unwrap();
        assert_eq!(dataspace.wire.delivered(), delivered + 1);
        let after = provider.negotiations().get(provider_pid).await.unwrap();
        assert_eq!(after.state, NegotiationState::Requested);
        assert_eq!(after.version, before.version);
        assert_eq!(after.offer_rounds, before.offer_rounds);

        // ACCEPTED event again while ACCEPTED.
        provider
            .negotiations()
            .offer(provider_pid, offer(&provider, "urn:dataset:weather"))
            .await
            .unwrap();
        negotiation_in(&consumer, started.id, NegotiationState::Offered).await;
        consumer.negotiations().accept(started.id).await.unwrap();
        let accepted = negotiation_in(&provider, provider_pid, NegotiationState::Accepted).await;

        consumer.negotiations().redeliver(started.id).await.unwrap();
        let after = provider.negotiations().get(provider_pid).await.unwrap();
        assert_eq!(after.state, NegotiationState::Accepted);
        assert_eq!(after.version, accepted.version);
    }

    #[tokio::test]
    async fn test_nothing_to_redeliver_for_received_state() {
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
        let provider_pid = counterparty_pid(&started.correlation_id);

        // The provider never sent anything that led into REQUESTED.
        let delivered = dataspace.wire.delivered();
        let unchanged = provider.negotiations().redeliver(provider_pid).await.unwrap();
        assert_eq!(unchanged.state, NegotiationState::Requested);
        assert_eq!(dataspace.wire.delivered(), delivered);
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_requests_create_one_process() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join("provider");
        let body = initial_request(
            "urn:uuid:3b8e2d4f-6c1a-4f0e-9d7b-5a2c8e1f4b60",
            &consumer.address,
            offer(&provider, "urn:dataset:weather"),
        );

        let mut handles = Vec::new();
        for _ in 0..8 {
            let connector = provider.connector.clone();
            let token = consumer.bearer_for(&provider.id);
            let body = body.clone();
            handles.push(tokio::spawn(async move {
                connector
                    .handle(&Endpoint::NegotiationRequest, Some(&token), &body)
                    .await
            }));
        }

        let mut created = 0;
        let mut provider_pids = HashSet::new();
        for handle in handles {
            let response = handle.await.unwrap();
            match response.status {
                201 => created += 1,
                200 => {}
                other => panic!("unexpected status {other}"),
            }
            match decode(&response.body).unwrap().message {
                ProtocolMessage::NegotiationAck(ack) => {
                    assert_eq!(ack.state, NegotiationState::Requested);
                    provider_pids.insert(ack.provider_pid);
                }
                other => panic!("unexpected {}", other.type_name()),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(provider_pids.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_redelivery_keeps_state() {
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
        let provider_pid = counterparty_pid(&started.correlation_id);
        provider
            .negotiations()
            .offer(provider_pid, offer(&provider, "urn:dataset:weather"))
            .await
            .unwrap();
        let offered = negotiation_in(&consumer, started.id, NegotiationState::Offered).await;

        let mut handles = Vec::new();
        for _ in 0..6 {
            let connector = provider.connector.clone();
            handles.push(tokio::spawn(async move {
                connector.negotiations().redeliver(provider_pid).await
            }));
        }
        for handle in handles {
            let process = handle.await.unwrap().unwrap();
            assert_eq!(process.state, NegotiationState::Offered);
        }

        let after = consumer.negotiations().get(started.id).await.unwrap();
        assert_eq!(after.state, NegotiationState::Offered);
        assert_eq!(after.version, offered.version);
    }

    // =============================================================================
    // DELIVERY FAILURE
    // =============================================================================

    #[tokio::test]
    async fn test_unreachable_consumer_then_redeliver() {
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
        let provider_pid = counterparty_pid(&started.correlation_id);

        dataspace.wire.set_offline(&consumer.address, true);
        let err = provider.negotiations().finalize(provider_pid).await.unwrap_err();
        assert!(matches!(err, NegotiationError::Delivery { .. }));

        // The local transition stands; the consumer never heard of it.
        let agreed = provider.negotiations().get(provider_pid).await.unwrap();
        assert_eq!(agreed.state, NegotiationState::Agreed);
        assert_eq!(
            consumer.negotiations().get(started.id).await.unwrap().state,
            NegotiationState::Requested
        );

        dataspace.wire.set_offline(&consumer.address, false);
        provider.negotiations().redeliver(provider_pid).await.unwrap();

        let consumer_side = negotiation_in(&consumer, started.id, NegotiationState::Finalized).await;
        negotiation_in(&provider, provider_pid, NegotiationState::Finalized).await;
        assert_eq!(
            consumer_side.agreement.map(|a| a.id),
            agreed.agreement.map(|a| a.id)
        );
    }

    #[tokio::test]
    async fn test_unreachable_provider_fails_initiate() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join("provider");
        dataspace.wire.set_offline(&provider.address, true);

        let err = consumer
            .negotiations()
            .initiate(
                Role::Consumer,
                offer(&provider, "urn:dataset:weather"),
                &provider.id,
                &provider.address,
            )
            .await
            .unwrap_err();
        let process_id = match err {
            NegotiationError::Delivery { process_id, .. } => process_id,
            other => panic!("expected a delivery failure, got {other}"),
        };

        // The record exists unbound and can be retried.
        let pending = consumer.negotiations().get(process_id).await.unwrap();
        assert_eq!(pending.state, NegotiationState::Requested);
        assert!(pending.correlation_id.is_none());

        dataspace.wire.set_offline(&provider.address, false);
        let bound = consumer.negotiations().redeliver(process_id).await.unwrap();
        assert!(bound.correlation_id.is_some());
    }

    // =============================================================================
    // EXPIRY
    // =============================================================================

    #[tokio::test]
    async fn test_stale_negotiation_expires_on_both_sides() {
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
        let provider_pid = counterparty_pid(&started.correlation_id);

        assert!(consumer.connector.expire_stale().await.unwrap().is_empty());

        dataspace.time.advance(3_601);
        let expired = consumer.connector.expire_stale().await.unwrap();
        assert_eq!(expired, vec![started.id]);

        let at_provider =
            negotiation_in(&provider, provider_pid, NegotiationState::Terminated).await;
        assert_eq!(
            at_provider.error_detail.and_then(|d| d.reason).as_deref(),
            Some("negotiation timed out")
        );

        // Already terminated: nothing left for the provider's sweep.
        assert!(provider.connector.expire_stale().await.unwrap().is_empty());
    }

    // =============================================================================
    // TOKENS AND METRICS
    // =============================================================================

    #[tokio::test]
    async fn test_replayed_token_is_rejected() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join("provider");
        let body = initial_request(
            "urn:uuid:9e4d7c2a-1b3f-4e5a-8c6d-0f2a4b6c8e19",
            &consumer.address,
            offer(&provider, "urn:dataset:weather"),
        );
        let token = consumer.bearer_for(&provider.id);

        let first = provider
            .connector
            .handle(&Endpoint::NegotiationRequest, Some(&token), &body)
            .await;
        assert_eq!(first.status, 201);

        let replay = provider
            .connector
            .handle(&Endpoint::NegotiationRequest, Some(&token), &body)
            .await;
        assert_eq!(replay.status, 401);
        match decode(&replay.body).unwrap().message {
            ProtocolMessage::NegotiationError(e) => assert_eq!(e.code.as_deref(), Some("replay")),
            other => panic!("unexpected {}", other.type_name()),
        }
    }

    #[tokio::test]
    async fn test_transitions_are_counted() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join("provider");
        crate::harness::finalized_agreement(&consumer, &provider, "urn:dataset:metrics").await;

        let text = dsp_telemetry::gather_metrics().unwrap();
        assert!(text.contains("dsp_negotiation_transitions_total"));
        assert!(text.contains("FINALIZED"));
    }
}
