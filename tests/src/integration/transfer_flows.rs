//! # Transfer Flows
//!
//! Transfers running under agreements negotiated in the same dataspace.
//!
//! ## Flow Tested
//!
//! ```text
//! consumer                              provider
//!   initiate ── TransferRequest ──────>  REQUESTED
//!   STARTED  <────── TransferStart ────  (auto start, data address)
//!   suspend ─── TransferSuspension ───>  SUSPENDED
//!   resume ──── TransferStart ────────>  STARTED
//!   complete ── TransferCompletion ───>  COMPLETED
//! ```

#[cfg(test)]
mod tests {
    use crate::harness::{
        counterparty_pid, finalized_agreement, negotiation_in, offer, transfer_in, Dataspace,
        Participant, StaticDataAddresses,
    };
    use dsp_02_message_codec::{
        decode, encode_message, ProtocolMessage, TransferMessage, TransferRequestMessage,
    };
    use dsp_03_contract_negotiation::ContractNegotiationApi;
    use dsp_04_transfer_process::{TransferError, TransferProcessApi};
    use dsp_connector::Endpoint;
    use shared_types::{Extensions, NegotiationState, Role, TransferState};
    use std::sync::Arc;

    fn auto_starting_provider(dataspace: &Dataspace) -> Participant {
        dataspace.join_with(
            "provider",
            |config| config.automation.auto_start_transfers = true,
            Some(Arc::new(StaticDataAddresses {
                endpoint: "https://data.provider.example/pull".to_string(),
            })),
        )
    }

    // =============================================================================
    // HAPPY PATH
    // =============================================================================

    #[tokio::test]
    async fn test_request_start_complete() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = auto_starting_provider(&dataspace);
        let (negotiated, _) = finalized_agreement(&consumer, &provider, "urn:dataset:weather").await;
        let agreement_id = negotiated.agreement.expect("agreement").id;

        let requested = consumer
            .transfers()
            .initiate(&agreement_id, Role::Consumer, &provider.id, &provider.address)
            .await
            .unwrap();
        assert_eq!(requested.state, TransferState::Requested);
        let provider_pid = counterparty_pid(&requested.correlation_id);

        let started = transfer_in(&consumer, requested.id, TransferState::Started).await;
        let address = started.data_address.expect("data address delivered");
        assert_eq!(
            address.endpoint,
            Some(format!("https://data.provider.example/pull/{agreement_id}"))
        );
        transfer_in(&provider, provider_pid, TransferState::Started).await;

        consumer.transfers().complete(requested.id).await.unwrap();
        let done = transfer_in(&provider, provider_pid, TransferState::Completed).await;
        assert_eq!(done.agreement_id, agreement_id);
        assert_eq!(
            consumer.transfers().get(requested.id).await.unwrap().state,
            TransferState::Completed
        );
    }

    #[tokio::test]
    async fn test_suspend_and_resume() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = auto_starting_provider(&dataspace);
        let (negotiated, _) = finalized_agreement(&consumer, &provider, "urn:dataset:video").await;
        let agreement_id = negotiated.agreement.expect("agreement").id;

        let requested = consumer
            .transfers()
            .initiate(&agreement_id, Role::Consumer, &provider.id, &provider.address)
            .await
            .unwrap();
        let provider_pid = counterparty_pid(&requested.correlation_id);
        transfer_in(&consumer, requested.id, TransferState::Started).await;

        provider
            .transfers()
            .suspend(provider_pid, Some("maintenance window".to_string()))
            .await
            .unwrap();
        let suspended = transfer_in(&consumer, requested.id, TransferState::Suspended).await;
        assert_eq!(
            suspended.error_detail.and_then(|d| d.reason).as_deref(),
            Some("maintenance window")
        );

        let resumed = consumer.transfers().resume(requested.id).await.unwrap();
        assert!(resumed.error_detail.is_none());
        let at_provider = transfer_in(&provider, provider_pid, TransferState::Started).await;
        assert!(at_provider.error_detail.is_none());

        provider.transfers().terminate(provider_pid, None).await.unwrap();
        transfer_in(&consumer, requested.id, TransferState::Terminated).await;
    }

    #[tokio::test]
    async fn test_manual_start_without_automation() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join("provider");
        let (negotiated, _) = finalized_agreement(&consumer, &provider, "urn:dataset:logs").await;
        let agreement_id = negotiated.agreement.expect("agreement").id;

        let requested = consumer
            .transfers()
            .initiate(&agreement_id, Role::Consumer, &provider.id, &provider.address)
            .await
            .unwrap();
        let provider_pid = counterparty_pid(&requested.correlation_id);
        assert_eq!(
            provider.transfers().get(provider_pid).await.unwrap().state,
            TransferState::Requested
        );

        provider.transfers().start(provider_pid, None).await.unwrap();
        let started = transfer_in(&consumer, requested.id, TransferState::Started).await;
        assert!(started.data_address.is_none());
    }

    // =============================================================================
    // AGREEMENT GATE
    // =============================================================================

    #[tokio::test]
    async fn test_transfer_blocked_until_finalized() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join_with(
            "consumer",
            |config| config.automation.auto_verify_agreements = false,
            None,
        );
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
        provider.negotiations().finalize(provider_pid).await.unwrap();
        let agreed = negotiation_in(&consumer, started.id, NegotiationState::Agreed).await;
        let agreement_id = agreed.agreement.expect("agreement").id;

        let err = consumer
            .transfers()
            .initiate(&agreement_id, Role::Consumer, &provider.id, &provider.address)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransferError::AgreementNotFinalized {
                state: Some(NegotiationState::Agreed),
                ..
            }
        ));

        // The provider refuses on its own records too.
        let request = ProtocolMessage::Transfer(TransferMessage::Request(TransferRequestMessage {
            consumer_pid: "urn:uuid:0d9f6f0e-6a5b-4a47-8f3e-2b1c9d7e5a31".to_string(),
            agreement_id: agreement_id.clone(),
            format: "HttpData-PULL".to_string(),
            callback_address: consumer.address.clone(),
            data_address: None,
            extensions: Extensions::new(),
        }));
        let response = provider
            .connector
            .handle(
                &Endpoint::TransferRequest,
                Some(&consumer.bearer_for(&provider.id)),
                &encode_message(&request).unwrap(),
            )
            .await;
        assert_eq!(response.status, 400);
        match decode(&response.body).unwrap().message {
            ProtocolMessage::TransferError(e) => {
                assert_eq!(e.code.as_deref(), Some("agreement_not_finalized"));
                assert_eq!(
                    e.consumer_pid.as_deref(),
                    Some("urn:uuid:0d9f6f0e-6a5b-4a47-8f3e-2b1c9d7e5a31")
                );
            }
            other => panic!("unexpected {}", other.type_name()),
        }

        // Once verified and finalized the same agreement opens the gate.
        consumer.negotiations().verify(started.id).await.unwrap();
        negotiation_in(&consumer, started.id, NegotiationState::Finalized).await;
        let requested = consumer
            .transfers()
            .initiate(&agreement_id, Role::Consumer, &provider.id, &provider.address)
            .await
            .unwrap();
        assert_eq!(requested.state, TransferState::Requested);
    }

    #[tokio::test]
    async fn test_agreement_is_bound_to_its_consumer() {
        let dataspace = Dataspace::new();
        let consumer = dataspace.join("consumer");
        let provider = dataspace.join("provider");
        let other = dataspace.join("other");
        let (negotiated, _) = finalized_agreement(&consumer, &provider, "urn:dataset:weather").await;
        let agreement_id = negotiated.agreement.expect("agreement").id;

        let request = ProtocolMessage::Transfer(TransferMessage::Request(TransferRequestMessage {
            consumer_pid: "urn:uuid:7a3c1e55-2f4d-4b8a-9c61-0e5d8f2b4a77".to_string(),
            agreement_id,
            format: "HttpData-PULL".to_string(),
            callback_address: other.address.clone(),
            data_address: None,
            extensions: Extensions::new(),
        }));
        let response = provider
            .connector
            .handle(
                &Endpoint::TransferRequest,
                Some(&other.bearer_for(&provider.id)),
                &encode_message(&request).unwrap(),
            )
            .await;
        assert_eq!(response.status, 403);
    }
}
