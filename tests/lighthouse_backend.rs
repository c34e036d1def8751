mod support;

use std::{sync::Arc, time::Duration};

use beacon_client::{
    api::{ChainHeadProvider, HeadEventsProvider, NodeProvider, StateProvider, Submitter},
    types::{HeadEvent, Root, StateId, ValidatorStatus},
    Backend, BeaconClient, ClientError,
};
use httpmock::prelude::*;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use support::{attestation_json, config, pubkey, root, validator_json};

async fn connect(server: &MockServer) -> BeaconClient {
    BeaconClient::connect(&config(server, Backend::Lighthouse), CancellationToken::new())
        .await
        .unwrap()
}

async fn mock_head(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/beacon/head");
            then.status(200).body(format!(
                r#"{{"slot":70,"block_root":"{}","state_root":"{}","finalized_slot":32,"finalized_block_root":"{}","justified_slot":64,"justified_block_root":"{}"}}"#,
                root(0x70),
                root(0x71),
                root(0x20),
                root(0x40)
            ));
        })
        .await
}

#[test_log::test(tokio::test)]
async fn auto_detects_legacy_lighthouse() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/node/version");
            then.status(200).body(r#""Lighthouse/v0.3.0-95c96ac5/x86_64-linux""#);
        })
        .await;

    let client = BeaconClient::connect(&config(&server, Backend::Auto), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(client.backend(), Backend::Lighthouse);
}

#[test_log::test(tokio::test)]
async fn unknown_legacy_node_keeps_the_probe_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/node/version");
            then.status(200).body(r#""SomethingElse/v1""#);
        })
        .await;

    let err = BeaconClient::connect(&config(&server, Backend::Auto), CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err.root(),
        ClientError::BackendRejected { status: 404, .. }
    ));
}

#[test_log::test(tokio::test)]
async fn bare_integers_decode_into_the_chain_head() {
    let server = MockServer::start_async().await;
    mock_head(&server).await;

    let client = connect(&server).await;
    let head = client.chain_head().await.unwrap();
    assert_eq!(head.slot, 70);
    assert_eq!(head.block_root, Root::new([0x70; 32]));
    assert_eq!(head.finalized_slot, 32);
    assert_eq!(head.justified_block_root, Root::new([0x40; 32]));
}

#[test_log::test(tokio::test)]
async fn validators_at_head_resolve_the_head_once() {
    let server = MockServer::start_async().await;
    let head = mock_head(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/spec");
            then.status(200)
                .body(r#"{"slots_per_epoch":32,"far_future_epoch":18446744073709551615}"#);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/beacon/state_root")
                .query_param("slot", "70");
            then.status(200).json_body(json!(root(0x71)));
        })
        .await;
    let registry = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/beacon/validators/all")
                .query_param("state_root", root(0x71));
            then.status(200).json_body(json!([{
                "pubkey": pubkey(9),
                "validator_index": 5,
                "balance": 31000000000u64,
                "validator": validator_json(5, 9)["validator"].clone()
            }]));
        })
        .await;

    let client = connect(&server).await;
    let validators = client.validators(StateId::Head, &[]).await.unwrap();

    head.assert_hits_async(1).await;
    registry.assert_async().await;
    assert_eq!(validators.len(), 1);
    assert_eq!(validators[&5].balance, 31_000_000_000);
    assert_eq!(validators[&5].status, ValidatorStatus::ActiveOngoing);
}

#[test_log::test(tokio::test)]
async fn sync_distance_is_highest_minus_current() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/node/syncing");
            then.status(200).body(
                r#"{"is_syncing":true,"sync_status":{"starting_slot":0,"current_slot":100,"highest_slot":164}}"#,
            );
        })
        .await;

    let client = connect(&server).await;
    let state = client.sync_state().await.unwrap();
    assert_eq!(state.head_slot, 100);
    assert_eq!(state.sync_distance, 64);
    assert!(state.is_syncing);
}

#[test_log::test(tokio::test)]
async fn attestation_is_resubmitted_on_the_expected_subnet() {
    let server = MockServer::start_async().await;
    let default_subnet = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/validator/attestations")
                .body_contains(",0]]");
            then.status(400).json_body(json!({
                "code": 400,
                "message": "Invalid(InvalidSubnetId { received: SubnetId(0), expected: SubnetId(3) })"
            }));
        })
        .await;
    let expected_subnet = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/validator/attestations")
                .body_contains(",3]]");
            then.status(200);
        })
        .await;

    let client = connect(&server).await;
    let attestation = serde_json::from_value(attestation_json()).unwrap();
    client.submit_attestation(&attestation).await.unwrap();

    default_subnet.assert_hits_async(1).await;
    expected_subnet.assert_hits_async(1).await;
}

#[test_log::test(tokio::test)]
async fn unrelated_rejection_is_not_retried() {
    let server = MockServer::start_async().await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(POST).path("/validator/attestations");
            then.status(400)
                .json_body(json!({ "code": 400, "message": "unknown head block" }));
        })
        .await;

    let client = connect(&server).await;
    let attestation = serde_json::from_value(attestation_json()).unwrap();
    let err = client.submit_attestation(&attestation).await.unwrap_err();

    assert_eq!(err.rejection_message(), Some("unknown head block"));
    rejected.assert_hits_async(1).await;
}

#[test_log::test(tokio::test)]
async fn polled_head_reaches_handlers() {
    let server = MockServer::start_async().await;
    mock_head(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/spec");
            then.status(200)
                .body(r#"{"slots_per_epoch":32,"far_future_epoch":18446744073709551615}"#);
        })
        .await;

    let cancel = CancellationToken::new();
    let client = BeaconClient::connect(&config(&server, Backend::Lighthouse), cancel.clone())
        .await
        .unwrap();
    let (sender, mut receiver) = mpsc::unbounded_channel();
    client
        .on_head(Arc::new(move |event: HeadEvent| {
            let sender = sender.clone();
            async move {
                sender.send(event)?;
                Ok::<_, anyhow::Error>(())
            }
        }))
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.slot, 70);
    assert_eq!(event.state_root, Root::new([0x71; 32]));
    assert!(!event.epoch_transition);
    cancel.cancel();
}
