//! Integration tests for the user-info synchronizer.

mod common;

use common::{address, Harness, NETWORK};
use pinkit_connector::{CreatePinResult, FieldOutcome, UpdateOptions, UserInfoUpdate};
use pinkit_lib::test_utils::funding_transaction;
use pinkit_lib::{IdentityRecord, PinkitError};

fn settled_txid(outcome: &FieldOutcome) -> String {
    match outcome {
        FieldOutcome::Completed(CreatePinResult::Settled { txid, .. }) => txid.clone(),
        other => panic!("expected a settled field, got {other:?}"),
    }
}

#[tokio::test]
async fn unchanged_fields_are_skipped() {
    let harness = Harness::new();
    harness.indexer.set_identity(IdentityRecord {
        address: address(),
        name: Some("A".into()),
        name_id: Some("id-name".into()),
        ..IdentityRecord::default()
    });
    let session = harness.connect().await;

    let result = session
        .update_user_info(
            UserInfoUpdate {
                name: Some("A".into()),
                bio: Some("B".into()),
                ..UserInfoUpdate::default()
            },
            UpdateOptions::default(),
        )
        .await
        .unwrap();

    assert!(result.name.is_none());
    assert!(result.bio.is_some());
    assert!(result.avatar.is_none());
    assert!(result.background.is_none());
}

#[tokio::test]
async fn batched_update_assigns_ids_in_field_order() {
    let harness = Harness::new();
    let session = harness.connect().await;

    let result = session
        .update_user_info(
            UserInfoUpdate {
                name: Some("alice".into()),
                bio: Some("hello".into()),
                ..UserInfoUpdate::default()
            },
            UpdateOptions::default(),
        )
        .await
        .unwrap();

    let sent = harness.broadcaster.sent_txids();
    assert_eq!(sent.len(), 2);
    assert_eq!(settled_txid(result.name.as_ref().unwrap()), sent[0]);
    assert_eq!(settled_txid(result.bio.as_ref().unwrap()), sent[1]);
    // One atomic pay step for the whole batch.
    assert_eq!(harness.signer.pay_calls(), 1);
}

#[tokio::test]
async fn nothing_to_do_yields_an_empty_result() {
    let harness = Harness::new();
    let session = harness.connect().await;

    let result = session
        .update_user_info(UserInfoUpdate::default(), UpdateOptions::default())
        .await
        .unwrap();
    assert!(result.name.is_none());
    assert!(result.bio.is_none());
    assert!(result.avatar.is_none());
    assert!(result.background.is_none());
    assert_eq!(harness.signer.pay_calls(), 0);
}

#[tokio::test]
async fn assisted_update_chains_one_transaction_per_field() {
    let harness = Harness::new().with_assist();
    let session = harness.connect().await;

    let (funding_tx, funding) = funding_transaction(&address(), 1000, NETWORK);
    harness.ledger.insert(&funding_tx);
    harness
        .indexer
        .add_spendable(&address(), &funding.txid, funding.vout, funding.value);

    let result = session
        .update_user_info(
            UserInfoUpdate {
                name: Some("alice".into()),
                bio: Some("hello".into()),
                ..UserInfoUpdate::default()
            },
            UpdateOptions::default(),
        )
        .await
        .unwrap();

    let name_txid = settled_txid(result.name.as_ref().unwrap());
    let bio_txid = settled_txid(result.bio.as_ref().unwrap());
    assert_ne!(name_txid, bio_txid);

    let assist = harness.assist.as_ref().unwrap();
    assert_eq!(assist.commit_calls(), 2);
    // The chain needed exactly one spendable-output lookup; the second
    // field spent the derived change output.
    assert_eq!(harness.indexer.find_calls(), 1);
    // The batch path was never involved.
    assert_eq!(harness.signer.pay_calls(), 0);
    assert_eq!(harness.broadcaster.broadcast_count(), 0);
}

#[tokio::test]
async fn assisted_failure_keeps_partial_progress() {
    let harness = Harness::new().with_failing_commit_at(1);
    let session = harness.connect().await;

    let (funding_tx, funding) = funding_transaction(&address(), 1000, NETWORK);
    harness.ledger.insert(&funding_tx);
    harness
        .indexer
        .add_spendable(&address(), &funding.txid, funding.vout, funding.value);

    let result = session
        .update_user_info(
            UserInfoUpdate {
                name: Some("alice".into()),
                bio: Some("hello".into()),
                avatar: Some("YXZhdGFy".into()),
                ..UserInfoUpdate::default()
            },
            UpdateOptions::default(),
        )
        .await
        .unwrap();

    // Field one settled, field two failed, field three was never tried.
    assert!(result.name.as_ref().unwrap().is_completed());
    match result.bio.as_ref().unwrap() {
        FieldOutcome::Failed(PinkitError::AssistService { message }) => {
            assert!(message.contains("simulated"));
        }
        other => panic!("expected the assist failure, got {other:?}"),
    }
    assert!(result.avatar.is_none());
}

#[tokio::test]
async fn create_user_info_requires_a_name() {
    let harness = Harness::new();
    let session = harness.connect().await;

    let err = session
        .create_user_info(UserInfoUpdate::default(), UpdateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PinkitError::InvalidInput { .. }));

    let err = session
        .create_user_info(
            UserInfoUpdate {
                bio: Some("hello".into()),
                ..UserInfoUpdate::default()
            },
            UpdateOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PinkitError::InvalidInput { .. }));
}

#[tokio::test]
async fn create_user_info_publishes_creations_for_every_field() {
    let harness = Harness::new();
    let session = harness.connect().await;

    let result = session
        .create_user_info(
            UserInfoUpdate {
                name: Some("alice".into()),
                bio: Some("hello".into()),
                ..UserInfoUpdate::default()
            },
            UpdateOptions::default(),
        )
        .await
        .unwrap();

    assert!(result.name.as_ref().unwrap().is_completed());
    assert!(result.bio.as_ref().unwrap().is_completed());
    assert_eq!(harness.broadcaster.broadcast_count(), 2);
}
