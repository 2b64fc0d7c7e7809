//! Integration tests for the assisted-funding orchestrator.

mod common;

use common::{address, info_record, Harness, NETWORK};
use pinkit_connector::AssistedPinOptions;
use pinkit_lib::test_utils::funding_transaction;
use pinkit_lib::{
    compose_assisted_pin, DataLimits, FundingUtxo, PinkitError, ASSISTED_CHANGE_VOUT,
};

#[tokio::test]
async fn derives_the_next_funding_output_and_chains() {
    let harness = Harness::new().with_assist();
    let session = harness.connect().await;

    let (funding_tx, funding) = funding_transaction(&address(), 1000, NETWORK);
    harness.ledger.insert(&funding_tx);

    let first = session
        .create_pin_assisted(
            &info_record("name", "alice"),
            AssistedPinOptions {
                funding: Some(funding),
            },
        )
        .await
        .unwrap();

    // Pass-through pre-commit and signing keep the composed id stable.
    let expected = compose_assisted_pin(
        &info_record("name", "alice"),
        NETWORK,
        FundingUtxo::new(funding_tx.txid(), 0, 1000, address()),
        None,
        &DataLimits::default(),
    )
    .unwrap()
    .builder
    .txid();
    assert_eq!(first.txid, expected);
    assert_eq!(
        first.next_funding,
        FundingUtxo::new(first.txid.clone(), ASSISTED_CHANGE_VOUT, 1000, address())
    );

    // The derived output funds the next record without any lookup.
    let second = session
        .create_pin_assisted(
            &info_record("bio", "hello"),
            AssistedPinOptions {
                funding: Some(first.next_funding),
            },
        )
        .await
        .unwrap();
    assert_eq!(
        second.next_funding,
        FundingUtxo::new(second.txid.clone(), ASSISTED_CHANGE_VOUT, 1000, address())
    );

    let assist = harness.assist.as_ref().unwrap();
    assert_eq!(assist.pre_calls(), 2);
    assert_eq!(assist.commit_calls(), 2);
    // Only the indexer's raw-transaction lookups ran; no spendable-output
    // queries were needed.
    assert_eq!(harness.indexer.find_calls(), 0);
}

#[tokio::test]
async fn resolves_funding_from_the_indexer_first() {
    let harness = Harness::new().with_assist();
    let session = harness.connect().await;

    let (funding_tx, funding) = funding_transaction(&address(), 1000, NETWORK);
    harness.ledger.insert(&funding_tx);
    harness
        .indexer
        .add_spendable(&address(), &funding.txid, funding.vout, funding.value);

    let result = session
        .create_pin_assisted(&info_record("name", "alice"), AssistedPinOptions::default())
        .await
        .unwrap();
    assert_eq!(result.next_funding.vout, ASSISTED_CHANGE_VOUT);
    assert_eq!(harness.indexer.find_calls(), 1);
}

#[tokio::test]
async fn falls_back_to_an_assist_grant() {
    let harness = Harness::new().with_assist();
    let session = harness.connect().await;

    let (funding_tx, funding) = funding_transaction(&address(), 1000, NETWORK);
    harness.ledger.insert(&funding_tx);
    let assist = harness.assist.as_ref().unwrap();
    assist.set_grant(&funding.txid, funding.vout, funding.value, &address());

    let result = session
        .create_pin_assisted(&info_record("name", "alice"), AssistedPinOptions::default())
        .await
        .unwrap();
    assert_eq!(result.next_funding.value, 1000);
}

#[tokio::test]
async fn pending_grant_rereads_the_indexer_once() {
    let harness = Harness::new().with_assist();
    let session = harness.connect().await;

    let (funding_tx, funding) = funding_transaction(&address(), 1000, NETWORK);
    harness.ledger.insert(&funding_tx);
    // The grant has not landed at the first lookup; the re-read after
    // the (zero-length) pause finds it.
    harness
        .indexer
        .add_spendable(&address(), &funding.txid, funding.vout, funding.value);
    harness.indexer.set_find_misses(1);

    let result = session
        .create_pin_assisted(&info_record("name", "alice"), AssistedPinOptions::default())
        .await
        .unwrap();
    assert_eq!(result.next_funding.value, 1000);
    assert_eq!(harness.indexer.find_calls(), 2);
}

#[tokio::test]
async fn reports_when_no_funding_materializes() {
    let harness = Harness::new().with_assist();
    let session = harness.connect().await;

    let err = session
        .create_pin_assisted(&info_record("name", "alice"), AssistedPinOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PinkitError::NoFundingAvailable { .. }));
    // Initial lookup plus the single bounded re-read.
    assert_eq!(harness.indexer.find_calls(), 2);
}

#[tokio::test]
async fn requires_an_assist_service() {
    let harness = Harness::new();
    let session = harness.connect().await;

    let err = session
        .create_pin_assisted(&info_record("name", "alice"), AssistedPinOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PinkitError::InvalidInput { .. }));
}
