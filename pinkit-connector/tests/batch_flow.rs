//! Integration tests for the combo/finish batch orchestrator.

mod common;

use common::{address, info_record, Harness, NETWORK};
use pinkit_connector::{CreatePinOptions, CreatePinResult, SerialAction};
use pinkit_lib::test_utils::{MockBroadcaster, MockNotifier};
use pinkit_lib::{compose_pin, DataLimits, PinkitError};

#[tokio::test]
async fn combo_accumulates_without_paying() {
    let harness = Harness::new();
    let session = harness.connect().await;

    let result = session
        .create_pin(
            &info_record("name", "alice"),
            CreatePinOptions {
                serial_action: SerialAction::Combo,
                ..CreatePinOptions::default()
            },
        )
        .await
        .unwrap();
    let CreatePinResult::Accumulating { transactions } = result else {
        panic!("combo must keep accumulating");
    };
    assert_eq!(transactions.len(), 1);

    let result = session
        .create_pin(
            &info_record("bio", "hello"),
            CreatePinOptions {
                serial_action: SerialAction::Combo,
                transactions,
                ..CreatePinOptions::default()
            },
        )
        .await
        .unwrap();
    let CreatePinResult::Accumulating { transactions } = result else {
        panic!("combo must keep accumulating");
    };
    assert_eq!(transactions.len(), 2);

    assert_eq!(harness.signer.pay_calls(), 0);
    assert_eq!(harness.broadcaster.broadcast_count(), 0);
}

#[tokio::test]
async fn finish_settles_the_batch_in_accumulation_order() {
    let harness = Harness::new();
    let session = harness.connect().await;

    let records = [
        info_record("name", "alice"),
        info_record("bio", "hello"),
        info_record("avatar", "stub"),
    ];

    let mut transactions = Vec::new();
    for record in &records[..2] {
        match session
            .create_pin(
                record,
                CreatePinOptions {
                    serial_action: SerialAction::Combo,
                    transactions: std::mem::take(&mut transactions),
                    ..CreatePinOptions::default()
                },
            )
            .await
            .unwrap()
        {
            CreatePinResult::Accumulating { transactions: acc } => transactions = acc,
            other => panic!("unexpected settlement: {other:?}"),
        }
    }

    let result = session
        .create_pin(
            &records[2],
            CreatePinOptions {
                serial_action: SerialAction::Finish,
                transactions,
                ..CreatePinOptions::default()
            },
        )
        .await
        .unwrap();

    let CreatePinResult::Settled { txid, txids } = result else {
        panic!("finish must settle");
    };
    assert_eq!(txids.len(), 3);
    assert_eq!(txid, txids[2]);

    // Pass-through funding keeps composed ids stable, so the settled ids
    // must match an independent composition of the same records.
    let expected: Vec<String> = records
        .iter()
        .map(|record| {
            compose_pin(
                record,
                NETWORK,
                &address(),
                None,
                &[],
                &DataLimits::default(),
            )
            .unwrap()
            .builder
            .txid()
        })
        .collect();
    assert_eq!(txids, expected);

    assert_eq!(harness.signer.pay_calls(), 1);
    assert_eq!(harness.broadcaster.broadcast_count(), 3);
    assert_eq!(harness.broadcaster.sent_txids(), txids);
    assert_eq!(harness.notifier.notified().len(), 3);
}

#[tokio::test]
async fn broadcast_mismatch_aborts_remaining_broadcasts() {
    let harness = Harness::new().with_broadcaster(MockBroadcaster::tampering_at(1));
    let session = harness.connect().await;

    let mut transactions = Vec::new();
    for record in [info_record("name", "alice"), info_record("bio", "hello")] {
        match session
            .create_pin(
                &record,
                CreatePinOptions {
                    serial_action: SerialAction::Combo,
                    transactions: std::mem::take(&mut transactions),
                    ..CreatePinOptions::default()
                },
            )
            .await
            .unwrap()
        {
            CreatePinResult::Accumulating { transactions: acc } => transactions = acc,
            other => panic!("unexpected settlement: {other:?}"),
        }
    }

    let err = session
        .create_pin(
            &info_record("avatar", "stub"),
            CreatePinOptions {
                serial_action: SerialAction::Finish,
                transactions,
                ..CreatePinOptions::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PinkitError::BroadcastMismatch { .. }));
    // First broadcast verified fine, the tampered second one aborted the
    // third before it went out.
    assert_eq!(harness.broadcaster.broadcast_count(), 2);
    assert_eq!(harness.notifier.notified().len(), 1);
}

#[tokio::test]
async fn notifier_outage_does_not_fail_settlement() {
    let harness = Harness::new().with_notifier(MockNotifier::failing());
    let session = harness.connect().await;

    let result = session
        .create_pin(&info_record("name", "alice"), CreatePinOptions::default())
        .await
        .unwrap();
    assert!(result.is_settled());
    assert!(harness.notifier.notified().is_empty());
}

#[tokio::test]
async fn disconnected_session_rejects_writes() {
    let harness = Harness::new();
    let session = harness.connect().await;
    session.disconnect();

    let err = session
        .create_pin(&info_record("name", "alice"), CreatePinOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PinkitError::NotConnected));
}
