//! Shared harness for connector integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use pinkit_connector::{Collaborators, PinSession, RetryPolicy, SessionConfig};
use pinkit_lib::test_utils::{
    test_address, MockAssist, MockBroadcaster, MockIndexer, MockLedger, MockNotifier, MockSigner,
};
use pinkit_lib::{AssistService, ContentEncoding, Network, ProtocolRecord};

pub const NETWORK: Network = Network::Testnet;

pub fn address() -> String {
    test_address(NETWORK)
}

pub fn info_record(field: &str, value: &str) -> ProtocolRecord {
    ProtocolRecord::create(
        format!("/info/{field}"),
        value,
        ContentEncoding::Utf8,
        "text/plain",
    )
    .unwrap()
}

pub struct Harness {
    pub ledger: Arc<MockLedger>,
    pub signer: Arc<MockSigner>,
    pub broadcaster: Arc<MockBroadcaster>,
    pub indexer: Arc<MockIndexer>,
    pub assist: Option<Arc<MockAssist>>,
    pub notifier: Arc<MockNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        let ledger = MockLedger::new();
        Self {
            signer: MockSigner::new(address()),
            broadcaster: MockBroadcaster::new(),
            indexer: MockIndexer::new(ledger.clone()),
            assist: None,
            notifier: MockNotifier::new(),
            ledger,
        }
    }

    pub fn with_assist(mut self) -> Self {
        self.assist = Some(MockAssist::new(self.ledger.clone()));
        self
    }

    pub fn with_broadcaster(mut self, broadcaster: Arc<MockBroadcaster>) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<MockNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_failing_commit_at(mut self, index: usize) -> Self {
        self.assist = Some(MockAssist::failing_commit_at(self.ledger.clone(), index));
        self
    }

    pub async fn connect(&self) -> PinSession {
        let config = SessionConfig {
            network: NETWORK,
            funding_retry: RetryPolicy::immediate(),
            ..SessionConfig::default()
        };
        PinSession::connect(
            config,
            Collaborators {
                signer: Some(self.signer.clone()),
                broadcaster: self.broadcaster.clone(),
                indexer: self.indexer.clone(),
                assist: self
                    .assist
                    .clone()
                    .map(|a| a as Arc<dyn AssistService>),
                notifier: Some(self.notifier.clone()),
            },
        )
        .await
        .unwrap()
    }
}
