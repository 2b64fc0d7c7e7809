//! Mock collaborators for integration testing.
//!
//! This module is only available with the `test-utils` feature or in
//! test builds. The mocks share a [`MockLedger`] so that transactions
//! committed through the assist service become fetchable from the
//! indexer, the way a real ledger behaves.

mod fixtures;
mod mocks;

pub use fixtures::{funding_transaction, test_address, test_secret};
pub use mocks::{
    MockAssist, MockBroadcaster, MockIndexer, MockLedger, MockNotifier, MockSigner,
};
