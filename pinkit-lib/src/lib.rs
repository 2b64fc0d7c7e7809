//! Pinkit core library.
//!
//! This crate intentionally stays stateless and delegates every network
//! and key operation to callers through trait-based dependency
//! injection.
//!
//! # Features
//!
//! - **Protocol records**: validated pin records and the bit-exact
//!   data-output script layout ledger indexers parse
//! - **Transaction composition**: accumulation-mode and assisted-mode
//!   pin transactions over a thin UTXO transaction builder
//! - **Capability traits**: signer, broadcaster, indexer, assist
//!   service and notifier seams, with HTTP executors behind the
//!   `http-executor` feature
//!
//! # Example
//!
//! ```ignore
//! use pinkit_lib::{compose_pin, ContentEncoding, DataLimits, Network, ProtocolRecord};
//!
//! let record = ProtocolRecord::create("/info/name", "alice", ContentEncoding::Utf8, "text/plain")?;
//! let pending = compose_pin(&record, Network::Testnet, "mi...", None, &[], &DataLimits::default())?;
//! assert!(pending.builder.inputs().is_empty()); // funded at pay time
//! ```

use serde::{Deserialize, Serialize};

pub mod builder;
pub mod codec;
pub mod composer;
pub mod errors;
pub mod executors;
pub mod record;
pub mod services;
pub mod wallet;

/// Mock collaborators for integration testing.
///
/// This module is only available with the `test-utils` feature or in
/// test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use builder::{FundingUtxo, PendingTransaction, SignedTransaction, TransactionBuilder};
pub use codec::{DataLimits, DEFAULT_MAX_PAYLOAD_BYTES};
pub use composer::{
    compose_assisted_pin, compose_pin, OutputRequest, ASSISTED_CHANGE_VOUT, PIN_OUTPUT_SATS,
};
pub use errors::{PinkitError, Result};
pub use record::{ContentEncoding, Operation, ProtocolRecord, PROTOCOL_FLAG};
pub use services::{AssistService, Broadcaster, IdentityRecord, Indexer, Notifier, PreCommitGrant};
pub use wallet::{LocalKeySigner, PrevOutput, RemoteSigner, RemoteSignerConfig, Signer};

/// Ledger network selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network.
    Mainnet,
    /// Public test network.
    #[default]
    Testnet,
    /// Local development network.
    Regtest,
}

impl Network {
    /// Network name as used by the remote APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Regtest => "regtest",
        }
    }
}

impl From<Network> for bitcoin::Network {
    fn from(network: Network) -> Self {
        match network {
            Network::Mainnet => bitcoin::Network::Bitcoin,
            Network::Testnet => bitcoin::Network::Testnet,
            Network::Regtest => bitcoin::Network::Regtest,
        }
    }
}
