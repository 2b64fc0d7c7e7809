//! Collaborator capability traits.
//!
//! The core stays stateless and delegates every network and key
//! operation to callers through trait-based dependency injection:
//! broadcasting, indexer lookups, the fee-sponsoring assist service and
//! the best-effort notifier. Signing lives in [`crate::wallet`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::builder::{FundingUtxo, SignedTransaction};
use crate::Result;

/// Identity state known to the indexer for one address.
///
/// Field ids reference the on-chain records holding the current values;
/// their presence decides create-vs-modify when a field is rewritten.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityRecord {
    /// Identity digest (hex).
    pub metaid: Option<String>,
    /// Owner address.
    pub address: String,
    /// Display name.
    pub name: Option<String>,
    /// Record id holding the name.
    pub name_id: Option<String>,
    /// Biography text.
    pub bio: Option<String>,
    /// Record id holding the bio.
    pub bio_id: Option<String>,
    /// Avatar content reference.
    pub avatar: Option<String>,
    /// Record id holding the avatar.
    pub avatar_id: Option<String>,
    /// Background image reference.
    pub background: Option<String>,
    /// Record id holding the background.
    pub background_id: Option<String>,
}

/// Partially funded transaction returned by the assist pre-commit step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreCommitGrant {
    /// Transaction hex after the service added its fee-covering inputs.
    pub funded_tx_hex: String,
    /// Session identifier to present at commit time.
    pub order_id: String,
}

/// Broadcast access to the ledger.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Broadcast one signed transaction, returning the reported txid.
    async fn broadcast(&self, tx: &SignedTransaction) -> Result<String>;

    /// Broadcast several signed transactions in order, returning the
    /// reported txids in the same order.
    async fn batch_broadcast(&self, txs: &[SignedTransaction]) -> Result<Vec<String>> {
        let mut txids = Vec::with_capacity(txs.len());
        for tx in txs {
            txids.push(self.broadcast(tx).await?);
        }
        Ok(txids)
    }
}

/// Read access to ledger and identity state.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Find one spendable output at the address, if any.
    async fn find_spendable_output(&self, address: &str) -> Result<Option<FundingUtxo>>;

    /// Fetch the consensus-serialized bytes of a confirmed transaction.
    async fn fetch_raw_transaction(&self, txid: &str) -> Result<Vec<u8>>;

    /// Look up the identity published for an address, if any.
    async fn lookup_identity(&self, address: &str) -> Result<Option<IdentityRecord>>;
}

/// The fee-sponsoring assist service.
///
/// Any JSON error envelope from the service maps to
/// [`crate::PinkitError::AssistService`] carrying the reported message.
#[async_trait]
pub trait AssistService: Send + Sync {
    /// Ask the service to grant a fresh spendable output to the address.
    /// `None` means the grant is still pending.
    async fn init_grant(&self, address: &str) -> Result<Option<FundingUtxo>>;

    /// Submit an unsigned transaction for fee funding. The service may
    /// add its own inputs and returns the funded hex plus an order id.
    async fn pre_commit(&self, unsigned_tx_hex: &str, address: &str) -> Result<PreCommitGrant>;

    /// Submit the signed transaction for finalization and broadcast.
    /// Returns the canonical transaction id.
    async fn commit(&self, signed_tx_hex: &str, order_id: &str) -> Result<String>;
}

/// Best-effort post-broadcast notification sink. Failures are ignored
/// by orchestrators.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce a broadcast transaction by its raw hex.
    async fn notify(&self, raw_tx_hex: &str) -> Result<()>;
}
