//! Wallet signing capabilities.
//!
//! Signing is a capability selected at construction: [`LocalKeySigner`]
//! holds a key in-process, [`RemoteSigner`] delegates to a wallet bridge
//! over HTTP. Orchestrators only ever see the [`Signer`] trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::builder::{PendingTransaction, SignedTransaction};
use crate::Result;

mod local;
mod remote;

pub use local::LocalKeySigner;
pub use remote::{RemoteSigner, RemoteSignerConfig};

/// Resolved previous output for one transaction input, in input order.
///
/// Signers need the spent script and value to compute sighashes; callers
/// resolve them from the ledger before delegating.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrevOutput {
    /// Script of the spent output.
    pub script_pubkey: Vec<u8>,
    /// Value of the spent output in satoshis.
    pub value: u64,
}

/// Signing and fee-payment capability.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Address whose inputs this signer can unlock.
    fn address(&self) -> String;

    /// Sign the wallet-owned inputs of a serialized transaction.
    ///
    /// `prev_outputs` carries the resolved previous output for every
    /// input, index-for-index; only the inputs named in `input_indexes`
    /// are signed. Returns the updated transaction hex.
    async fn sign_owned_inputs(
        &self,
        raw_tx_hex: &str,
        prev_outputs: &[PrevOutput],
        input_indexes: &[usize],
    ) -> Result<String>;

    /// Fund, fee-adjust and sign a batch of accumulated transactions as
    /// one logically atomic operation, in order.
    async fn pay_and_fund(
        &self,
        transactions: Vec<PendingTransaction>,
        fee_rate: Option<f64>,
    ) -> Result<Vec<SignedTransaction>>;
}
