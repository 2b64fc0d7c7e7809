//! Thin, protocol-agnostic transaction builder.
//!
//! Wraps a [`bitcoin::Transaction`] with just enough surface for pin
//! composition: add inputs and outputs, append a data output, serialize,
//! compute the id. Malformed addresses or ids are programmer errors and
//! surface immediately; there is no retry logic here.

use std::str::FromStr;

use bitcoin::absolute::LockTime;
use bitcoin::address::NetworkUnchecked;
use bitcoin::consensus::encode::{deserialize, serialize_hex};
use bitcoin::transaction::Version;
use bitcoin::{
    Address, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};

use crate::{Network, PinkitError, Result};

/// Parse and network-check an address string.
pub(crate) fn parse_address(address: &str, network: Network) -> Result<Address> {
    let unchecked: Address<NetworkUnchecked> = address
        .parse()
        .map_err(|e| PinkitError::invalid_input("address", format!("{address}: {e}")))?;
    unchecked
        .require_network(network.into())
        .map_err(|e| PinkitError::invalid_input("address", format!("{address}: {e}")))
}

/// Builder for one unsigned transaction.
#[derive(Clone, Debug)]
pub struct TransactionBuilder {
    network: Network,
    tx: Transaction,
}

impl TransactionBuilder {
    /// Start an empty transaction for the given network.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            tx: Transaction {
                version: Version::TWO,
                lock_time: LockTime::ZERO,
                input: Vec::new(),
                output: Vec::new(),
            },
        }
    }

    /// Spend the referenced output. The owner address is validated here;
    /// its script only comes into play at signing time.
    pub fn add_input(&mut self, txid: &str, vout: u32, owner_address: &str) -> Result<&mut Self> {
        let txid = Txid::from_str(txid)
            .map_err(|e| PinkitError::invalid_input("txid", format!("{txid}: {e}")))?;
        parse_address(owner_address, self.network)?;
        self.tx.input.push(TxIn {
            previous_output: OutPoint::new(txid, vout),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        });
        Ok(self)
    }

    /// Append a pay-to-address output.
    pub fn add_output(&mut self, address: &str, value: u64) -> Result<&mut Self> {
        let address = parse_address(address, self.network)?;
        self.tx.output.push(TxOut {
            value: Amount::from_sat(value),
            script_pubkey: address.script_pubkey(),
        });
        Ok(self)
    }

    /// Append a zero-value data-carrying output with the given script.
    pub fn add_data_output(&mut self, script_bytes: Vec<u8>) -> &mut Self {
        self.tx.output.push(TxOut {
            value: Amount::from_sat(0),
            script_pubkey: ScriptBuf::from_bytes(script_bytes),
        });
        self
    }

    /// Network this transaction is built for.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Outputs appended so far, in order.
    pub fn outputs(&self) -> &[TxOut] {
        &self.tx.output
    }

    /// Inputs appended so far, in order.
    pub fn inputs(&self) -> &[TxIn] {
        &self.tx.input
    }

    /// Consensus-serialized transaction, hex-encoded.
    pub fn raw_hex(&self) -> String {
        serialize_hex(&self.tx)
    }

    /// Transaction id computed from the current bytes.
    pub fn txid(&self) -> String {
        self.tx.compute_txid().to_string()
    }

    /// Take the underlying transaction out of the builder.
    pub fn into_transaction(self) -> Transaction {
        self.tx
    }
}

/// One composed-but-unfunded (or unfunded-and-unsigned) transaction,
/// owned by the orchestrator that created it until a pay/broadcast step
/// consumes it.
#[derive(Clone, Debug)]
pub struct PendingTransaction {
    /// The wrapped builder.
    pub builder: TransactionBuilder,
    /// Human-readable label, shown by signers that prompt the holder.
    pub label: String,
}

impl PendingTransaction {
    /// Wrap a builder with a label.
    pub fn new(builder: TransactionBuilder, label: impl Into<String>) -> Self {
        Self {
            builder,
            label: label.into(),
        }
    }

    /// Current serialized bytes, hex-encoded.
    pub fn raw_hex(&self) -> String {
        self.builder.raw_hex()
    }
}

/// A fully funded and signed transaction ready for broadcast.
#[derive(Clone, Debug)]
pub struct SignedTransaction {
    tx: Transaction,
}

impl SignedTransaction {
    /// Parse from consensus-serialized hex.
    pub fn from_hex(raw_hex: &str) -> Result<Self> {
        let bytes = hex::decode(raw_hex)
            .map_err(|e| PinkitError::invalid_input("transaction", format!("invalid hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Parse from consensus-serialized bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let tx: Transaction = deserialize(bytes).map_err(|e| {
            PinkitError::invalid_input("transaction", format!("invalid transaction bytes: {e}"))
        })?;
        Ok(Self { tx })
    }

    /// Transaction id computed locally from the signed bytes.
    pub fn txid(&self) -> String {
        self.tx.compute_txid().to_string()
    }

    /// Consensus-serialized bytes, hex-encoded.
    pub fn raw_hex(&self) -> String {
        serialize_hex(&self.tx)
    }

    /// Borrow the underlying transaction.
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }
}

impl From<Transaction> for SignedTransaction {
    fn from(tx: Transaction) -> Self {
        Self { tx }
    }
}

/// A single spendable output, threaded between orchestration steps.
///
/// Deliberately not `Clone`: a funding output is consumed exactly once,
/// by value, when it is composed into a transaction. The next funding
/// output in a chain is derived from the committed result, never reused.
#[derive(Debug, PartialEq, Eq)]
pub struct FundingUtxo {
    /// Id of the transaction holding the output.
    pub txid: String,
    /// Output index within that transaction.
    pub vout: u32,
    /// Output value in satoshis.
    pub value: u64,
    /// Address the output pays to.
    pub address: String,
}

impl FundingUtxo {
    /// Construct a funding output reference.
    pub fn new(txid: impl Into<String>, vout: u32, value: u64, address: impl Into<String>) -> Self {
        Self {
            txid: txid.into(),
            vout,
            value,
            address: address.into(),
        }
    }
}
