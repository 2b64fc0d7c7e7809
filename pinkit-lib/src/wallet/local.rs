//! In-process key signer.

use std::sync::Mutex;

use async_trait::async_trait;
use bitcoin::hashes::Hash as _;
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{All, Message, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{Address, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use std::str::FromStr;

use crate::builder::{FundingUtxo, PendingTransaction, SignedTransaction};
use crate::wallet::{PrevOutput, Signer};
use crate::{Network, PinkitError, Result};

/// Outputs below this value are absorbed into the fee instead of being
/// returned as change.
const DUST_SATS: u64 = 546;

/// Serialized size of a signed pay-to-pubkey-hash input, give or take a
/// DER byte.
const P2PKH_INPUT_BYTES: usize = 148;

/// Serialized size of a pay-to-pubkey-hash output.
const P2PKH_OUTPUT_BYTES: usize = 34;

const DEFAULT_FEE_RATE: f64 = 1.0;

/// A signer holding a secp256k1 key in-process.
///
/// Funds batches from a pool of spendable outputs it is told about,
/// chaining each transaction's change into the next one so a whole
/// accumulated batch settles from a single starting balance.
pub struct LocalKeySigner {
    secp: Secp256k1<All>,
    secret: SecretKey,
    public_key: bitcoin::PublicKey,
    network: Network,
    script_pubkey: ScriptBuf,
    pool: Mutex<Vec<FundingUtxo>>,
}

impl LocalKeySigner {
    /// Build a signer from raw secret key bytes.
    pub fn new(secret_bytes: [u8; 32], network: Network) -> Result<Self> {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&secret_bytes)
            .map_err(|e| PinkitError::invalid_input("secret_key", e.to_string()))?;
        let public_key =
            bitcoin::PublicKey::new(bitcoin::secp256k1::PublicKey::from_secret_key(&secp, &secret));
        let script_pubkey = Address::p2pkh(&public_key, bitcoin::Network::from(network)).script_pubkey();
        Ok(Self {
            secp,
            secret,
            public_key,
            network,
            script_pubkey,
            pool: Mutex::new(Vec::new()),
        })
    }

    /// Register a spendable output owned by this key.
    pub fn add_spendable_output(&self, utxo: FundingUtxo) {
        self.pool.lock().unwrap().push(utxo);
    }

    /// Number of outputs currently in the funding pool.
    pub fn pool_len(&self) -> usize {
        self.pool.lock().unwrap().len()
    }

    fn p2pkh_address(&self) -> Address {
        Address::p2pkh(&self.public_key, bitcoin::Network::from(self.network))
    }

    fn sign_input(&self, tx: &Transaction, index: usize, spent_script: &ScriptBuf) -> Result<ScriptBuf> {
        let sighash = SighashCache::new(tx)
            .legacy_signature_hash(index, spent_script, EcdsaSighashType::All.to_u32())
            .map_err(|e| PinkitError::invalid_input("input_index", e.to_string()))?;
        let message = Message::from_digest(sighash.to_byte_array());
        let signature = self.secp.sign_ecdsa(&message, &self.secret);
        let mut sig_bytes = signature.serialize_der().to_vec();
        sig_bytes.push(EcdsaSighashType::All.to_u32() as u8);
        let sig_push = PushBytesBuf::try_from(sig_bytes)
            .map_err(|_| PinkitError::invalid_input("signature", "signature too large to push"))?;
        Ok(Builder::new()
            .push_slice(sig_push)
            .push_key(&self.public_key)
            .into_script())
    }

    fn fee_for(&self, tx: &Transaction, extra_inputs: usize, fee_rate: f64) -> u64 {
        let size = tx.total_size() + extra_inputs * P2PKH_INPUT_BYTES + P2PKH_OUTPUT_BYTES;
        (size as f64 * fee_rate).ceil() as u64
    }
}

#[async_trait]
impl Signer for LocalKeySigner {
    fn address(&self) -> String {
        self.p2pkh_address().to_string()
    }

    async fn sign_owned_inputs(
        &self,
        raw_tx_hex: &str,
        prev_outputs: &[PrevOutput],
        input_indexes: &[usize],
    ) -> Result<String> {
        let mut tx = SignedTransaction::from_hex(raw_tx_hex)?.transaction().clone();
        if prev_outputs.len() != tx.input.len() {
            return Err(PinkitError::invalid_input(
                "prev_outputs",
                format!(
                    "{} previous outputs for {} inputs",
                    prev_outputs.len(),
                    tx.input.len()
                ),
            ));
        }

        // Legacy sighashes ignore existing script_sigs, but compute them
        // all against the untouched transaction before mutating it.
        let mut script_sigs = Vec::with_capacity(input_indexes.len());
        for &index in input_indexes {
            let prev = prev_outputs.get(index).ok_or_else(|| {
                PinkitError::invalid_input("input_index", format!("no input at index {index}"))
            })?;
            let spent_script = ScriptBuf::from_bytes(prev.script_pubkey.clone());
            script_sigs.push((index, self.sign_input(&tx, index, &spent_script)?));
        }
        for (index, script_sig) in script_sigs {
            tx.input[index].script_sig = script_sig;
        }

        Ok(SignedTransaction::from(tx).raw_hex())
    }

    async fn pay_and_fund(
        &self,
        transactions: Vec<PendingTransaction>,
        fee_rate: Option<f64>,
    ) -> Result<Vec<SignedTransaction>> {
        let fee_rate = fee_rate.unwrap_or(DEFAULT_FEE_RATE);
        let change_address = self.p2pkh_address();
        let mut pool = self.pool.lock().unwrap();
        let mut signed = Vec::with_capacity(transactions.len());

        for pending in transactions {
            let mut tx = pending.builder.into_transaction();
            let target: u64 = tx.output.iter().map(|o| o.value.to_sat()).sum();

            let mut selected: Vec<FundingUtxo> = Vec::new();
            let mut in_value: u64 = 0;
            let mut fee = self.fee_for(&tx, 1, fee_rate);
            while in_value < target + fee {
                if pool.is_empty() {
                    return Err(PinkitError::invalid_input(
                        "funding",
                        format!(
                            "insufficient spendable balance: have {in_value} sats, need {} for '{}'",
                            target + fee,
                            pending.label
                        ),
                    ));
                }
                let utxo = pool.remove(0);
                in_value += utxo.value;
                selected.push(utxo);
                fee = self.fee_for(&tx, selected.len(), fee_rate);
            }

            for utxo in &selected {
                let txid = bitcoin::Txid::from_str(&utxo.txid)
                    .map_err(|e| PinkitError::invalid_input("txid", e.to_string()))?;
                tx.input.push(TxIn {
                    previous_output: OutPoint::new(txid, utxo.vout),
                    script_sig: ScriptBuf::new(),
                    sequence: Sequence::MAX,
                    witness: Witness::default(),
                });
            }

            let change = in_value - target - fee;
            let change_vout = if change >= DUST_SATS {
                tx.output.push(TxOut {
                    value: Amount::from_sat(change),
                    script_pubkey: change_address.script_pubkey(),
                });
                Some((tx.output.len() - 1) as u32)
            } else {
                None
            };

            let mut script_sigs = Vec::with_capacity(tx.input.len());
            for index in 0..tx.input.len() {
                script_sigs.push(self.sign_input(&tx, index, &self.script_pubkey)?);
            }
            for (index, script_sig) in script_sigs.into_iter().enumerate() {
                tx.input[index].script_sig = script_sig;
            }

            let signed_tx = SignedTransaction::from(tx);
            if let Some(vout) = change_vout {
                pool.push(FundingUtxo::new(
                    signed_tx.txid(),
                    vout,
                    change,
                    change_address.to_string(),
                ));
            }
            signed.push(signed_tx);
        }

        Ok(signed)
    }
}
