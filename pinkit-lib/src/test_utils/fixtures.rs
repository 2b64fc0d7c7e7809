//! Deterministic fixtures shared by tests.

use bitcoin::absolute::LockTime;
use bitcoin::transaction::Version;
use bitcoin::{
    Address, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness,
};

use crate::builder::{FundingUtxo, SignedTransaction};
use crate::Network;

/// Fixed secret key bytes used by test wallets.
pub fn test_secret() -> [u8; 32] {
    [7u8; 32]
}

/// Address of the test wallet key on the given network.
pub fn test_address(network: Network) -> String {
    let secp = bitcoin::secp256k1::Secp256k1::new();
    let secret = bitcoin::secp256k1::SecretKey::from_slice(&test_secret())
        .expect("fixed test key is valid");
    let public_key =
        bitcoin::PublicKey::new(bitcoin::secp256k1::PublicKey::from_secret_key(&secp, &secret));
    Address::p2pkh(&public_key, bitcoin::Network::from(network)).to_string()
}

/// Build a coinbase-style transaction paying `value` to `address` and
/// return it together with the funding output reference to spend.
pub fn funding_transaction(
    address: &str,
    value: u64,
    network: Network,
) -> (SignedTransaction, FundingUtxo) {
    let script_pubkey = crate::builder::parse_address(address, network)
        .expect("fixture address is valid")
        .script_pubkey();
    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(value),
            script_pubkey,
        }],
    };
    let signed = SignedTransaction::from(tx);
    let utxo = FundingUtxo::new(signed.txid(), 0, value, address);
    (signed, utxo)
}
