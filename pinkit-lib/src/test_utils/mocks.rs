//! Scriptable mock implementations of the collaborator traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::builder::{FundingUtxo, PendingTransaction, SignedTransaction};
use crate::services::{AssistService, Broadcaster, IdentityRecord, Indexer, Notifier, PreCommitGrant};
use crate::wallet::{PrevOutput, Signer};
use crate::{PinkitError, Result};

/// Shared raw-transaction store standing in for the ledger.
#[derive(Default)]
pub struct MockLedger {
    txs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockLedger {
    /// Create an empty shared ledger.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record a transaction so indexer lookups can resolve it.
    pub fn insert(&self, tx: &SignedTransaction) {
        let bytes = hex::decode(tx.raw_hex()).expect("serialized hex is valid");
        self.txs.lock().unwrap().insert(tx.txid(), bytes);
    }

    /// Fetch recorded bytes by txid.
    pub fn get(&self, txid: &str) -> Option<Vec<u8>> {
        self.txs.lock().unwrap().get(txid).cloned()
    }
}

/// Pass-through signer: funds nothing and returns transactions as-is,
/// which keeps locally computed txids stable for assertions.
pub struct MockSigner {
    address: String,
    pay_calls: AtomicUsize,
    sign_calls: AtomicUsize,
}

impl MockSigner {
    /// Create a mock signer claiming the given address.
    pub fn new(address: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            address: address.into(),
            pay_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
        })
    }

    /// Number of `pay_and_fund` calls observed.
    pub fn pay_calls(&self) -> usize {
        self.pay_calls.load(Ordering::SeqCst)
    }

    /// Number of `sign_owned_inputs` calls observed.
    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Signer for MockSigner {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn sign_owned_inputs(
        &self,
        raw_tx_hex: &str,
        _prev_outputs: &[PrevOutput],
        _input_indexes: &[usize],
    ) -> Result<String> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        Ok(raw_tx_hex.to_string())
    }

    async fn pay_and_fund(
        &self,
        transactions: Vec<PendingTransaction>,
        _fee_rate: Option<f64>,
    ) -> Result<Vec<SignedTransaction>> {
        self.pay_calls.fetch_add(1, Ordering::SeqCst);
        Ok(transactions
            .into_iter()
            .map(|p| SignedTransaction::from(p.builder.into_transaction()))
            .collect())
    }
}

/// Broadcaster that reports locally computed txids, optionally lying
/// about one of them.
#[derive(Default)]
pub struct MockBroadcaster {
    tamper_at: Option<usize>,
    calls: AtomicUsize,
    sent: Mutex<Vec<String>>,
}

impl MockBroadcaster {
    /// Create a well-behaved broadcaster.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a broadcaster that reports a bogus txid for the n-th
    /// broadcast (zero-based).
    pub fn tampering_at(index: usize) -> Arc<Self> {
        Arc::new(Self {
            tamper_at: Some(index),
            ..Self::default()
        })
    }

    /// Number of broadcasts attempted.
    pub fn broadcast_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Txids of the transactions actually submitted, in order.
    pub fn sent_txids(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Broadcaster for MockBroadcaster {
    async fn broadcast(&self, tx: &SignedTransaction) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let txid = tx.txid();
        self.sent.lock().unwrap().push(txid.clone());
        if self.tamper_at == Some(n) {
            return Ok(format!("{:0>64}", "deadbeef"));
        }
        Ok(txid)
    }
}

/// Indexer over an in-memory ledger and a scriptable utxo table.
pub struct MockIndexer {
    ledger: Arc<MockLedger>,
    utxos: Mutex<HashMap<String, Vec<(String, u32, u64)>>>,
    identity: Mutex<Option<IdentityRecord>>,
    find_calls: AtomicUsize,
    find_misses: AtomicUsize,
}

impl MockIndexer {
    /// Create an indexer backed by the shared ledger.
    pub fn new(ledger: Arc<MockLedger>) -> Arc<Self> {
        Arc::new(Self {
            ledger,
            utxos: Mutex::new(HashMap::new()),
            identity: Mutex::new(None),
            find_calls: AtomicUsize::new(0),
            find_misses: AtomicUsize::new(0),
        })
    }

    /// Make the next `n` spendable-output lookups miss, as if the
    /// granted output had not been indexed yet.
    pub fn set_find_misses(&self, n: usize) {
        self.find_misses.store(n, Ordering::SeqCst);
    }

    /// Register a spendable output for an address.
    pub fn add_spendable(&self, address: &str, txid: &str, vout: u32, value: u64) {
        self.utxos
            .lock()
            .unwrap()
            .entry(address.to_string())
            .or_default()
            .push((txid.to_string(), vout, value));
    }

    /// Set the identity returned for every lookup.
    pub fn set_identity(&self, identity: IdentityRecord) {
        *self.identity.lock().unwrap() = Some(identity);
    }

    /// Number of spendable-output lookups observed.
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Indexer for MockIndexer {
    async fn find_spendable_output(&self, address: &str) -> Result<Option<FundingUtxo>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .find_misses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(None);
        }
        let mut utxos = self.utxos.lock().unwrap();
        let Some(list) = utxos.get_mut(address) else {
            return Ok(None);
        };
        if list.is_empty() {
            return Ok(None);
        }
        let (txid, vout, value) = list.remove(0);
        Ok(Some(FundingUtxo::new(txid, vout, value, address)))
    }

    async fn fetch_raw_transaction(&self, txid: &str) -> Result<Vec<u8>> {
        self.ledger.get(txid).ok_or_else(|| {
            PinkitError::network("fetch raw transaction", format!("unknown txid {txid}"))
        })
    }

    async fn lookup_identity(&self, _address: &str) -> Result<Option<IdentityRecord>> {
        Ok(self.identity.lock().unwrap().clone())
    }
}

/// Assist service over the shared ledger.
///
/// `pre_commit` returns the submitted hex unchanged (the sponsor adds no
/// inputs in tests); `commit` records the transaction in the ledger so
/// follow-up input resolution finds it.
pub struct MockAssist {
    ledger: Arc<MockLedger>,
    grant: Mutex<Option<(String, u32, u64, String)>>,
    fail_commit_at: Option<usize>,
    commit_calls: AtomicUsize,
    pre_calls: AtomicUsize,
}

impl MockAssist {
    /// Create an assist service backed by the shared ledger.
    pub fn new(ledger: Arc<MockLedger>) -> Arc<Self> {
        Arc::new(Self {
            ledger,
            grant: Mutex::new(None),
            fail_commit_at: None,
            commit_calls: AtomicUsize::new(0),
            pre_calls: AtomicUsize::new(0),
        })
    }

    /// Create an assist service whose n-th commit (zero-based) fails.
    pub fn failing_commit_at(ledger: Arc<MockLedger>, index: usize) -> Arc<Self> {
        Arc::new(Self {
            ledger,
            grant: Mutex::new(None),
            fail_commit_at: Some(index),
            commit_calls: AtomicUsize::new(0),
            pre_calls: AtomicUsize::new(0),
        })
    }

    /// Queue a one-shot grant handed out by `init_grant`.
    pub fn set_grant(&self, txid: &str, vout: u32, value: u64, address: &str) {
        *self.grant.lock().unwrap() =
            Some((txid.to_string(), vout, value, address.to_string()));
    }

    /// Number of commits attempted.
    pub fn commit_calls(&self) -> usize {
        self.commit_calls.load(Ordering::SeqCst)
    }

    /// Number of pre-commits observed.
    pub fn pre_calls(&self) -> usize {
        self.pre_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssistService for MockAssist {
    async fn init_grant(&self, _address: &str) -> Result<Option<FundingUtxo>> {
        Ok(self
            .grant
            .lock()
            .unwrap()
            .take()
            .map(|(txid, vout, value, address)| FundingUtxo::new(txid, vout, value, address)))
    }

    async fn pre_commit(&self, unsigned_tx_hex: &str, _address: &str) -> Result<PreCommitGrant> {
        let n = self.pre_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PreCommitGrant {
            funded_tx_hex: unsigned_tx_hex.to_string(),
            order_id: format!("order-{n}"),
        })
    }

    async fn commit(&self, signed_tx_hex: &str, _order_id: &str) -> Result<String> {
        let n = self.commit_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_commit_at == Some(n) {
            return Err(PinkitError::assist("simulated commit failure"));
        }
        let tx = SignedTransaction::from_hex(signed_tx_hex)?;
        self.ledger.insert(&tx);
        Ok(tx.txid())
    }
}

/// Notifier that records announcements and can be told to fail.
#[derive(Default)]
pub struct MockNotifier {
    fail: bool,
    notified: Mutex<Vec<String>>,
}

impl MockNotifier {
    /// Create a well-behaved notifier.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a notifier whose every call fails.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            notified: Mutex::new(Vec::new()),
        })
    }

    /// Raw hexes announced so far.
    pub fn notified(&self) -> Vec<String> {
        self.notified.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, raw_tx_hex: &str) -> Result<()> {
        if self.fail {
            return Err(PinkitError::network("notify", "simulated notifier outage"));
        }
        self.notified.lock().unwrap().push(raw_tx_hex.to_string());
        Ok(())
    }
}
