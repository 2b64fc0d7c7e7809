//! Batch pin orchestration.
//!
//! Pin writes accumulate as unfunded transactions until a finishing call
//! hands the whole list to the signer's pay step, which funds and signs
//! them as one unit. Broadcasts then happen in accumulation order, each
//! verified against the locally computed transaction id before the next
//! one goes out.

use pinkit_lib::{
    compose_pin, OutputRequest, PendingTransaction, PinkitError, ProtocolRecord, Result,
};

use crate::session::PinSession;

/// Whether a pin write keeps accumulating or settles the batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SerialAction {
    /// Compose and accumulate; no payment yet.
    Combo,
    /// Compose, then pay and broadcast everything accumulated so far.
    #[default]
    Finish,
}

/// Options for one batch pin write.
#[derive(Debug, Default)]
pub struct CreatePinOptions {
    /// Accumulate or settle.
    pub serial_action: SerialAction,
    /// Transactions accumulated by previous combo calls.
    pub transactions: Vec<PendingTransaction>,
    /// Optional fee-sponsor service output.
    pub service: Option<OutputRequest>,
    /// Extra outputs appended after the data output.
    pub outputs: Vec<OutputRequest>,
    /// Fee rate hint in sat/byte; falls back to the session default.
    pub fee_rate: Option<f64>,
}

/// Result of one batch pin write.
///
/// Exactly one shape at a time: either the batch is still accumulating
/// and the caller must thread `transactions` into the next call, or the
/// batch settled and the write is durable.
#[derive(Clone, Debug)]
pub enum CreatePinResult {
    /// More records may follow; nothing has been paid or broadcast.
    Accumulating {
        /// The accumulated transactions, to pass into the next call.
        transactions: Vec<PendingTransaction>,
    },
    /// The batch was paid and broadcast.
    Settled {
        /// Id of the last broadcast transaction.
        txid: String,
        /// All broadcast ids, in accumulation order.
        txids: Vec<String>,
    },
}

impl CreatePinResult {
    /// Whether the write is durable on the ledger.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled { .. })
    }
}

impl PinSession {
    /// Compose a pin and either accumulate it or settle the whole batch.
    ///
    /// On `Finish`, the accumulated transactions are funded and signed
    /// by the signer as one logically atomic operation and broadcast in
    /// order. Each reported txid is checked against the id computed from
    /// the signed bytes; a disagreement aborts the remaining broadcasts
    /// with [`PinkitError::BroadcastMismatch`]. Completed broadcasts
    /// stay durable either way.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, record, options), fields(path = record.path()))
    )]
    pub async fn create_pin(
        &self,
        record: &ProtocolRecord,
        options: CreatePinOptions,
    ) -> Result<CreatePinResult> {
        self.ensure_connected()?;

        let mut transactions = options.transactions;
        let pending = compose_pin(
            record,
            self.network(),
            self.address(),
            options.service.as_ref(),
            &options.outputs,
            &self.config().limits,
        )?;
        transactions.push(pending);

        if options.serial_action == SerialAction::Combo {
            return Ok(CreatePinResult::Accumulating { transactions });
        }

        let fee_rate = options.fee_rate.or(self.config().fee_rate);
        let signed = self.signer().pay_and_fund(transactions, fee_rate).await?;

        let mut txids = Vec::with_capacity(signed.len());
        for tx in &signed {
            let computed = tx.txid();
            let reported = self.broadcaster().broadcast(tx).await?;
            if reported != computed {
                return Err(PinkitError::BroadcastMismatch { computed, reported });
            }
            // Best-effort announcement; a notifier outage never fails
            // the settled broadcast.
            if let Some(notifier) = self.notifier() {
                let _ = notifier.notify(&tx.raw_hex()).await;
            }
            txids.push(computed);
        }

        let txid = txids.last().cloned().unwrap_or_default();
        Ok(CreatePinResult::Settled { txid, txids })
    }
}
