//! Assisted-funding pin orchestration.
//!
//! Each record becomes its own transaction, funded by a sponsor-granted
//! output and walked through the assist service: pre-commit adds the
//! fee-covering inputs, the wallet signs its own input, commit finalizes
//! and broadcasts. The change output sits at a fixed index, so the next
//! record in a chain derives its funding output without re-querying the
//! ledger.

use pinkit_lib::{
    compose_assisted_pin, FundingUtxo, PinkitError, PrevOutput, ProtocolRecord, Result,
    SignedTransaction, ASSISTED_CHANGE_VOUT,
};

use crate::session::PinSession;

/// The wallet's own input is always first in an assisted transaction.
const OWNED_INPUT_INDEX: usize = 0;

/// Options for one assisted pin write.
#[derive(Debug, Default)]
pub struct AssistedPinOptions {
    /// Funding output carried over from the previous write in a chain.
    /// When absent, funding is resolved from the indexer or the assist
    /// service.
    pub funding: Option<FundingUtxo>,
}

/// Result of one assisted pin write.
#[derive(Debug)]
pub struct AssistedPinResult {
    /// Canonical id reported by the assist service's commit step.
    pub txid: String,
    /// Funding output for the next write in the chain, derived from the
    /// committed transaction's change output.
    pub next_funding: FundingUtxo,
}

impl PinSession {
    /// Write one pin through the assist service.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, record, options), fields(path = record.path()))
    )]
    pub async fn create_pin_assisted(
        &self,
        record: &ProtocolRecord,
        options: AssistedPinOptions,
    ) -> Result<AssistedPinResult> {
        self.ensure_connected()?;
        let assist = self.assist_service()?.clone();

        let funding = match options.funding {
            Some(funding) => funding,
            None => self.resolve_funding().await?,
        };
        let owner = funding.address.clone();
        let funding_value = funding.value;

        let pending = compose_assisted_pin(
            record,
            self.network(),
            funding,
            None,
            &self.config().limits,
        )?;

        let grant = assist.pre_commit(&pending.raw_hex(), self.address()).await?;
        let funded = SignedTransaction::from_hex(&grant.funded_tx_hex)?;

        // The signer needs every input's previous output; fetch each
        // referenced transaction concurrently, keeping input order.
        let fetches = funded.transaction().input.iter().map(|input| {
            let txid = input.previous_output.txid.to_string();
            let vout = input.previous_output.vout as usize;
            async move {
                let bytes = self.indexer().fetch_raw_transaction(&txid).await?;
                let prev = SignedTransaction::from_bytes(&bytes)?;
                let output = prev.transaction().output.get(vout).ok_or_else(|| {
                    PinkitError::network(
                        "resolve input",
                        format!("transaction {txid} has no output {vout}"),
                    )
                })?;
                Ok::<_, PinkitError>(PrevOutput {
                    script_pubkey: output.script_pubkey.to_bytes(),
                    value: output.value.to_sat(),
                })
            }
        });
        let prev_outputs = futures::future::try_join_all(fetches).await?;

        let signed_hex = self
            .signer()
            .sign_owned_inputs(&grant.funded_tx_hex, &prev_outputs, &[OWNED_INPUT_INDEX])
            .await?;

        let txid = assist.commit(&signed_hex, &grant.order_id).await?;
        let next_funding =
            FundingUtxo::new(txid.clone(), ASSISTED_CHANGE_VOUT, funding_value, owner);

        Ok(AssistedPinResult { txid, next_funding })
    }

    /// Resolve a funding output: an existing spendable output wins,
    /// otherwise ask the assist service for a grant, and if the grant is
    /// still pending, re-read the indexer after the configured pause.
    async fn resolve_funding(&self) -> Result<FundingUtxo> {
        if let Some(utxo) = self.indexer().find_spendable_output(self.address()).await? {
            return Ok(utxo);
        }

        let assist = self.assist_service()?;
        if let Some(utxo) = assist.init_grant(self.address()).await? {
            return Ok(utxo);
        }

        let retry = self.config().funding_retry;
        for _ in 0..retry.max_attempts {
            tokio::time::sleep(retry.interval).await;
            if let Some(utxo) = self.indexer().find_spendable_output(self.address()).await? {
                return Ok(utxo);
            }
        }

        Err(PinkitError::NoFundingAvailable {
            address: self.address().to_string(),
        })
    }
}
