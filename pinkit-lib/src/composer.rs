//! Pin composer: one protocol record, one transaction.
//!
//! Composition only builds bytes; nothing here touches the network.

use crate::builder::{FundingUtxo, PendingTransaction, TransactionBuilder};
use crate::codec::{self, DataLimits};
use crate::record::ProtocolRecord;
use crate::{Network, PinkitError, Result};

/// Value of the nominal self-output carried by every pin transaction.
pub const PIN_OUTPUT_SATS: u64 = 1;

/// Output index of the change output in an assisted composition.
///
/// Assisted transactions always lay out `[self, data, change]`, so the
/// change is the last output and the next funding output in a chain can
/// be derived without re-querying the ledger.
pub const ASSISTED_CHANGE_VOUT: u32 = 2;

/// A caller-requested extra output (fee-sponsor service cut, tips, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRequest {
    /// Destination address.
    pub address: String,
    /// Value in satoshis.
    pub value: u64,
}

impl OutputRequest {
    /// Construct an output request.
    pub fn new(address: impl Into<String>, value: u64) -> Self {
        Self {
            address: address.into(),
            value,
        }
    }
}

/// Compose an accumulating pin transaction: nominal self-output, data
/// output, then any service/extra outputs. Input selection is deferred
/// to the signer's pay step.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(skip_all, fields(path = record.path()))
)]
pub fn compose_pin(
    record: &ProtocolRecord,
    network: Network,
    self_address: &str,
    service: Option<&OutputRequest>,
    extra_outputs: &[OutputRequest],
    limits: &DataLimits,
) -> Result<PendingTransaction> {
    limits.check(record)?;

    let mut builder = TransactionBuilder::new(network);
    builder.add_output(self_address, PIN_OUTPUT_SATS)?;
    builder.add_data_output(codec::encode(record));
    if let Some(service) = service {
        builder.add_output(&service.address, service.value)?;
    }
    for output in extra_outputs {
        builder.add_output(&output.address, output.value)?;
    }

    Ok(PendingTransaction::new(builder, "Create Pin"))
}

/// Compose an assisted pin transaction spending the funding output as
/// its sole input.
///
/// The layout is fixed: `[self, data, change]` with the change returning
/// `change_value` (the full funding value by default) to the funding
/// address at the last index. Extra outputs are unrepresentable here on
/// purpose - the derived-next-funding contract pins the change to
/// [`ASSISTED_CHANGE_VOUT`].
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(skip_all, fields(path = record.path(), funding = %funding.txid))
)]
pub fn compose_assisted_pin(
    record: &ProtocolRecord,
    network: Network,
    funding: FundingUtxo,
    change_value: Option<u64>,
    limits: &DataLimits,
) -> Result<PendingTransaction> {
    limits.check(record)?;

    let change_value = change_value.unwrap_or(funding.value);
    if change_value > funding.value {
        return Err(PinkitError::invalid_input(
            "change_value",
            format!(
                "requested outputs of {change_value} sats exceed the {} sat funding input",
                funding.value
            ),
        ));
    }

    let mut builder = TransactionBuilder::new(network);
    builder.add_input(&funding.txid, funding.vout, &funding.address)?;
    builder.add_output(&funding.address, PIN_OUTPUT_SATS)?;
    builder.add_data_output(codec::encode(record));
    builder.add_output(&funding.address, change_value)?;
    debug_assert_eq!(builder.outputs().len() as u32 - 1, ASSISTED_CHANGE_VOUT);

    Ok(PendingTransaction::new(builder, "Create Pin"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ContentEncoding;

    const ADDR: &str = "mipcBbFg9gMiCh81Kj8tqqdgoZub1ZJRfn";
    const SERVICE_ADDR: &str = "n4eA2nbYqErp7H6jebchxAN59DmNpksexv";
    const FUNDING_TXID: &str = "4988b001789b5dd76db60017ce85ccbb04a3f2aa825457aa948dc3c1e3b6e552";

    fn record() -> ProtocolRecord {
        ProtocolRecord::create("/info/name", "alice", ContentEncoding::Utf8, "text/plain").unwrap()
    }

    #[test]
    fn accumulating_layout() {
        let pending = compose_pin(
            &record(),
            Network::Testnet,
            ADDR,
            Some(&OutputRequest::new(SERVICE_ADDR, 100)),
            &[OutputRequest::new(ADDR, 50)],
            &DataLimits::default(),
        )
        .unwrap();

        let outputs = pending.builder.outputs();
        assert_eq!(outputs.len(), 4);
        assert_eq!(outputs[0].value.to_sat(), PIN_OUTPUT_SATS);
        assert_eq!(outputs[1].value.to_sat(), 0);
        assert_eq!(outputs[1].script_pubkey.as_bytes(), codec::encode(&record()));
        assert_eq!(outputs[2].value.to_sat(), 100);
        assert_eq!(outputs[3].value.to_sat(), 50);
        assert!(pending.builder.inputs().is_empty());
    }

    #[test]
    fn assisted_layout_pins_change_last() {
        let funding = FundingUtxo::new(FUNDING_TXID, 0, 1000, ADDR);
        let pending = compose_assisted_pin(
            &record(),
            Network::Testnet,
            funding,
            None,
            &DataLimits::default(),
        )
        .unwrap();

        let outputs = pending.builder.outputs();
        assert_eq!(pending.builder.inputs().len(), 1);
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs.len() as u32 - 1, ASSISTED_CHANGE_VOUT);
        assert_eq!(outputs[0].value.to_sat(), PIN_OUTPUT_SATS);
        assert_eq!(outputs[1].value.to_sat(), 0);
        assert_eq!(outputs[2].value.to_sat(), 1000);
    }

    #[test]
    fn assisted_rejects_overdrawn_change() {
        let funding = FundingUtxo::new(FUNDING_TXID, 0, 1000, ADDR);
        let err = compose_assisted_pin(
            &record(),
            Network::Testnet,
            funding,
            Some(1001),
            &DataLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PinkitError::InvalidInput { .. }));
    }

    #[test]
    fn oversized_payload_rejected_before_composition() {
        let limits = DataLimits {
            max_payload_bytes: 2,
        };
        assert!(compose_pin(&record(), Network::Testnet, ADDR, None, &[], &limits).is_err());
    }
}
