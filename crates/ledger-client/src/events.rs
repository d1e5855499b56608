//! Event resolution over confirmed receipts
//!
//! A receipt carries logs from every contract the transaction touched. Only
//! entries that decode against the caller's interface are considered; the
//! rest are skipped, never reported as errors.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};

use crate::{ContractInterface, Receipt};

/// A log entry decoded against a known interface
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog {
    pub name: String,
    /// Contract that emitted the entry
    pub address: Address,
    /// Arguments in declaration order
    pub args: Vec<(String, DynSolValue)>,
}

impl DecodedLog {
    /// Argument by declared name
    pub fn arg(&self, name: &str) -> Option<&DynSolValue> {
        self.args.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Argument by position, for events with unnamed parameters
    pub fn arg_at(&self, index: usize) -> Option<&DynSolValue> {
        self.args.get(index).map(|(_, v)| v)
    }

    pub fn address_arg(&self, name: &str) -> Option<Address> {
        self.arg(name).and_then(DynSolValue::as_address)
    }

    pub fn uint_arg(&self, name: &str) -> Option<U256> {
        self.arg(name).and_then(|v| v.as_uint()).map(|(value, _)| value)
    }
}

/// Decode-or-skip iterator over a receipt's logs, in emission order.
pub fn decoded_events<'a>(
    receipt: &'a Receipt,
    interface: &'a ContractInterface,
) -> impl Iterator<Item = DecodedLog> + 'a {
    receipt.logs.iter().enumerate().filter_map(move |(index, log)| {
        let decoded = interface.decode_log(log);
        if decoded.is_none() {
            tracing::trace!(
                tx_hash = %receipt.tx_hash,
                index,
                emitter = %log.address,
                "Skipping log not described by {}",
                interface.name()
            );
        }
        decoded
    })
}

/// First decoded entry named `event_name`, if any.
pub fn find_event(
    receipt: &Receipt,
    interface: &ContractInterface,
    event_name: &str,
) -> Option<DecodedLog> {
    decoded_events(receipt, interface).find(|log| log.name == event_name)
}
