//! Transaction execution receipts.
//!
//! Exactly one [`Receipt`] is produced per executed transaction. Receipts
//! are immutable once built: the executor assembles the outcome and event
//! logs, then seals them behind accessors.

use crate::core::value::ParamValue;
use crate::types::hash::Hash;
use valuechain_derive::BinaryCodec;

/// Return code signalling successful method execution.
pub const RETURN_OK: u32 = 0;

/// A structured log entry emitted by a method body.
#[derive(Clone, Debug, PartialEq, Eq, BinaryCodec)]
pub struct EventLog {
    /// Event name, e.g. `"transfer"`.
    pub name: String,
    /// Event payload.
    pub params: ParamValue,
}

/// Record of a single transaction's execution outcome.
#[derive(Clone, Debug, PartialEq, Eq, BinaryCodec)]
pub struct Receipt {
    transaction_hash: Hash,
    return_code: u32,
    event_logs: Vec<EventLog>,
}

impl Receipt {
    /// Seals a receipt.
    ///
    /// Event logs are recorded only for successful executions; a nonzero
    /// return code drops them along with the rolled-back state.
    pub(crate) fn new(transaction_hash: Hash, return_code: u32, event_logs: Vec<EventLog>) -> Self {
        let event_logs = if return_code == RETURN_OK {
            event_logs
        } else {
            Vec::new()
        };
        Receipt {
            transaction_hash,
            return_code,
            event_logs,
        }
    }

    /// Hash of the transaction that produced this receipt.
    pub fn transaction_hash(&self) -> Hash {
        self.transaction_hash
    }

    /// Method return code; [`RETURN_OK`] means success.
    pub fn return_code(&self) -> u32 {
        self.return_code
    }

    /// True when the method body committed.
    pub fn succeeded(&self) -> bool {
        self.return_code == RETURN_OK
    }

    /// Ordered event logs; empty for failed executions.
    pub fn event_logs(&self) -> &[EventLog] {
        &self.event_logs
    }
}
