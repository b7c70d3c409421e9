//! Engine error taxonomy.
//!
//! Three families, with different propagation rules:
//!
//! - validation faults (`InvalidNonce`, `InsufficientFunds`, `InvalidParam`,
//!   `UnknownMethod`) are detected before any state mutation and returned as
//!   typed results with no partial effects;
//! - execution faults (a method body returning nonzero) never appear here -
//!   they are recorded in the receipt's return code and do not abort block
//!   processing;
//! - engine faults (`Storage`, `CorruptState`) are unrecoverable for the
//!   current transaction or block and propagate upward.

use crate::storage::StorageError;
use crate::types::balance::Balance;
use valuechain_derive::Error;

/// Errors surfaced by transaction, block, and view execution.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// Transaction nonce is not the sender's stored nonce + 1.
    #[error("invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    /// Sender cannot cover principal plus fee.
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds {
        balance: Balance,
        required: Balance,
    },

    /// No method handler registered under this name.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// No view handler registered under this name.
    #[error("unknown view method: {0}")]
    UnknownViewMethod(String),

    /// A caller-supplied parameter is out of range or malformed.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Storage backend or scope-management failure.
    #[error("storage fault: {0}")]
    Storage(StorageError),

    /// Consensus-owned state is missing or undecodable.
    #[error("corrupt consensus state: {0}")]
    CorruptState(String),
}

impl From<StorageError> for ExecutionError {
    fn from(err: StorageError) -> Self {
        ExecutionError::Storage(err)
    }
}

/// Outcome of a candidate registration attempt.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// The candidate list is full per `GlobalOptions::max_validator`.
    ///
    /// A business-level rejection: method handlers map this to a nonzero
    /// return code rather than aborting the transaction.
    #[error("validator candidate limit reached: {0}")]
    LimitReached(u32),

    /// Engine fault while reading or writing the candidate list.
    #[error("storage fault: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for RegisterError {
    fn from(err: StorageError) -> Self {
        RegisterError::Storage(err)
    }
}
