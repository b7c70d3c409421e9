//! State storage abstractions.
//!
//! The engine reads and writes chain state through the [`StateStorage`]
//! trait: a flat hash-keyed byte store with one level of scoped transaction.
//! Logical namespaces (database, table) are folded into the key by
//! [`state_key`], so a single flat store serves every component.

pub mod memory;

use crate::types::encoding::Encode;
use crate::types::hash::Hash;
use valuechain_derive::Error;

/// Name of the system database holding engine-owned tables.
pub const DB_SYSTEM: &str = "system";

/// Errors raised by storage backends and scope management.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum StorageError {
    /// `begin_transaction` was called while a scope was already open.
    #[error("a storage transaction scope is already open")]
    ScopeAlreadyOpen,
    /// `commit` or `rollback` was called with no open scope.
    #[error("no storage transaction scope is open")]
    NoOpenScope,
    /// A stored value failed to decode; the state is unusable.
    #[error("state entry corrupted: {0}")]
    Corrupted(String),
}

/// Key-value chain state with scoped transactions.
///
/// Implementations must be thread-safe (`Send + Sync`). Scope rules:
/// at most one scope is open at a time; writes issued while a scope is open
/// are buffered and only land on `commit`; `rollback` discards them. Reads
/// observe buffered writes first. The executor guarantees every opened scope
/// is resolved before control returns to the caller.
pub trait StateStorage: Send + Sync {
    /// Retrieves a value by key, `Ok(None)` if absent.
    fn get(&self, key: Hash) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores a key-value pair, overwriting any existing value.
    fn put(&self, key: Hash, value: Vec<u8>) -> Result<(), StorageError>;

    /// Removes a key.
    fn delete(&self, key: Hash) -> Result<(), StorageError>;

    /// Opens the scoped transaction.
    fn begin_transaction(&self) -> Result<(), StorageError>;

    /// Applies all writes buffered since `begin_transaction` atomically.
    fn commit(&self) -> Result<(), StorageError>;

    /// Discards all writes buffered since `begin_transaction`.
    fn rollback(&self) -> Result<(), StorageError>;
}

/// Derives the storage key for an item of a named table in a named database.
///
/// Domain-separated so distinct (db, table, item) triples can never collide
/// with each other or with other hash uses.
pub fn state_key(db: &str, table: &str, item: &[u8]) -> Hash {
    let mut h = Hash::sha3();
    h.update(b"STATE_KEY");
    db.encode(&mut h);
    table.encode(&mut h);
    item.len().encode(&mut h);
    h.update(item);
    h.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_key_is_deterministic() {
        assert_eq!(
            state_key(DB_SYSTEM, "balance", b"addr"),
            state_key(DB_SYSTEM, "balance", b"addr")
        );
    }

    #[test]
    fn state_key_separates_tables() {
        assert_ne!(
            state_key(DB_SYSTEM, "balance", b"addr"),
            state_key(DB_SYSTEM, "nonce", b"addr")
        );
    }

    #[test]
    fn state_key_separates_boundaries() {
        // ("ab", "c") and ("a", "bc") must not collide.
        assert_ne!(
            state_key(DB_SYSTEM, "ab", b"c"),
            state_key(DB_SYSTEM, "a", b"bc")
        );
    }
}
