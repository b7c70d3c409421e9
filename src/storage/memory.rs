//! In-memory state storage.
//!
//! Backs the debug harness and tests. Committed state lives in a `BTreeMap`;
//! an open scope buffers its writes in an overlay that shadows reads until
//! the scope commits or rolls back.

use crate::storage::{StateStorage, StorageError};
use crate::types::hash::Hash;
use std::collections::BTreeMap;
use std::sync::Mutex;

struct Inner {
    /// Committed key-value state.
    committed: BTreeMap<Hash, Vec<u8>>,
    /// Buffered writes of the open scope: `Some` = upsert, `None` = delete.
    scope: Option<BTreeMap<Hash, Option<Vec<u8>>>>,
}

/// Thread-safe in-memory storage with scoped transactions.
///
/// Every harness run starts from a fresh, empty instance; nothing is ever
/// persisted to disk.
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    /// Creates an empty storage with no open scope.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                committed: BTreeMap::new(),
                scope: None,
            }),
        }
    }

    /// Returns the number of committed entries.
    ///
    /// Buffered scope writes are not counted.
    pub fn committed_len(&self) -> usize {
        self.inner.lock().unwrap().committed.len()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStorage for MemoryStorage {
    fn get(&self, key: Hash) -> Result<Option<Vec<u8>>, StorageError> {
        let inner = self.inner.lock().unwrap();
        if let Some(scope) = &inner.scope {
            if let Some(buffered) = scope.get(&key) {
                return Ok(buffered.clone());
            }
        }
        Ok(inner.committed.get(&key).cloned())
    }

    fn put(&self, key: Hash, value: Vec<u8>) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        match &mut inner.scope {
            Some(scope) => {
                scope.insert(key, Some(value));
            }
            None => {
                inner.committed.insert(key, value);
            }
        }
        Ok(())
    }

    fn delete(&self, key: Hash) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        match &mut inner.scope {
            Some(scope) => {
                scope.insert(key, None);
            }
            None => {
                inner.committed.remove(&key);
            }
        }
        Ok(())
    }

    fn begin_transaction(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.scope.is_some() {
            return Err(StorageError::ScopeAlreadyOpen);
        }
        inner.scope = Some(BTreeMap::new());
        Ok(())
    }

    fn commit(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let scope = inner.scope.take().ok_or(StorageError::NoOpenScope)?;
        for (key, write) in scope {
            match write {
                Some(value) => {
                    inner.committed.insert(key, value);
                }
                None => {
                    inner.committed.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn rollback(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.scope.take().is_none() {
            return Err(StorageError::NoOpenScope);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(s: &[u8]) -> Hash {
        Hash::digest(s)
    }

    #[test]
    fn get_returns_none_for_missing_key() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get(k(b"missing")).unwrap(), None);
    }

    #[test]
    fn put_then_get() {
        let storage = MemoryStorage::new();
        storage.put(k(b"key"), b"value".to_vec()).unwrap();
        assert_eq!(storage.get(k(b"key")).unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn delete_removes_committed_value() {
        let storage = MemoryStorage::new();
        storage.put(k(b"key"), b"value".to_vec()).unwrap();
        storage.delete(k(b"key")).unwrap();
        assert_eq!(storage.get(k(b"key")).unwrap(), None);
    }

    #[test]
    fn scope_buffers_until_commit() {
        let storage = MemoryStorage::new();
        storage.begin_transaction().unwrap();
        storage.put(k(b"key"), b"buffered".to_vec()).unwrap();

        // Visible through the overlay...
        assert_eq!(storage.get(k(b"key")).unwrap(), Some(b"buffered".to_vec()));
        // ...but not committed yet.
        assert_eq!(storage.committed_len(), 0);

        storage.commit().unwrap();
        assert_eq!(storage.get(k(b"key")).unwrap(), Some(b"buffered".to_vec()));
        assert_eq!(storage.committed_len(), 1);
    }

    #[test]
    fn rollback_discards_scope_writes() {
        let storage = MemoryStorage::new();
        storage.put(k(b"key"), b"old".to_vec()).unwrap();

        storage.begin_transaction().unwrap();
        storage.put(k(b"key"), b"new".to_vec()).unwrap();
        storage.put(k(b"other"), b"x".to_vec()).unwrap();
        storage.rollback().unwrap();

        assert_eq!(storage.get(k(b"key")).unwrap(), Some(b"old".to_vec()));
        assert_eq!(storage.get(k(b"other")).unwrap(), None);
    }

    #[test]
    fn scoped_delete_shadows_committed_value() {
        let storage = MemoryStorage::new();
        storage.put(k(b"key"), b"value".to_vec()).unwrap();

        storage.begin_transaction().unwrap();
        storage.delete(k(b"key")).unwrap();
        assert_eq!(storage.get(k(b"key")).unwrap(), None);

        storage.rollback().unwrap();
        assert_eq!(storage.get(k(b"key")).unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn nested_begin_rejected() {
        let storage = MemoryStorage::new();
        storage.begin_transaction().unwrap();
        assert_eq!(
            storage.begin_transaction(),
            Err(StorageError::ScopeAlreadyOpen)
        );
        storage.rollback().unwrap();
    }

    #[test]
    fn resolve_without_scope_rejected() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.commit(), Err(StorageError::NoOpenScope));
        assert_eq!(storage.rollback(), Err(StorageError::NoOpenScope));
    }

    #[test]
    fn commit_applies_deletes() {
        let storage = MemoryStorage::new();
        storage.put(k(b"key"), b"value".to_vec()).unwrap();

        storage.begin_transaction().unwrap();
        storage.delete(k(b"key")).unwrap();
        storage.commit().unwrap();

        assert_eq!(storage.get(k(b"key")).unwrap(), None);
        assert_eq!(storage.committed_len(), 0);
    }
}
