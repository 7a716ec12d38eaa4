//! Raw atomic storage trait.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::StoreError;

/// A string-keyed byte store with linearizable single-key operations.
///
/// Implementations must make `put_if_absent` and `compare_and_swap` atomic per
/// key. Nothing is promised across keys.
pub trait AtomicStore: Send + Sync {
    /// Read the raw value under `key`. Absence is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Unconditionally overwrite `key`.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Insert `value` only if nothing is stored under `key`.
    /// Returns `false` when a value already exists.
    fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError>;

    /// Replace the value under `key` with `new` only if it currently equals
    /// `expected` byte for byte. Returns `false` on mismatch or absence.
    fn compare_and_swap(&self, key: &str, expected: &[u8], new: &[u8])
        -> Result<bool, StoreError>;

    /// Every key starting with `prefix`, with its value.
    fn get_by_prefix(&self, prefix: &str) -> Result<BTreeMap<String, Vec<u8>>, StoreError>;

    /// Remove `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: AtomicStore + ?Sized> AtomicStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        (**self).put_if_absent(key, value)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: &[u8],
    ) -> Result<bool, StoreError> {
        (**self).compare_and_swap(key, expected, new)
    }

    fn get_by_prefix(&self, prefix: &str) -> Result<BTreeMap<String, Vec<u8>>, StoreError> {
        (**self).get_by_prefix(prefix)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}
