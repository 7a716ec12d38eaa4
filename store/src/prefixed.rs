//! Key namespacing over a shared [`AtomicStore`].
//!
//! Keys are stored as `"{prefix}/{key}"`. Enumeration scans `"{prefix}/"`,
//! so `/a/models` never sees keys written under `/a/modelsX`.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{AtomicStore, StoreError};

/// An [`AtomicStore`] that prepends a fixed path segment to every key.
#[derive(Clone)]
pub struct PrefixedStore {
    inner: Arc<dyn AtomicStore>,
    /// Prefix including the trailing separator.
    prefix: String,
}

impl PrefixedStore {
    pub fn new(inner: Arc<dyn AtomicStore>, prefix: &str) -> Self {
        Self {
            inner,
            prefix: format!("{}/", prefix.trim_end_matches('/')),
        }
    }

    /// The namespace this store writes under, without the trailing separator.
    pub fn prefix(&self) -> &str {
        &self.prefix[..self.prefix.len() - 1]
    }

    fn full_key(&self, key: &str) -> String {
        let mut full = String::with_capacity(self.prefix.len() + key.len());
        full.push_str(&self.prefix);
        full.push_str(key);
        full
    }
}

impl AtomicStore for PrefixedStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(&self.full_key(key))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.inner.put(&self.full_key(key), value)
    }

    fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        self.inner.put_if_absent(&self.full_key(key), value)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: &[u8],
    ) -> Result<bool, StoreError> {
        self.inner
            .compare_and_swap(&self.full_key(key), expected, new)
    }

    fn get_by_prefix(&self, prefix: &str) -> Result<BTreeMap<String, Vec<u8>>, StoreError> {
        let entries = self.inner.get_by_prefix(&self.full_key(prefix))?;
        Ok(entries
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&self.prefix)
                    .map(|stripped| (stripped.to_string(), value))
            })
            .collect())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(&self.full_key(key))
    }
}
