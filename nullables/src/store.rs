//! Nullable store: thread-safe in-memory atomic storage for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use marketd_store::{AtomicStore, StoreError};

/// An in-memory [`AtomicStore`] for testing.
///
/// One mutex guards the whole map, so every operation is linearizable.
#[derive(Default)]
pub struct NullAtomicStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    writes: AtomicUsize,
    lost_races: AtomicUsize,
    failure: Mutex<Option<(&'static str, String)>>,
}

impl NullAtomicStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes that changed the store (put, successful
    /// put-if-absent / CAS, delete).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Every raw key currently stored, in order.
    pub fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }

    /// Make the next `count` conditional writes (put-if-absent and CAS)
    /// report a lost race without writing.
    pub fn lose_next_races(&self, count: usize) {
        self.lost_races.store(count, Ordering::SeqCst);
    }

    /// Make the next call to `operation` (e.g. `"get"`, `"compare_and_swap"`)
    /// fail with a backend error carrying `message`.
    pub fn fail_next(&self, operation: &'static str, message: &str) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((operation, message.to_string()));
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_failure(&self, operation: &'static str, key: &str) -> Result<(), StoreError> {
        let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if !matches!(failure.as_ref(), Some((op, _)) if *op == operation) {
            return Ok(());
        }
        let message = failure.take().map(|(_, m)| m).unwrap_or_default();
        Err(StoreError::backend(operation, key, message))
    }

    fn take_lost_race(&self) -> bool {
        self.lost_races
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl AtomicStore for NullAtomicStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_failure("get", key)?;
        Ok(self.entries().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.check_failure("put", key)?;
        self.entries().insert(key.to_string(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        self.check_failure("put_if_absent", key)?;
        if self.take_lost_race() {
            return Ok(false);
        }
        let mut entries = self.entries();
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: &[u8],
    ) -> Result<bool, StoreError> {
        self.check_failure("compare_and_swap", key)?;
        if self.take_lost_race() {
            return Ok(false);
        }
        let mut entries = self.entries();
        match entries.get_mut(key) {
            Some(current) if current.as_slice() == expected => {
                *current = new.to_vec();
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn get_by_prefix(&self, prefix: &str) -> Result<BTreeMap<String, Vec<u8>>, StoreError> {
        self.check_failure("get_by_prefix", prefix)?;
        Ok(self
            .entries()
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_failure("delete", key)?;
        if self.entries().remove(key).is_some() {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
