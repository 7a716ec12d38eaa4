//! Typed access over a [`PrefixedStore`].

use std::any::type_name;
use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::transaction::{CasUpdate, TypedCasRequest, TypedKeyValue};
use crate::{
    decode_key, AtomicStore, BincodeCodec, CanonicalKey, PrefixedStore, StoreError, ValueCodec,
};

/// A store of `V` records addressed by `K` keys.
///
/// Keys are rendered through [`CanonicalKey`], values through the codec `C`.
/// The store holds no state of its own and can be shared freely between
/// threads.
pub struct TypedStore<K, V, C = BincodeCodec> {
    storage: PrefixedStore,
    codec: C,
    _marker: PhantomData<fn(&K) -> V>,
}

impl<K, V, C: Clone> Clone for TypedStore<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            codec: self.codec.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V> TypedStore<K, V, BincodeCodec>
where
    K: CanonicalKey + Clone,
    BincodeCodec: ValueCodec<V>,
{
    pub fn new(storage: PrefixedStore) -> Self {
        Self::with_codec(storage, BincodeCodec)
    }
}

impl<K, V, C> TypedStore<K, V, C>
where
    K: CanonicalKey + Clone,
    C: ValueCodec<V>,
{
    pub fn with_codec(storage: PrefixedStore, codec: C) -> Self {
        Self {
            storage,
            codec,
            _marker: PhantomData,
        }
    }

    pub fn prefix(&self) -> &str {
        self.storage.prefix()
    }

    fn encode(&self, operation: &'static str, key: &str, value: &V) -> Result<Vec<u8>, StoreError> {
        self.codec
            .encode(value)
            .map_err(|e| StoreError::Serialization {
                operation,
                key: key.to_string(),
                type_name: type_name::<V>(),
                message: e.to_string(),
            })
    }

    fn decode(&self, operation: &'static str, key: &str, bytes: &[u8]) -> Result<V, StoreError> {
        self.codec
            .decode(bytes)
            .map_err(|e| StoreError::Serialization {
                operation,
                key: key.to_string(),
                type_name: type_name::<V>(),
                message: e.to_string(),
            })
    }

    /// Read the record under `key`. Absence is `Ok(None)`.
    pub fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        let canonical = key.canonical_key();
        match self.storage.get(&canonical)? {
            Some(bytes) => self.decode("get", &canonical, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Every record in this store's namespace, in unspecified order.
    ///
    /// Records under keys that are not canonical were not written through a
    /// typed store; they are still returned, with a warning.
    pub fn get_all(&self) -> Result<Vec<V>, StoreError> {
        self.storage
            .get_by_prefix("")?
            .iter()
            .map(|(key, bytes)| {
                if decode_key(key).is_none() {
                    warn!(prefix = self.prefix(), %key, "record under a non-canonical key");
                }
                self.decode("get_all", key, bytes)
            })
            .collect()
    }

    pub fn put(&self, key: &K, value: &V) -> Result<(), StoreError> {
        let canonical = key.canonical_key();
        let bytes = self.encode("put", &canonical, value)?;
        self.storage.put(&canonical, &bytes)
    }

    /// Insert `value` unless a record already exists; `false` if one did.
    pub fn put_if_absent(&self, key: &K, value: &V) -> Result<bool, StoreError> {
        let canonical = key.canonical_key();
        let bytes = self.encode("put_if_absent", &canonical, value)?;
        self.storage.put_if_absent(&canonical, &bytes)
    }

    /// Replace `expected` with `new`; `false` if the stored record is not
    /// `expected` (a lost race, not an error).
    pub fn compare_and_swap(&self, key: &K, expected: &V, new: &V) -> Result<bool, StoreError> {
        let canonical = key.canonical_key();
        let expected = self.encode("compare_and_swap", &canonical, expected)?;
        let new = self.encode("compare_and_swap", &canonical, new)?;
        self.storage.compare_and_swap(&canonical, &expected, &new)
    }

    pub fn delete(&self, key: &K) -> Result<(), StoreError> {
        self.storage.delete(&key.canonical_key())
    }

    /// Run an optimistic read-modify-write transaction.
    ///
    /// Returns `Ok(true)` once the update commits or reports
    /// [`CasUpdate::Unchanged`], and `Ok(false)` if the retry policy ran out
    /// after lost races. Backend, serialization and contract errors abort the
    /// loop immediately.
    ///
    /// Writes to several keys are applied one CAS at a time. A race lost on a
    /// later key leaves the earlier keys written.
    pub fn execute_transaction<F>(&self, request: TypedCasRequest<K, F>) -> Result<bool, StoreError>
    where
        F: FnMut(&[TypedKeyValue<K, V>]) -> Result<CasUpdate<K, V>, StoreError>,
    {
        let TypedCasRequest {
            condition_keys,
            retry,
            mut update,
        } = request;

        if condition_keys.is_empty() {
            return Err(StoreError::TransactionContract(
                "transaction has no condition keys".to_string(),
            ));
        }
        let canonical_keys: Vec<String> =
            condition_keys.iter().map(CanonicalKey::canonical_key).collect();

        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);

            let mut snapshot = Vec::with_capacity(condition_keys.len());
            let mut current = Vec::with_capacity(condition_keys.len());
            for (key, canonical) in condition_keys.iter().zip(&canonical_keys) {
                let raw = self.storage.get(canonical)?;
                let value = match &raw {
                    Some(bytes) => Some(self.decode("execute_transaction", canonical, bytes)?),
                    None => None,
                };
                snapshot.push(raw);
                current.push(TypedKeyValue {
                    key: key.clone(),
                    value,
                });
            }

            let writes = match update(&current)? {
                CasUpdate::Unchanged => {
                    debug!(prefix = self.prefix(), attempts, "transaction made no change");
                    return Ok(true);
                }
                CasUpdate::Write(writes) => writes,
            };

            let mut planned = Vec::with_capacity(writes.len());
            for (key, value) in &writes {
                let canonical = key.canonical_key();
                let index = canonical_keys
                    .iter()
                    .position(|c| *c == canonical)
                    .ok_or_else(|| {
                        StoreError::TransactionContract(format!(
                            "update writes '{canonical}' which is not a condition key"
                        ))
                    })?;
                if planned.iter().any(|(i, _)| *i == index) {
                    return Err(StoreError::TransactionContract(format!(
                        "update writes '{canonical}' more than once"
                    )));
                }
                let bytes = self.encode("execute_transaction", &canonical, value)?;
                planned.push((index, bytes));
            }

            let mut committed = true;
            for (index, bytes) in &planned {
                let canonical = &canonical_keys[*index];
                let swapped = match &snapshot[*index] {
                    Some(previous) => self.storage.compare_and_swap(canonical, previous, bytes)?,
                    None => self.storage.put_if_absent(canonical, bytes)?,
                };
                if !swapped {
                    debug!(
                        prefix = self.prefix(),
                        key = %canonical,
                        attempts,
                        "lost CAS race"
                    );
                    committed = false;
                    break;
                }
            }
            if committed {
                return Ok(true);
            }

            if !retry.allows_retry(attempts) {
                if attempts > 1 {
                    warn!(
                        prefix = self.prefix(),
                        attempts, "giving up on transaction after repeated CAS conflicts"
                    );
                }
                return Ok(false);
            }
        }
    }
}
