//! Deduplicated model-id lists stored as a single record.
//!
//! Adding or removing an id is a CAS transaction on the list record: read,
//! check membership, write the changed list, retry from a fresh read if another
//! writer got there first. Adding an id already present (or removing one that
//! is absent) commits without writing.

use marketd_store::{
    BincodeCodec, CanonicalKey, CasUpdate, RetryPolicy, StoreError, TypedCasRequest,
    TypedKeyValue, TypedStore, ValueCodec,
};

use crate::TrainingError;

/// A record that holds a set of model ids in insertion order.
pub trait ModelIdSet: Clone {
    type Key: CanonicalKey + Clone;

    /// The record to start from when nothing is stored under `key` yet.
    fn empty_for(key: &Self::Key) -> Self;

    fn model_ids(&self) -> &[String];

    fn model_ids_mut(&mut self) -> &mut Vec<String>;

    fn contains(&self, model_id: &str) -> bool {
        self.model_ids().iter().any(|id| id == model_id)
    }
}

fn single_value<'a, V: ModelIdSet>(
    values: &'a [TypedKeyValue<V::Key, V>],
    key: &V::Key,
) -> Result<Option<&'a V>, StoreError> {
    match values {
        [current] if current.key.canonical_key() == key.canonical_key() => {
            Ok(current.value.as_ref())
        }
        _ => Err(StoreError::TransactionContract(format!(
            "expected exactly the value of '{}', got {} values",
            key.canonical_key(),
            values.len()
        ))),
    }
}

fn committed<K: CanonicalKey>(
    committed: bool,
    operation: &'static str,
    key: &K,
) -> Result<(), TrainingError> {
    if committed {
        Ok(())
    } else {
        Err(TrainingError::NotCommitted {
            operation,
            key: key.canonical_key(),
        })
    }
}

/// Append `model_id` to the list under `key` unless it is already there.
pub(crate) fn add_model_id<V>(
    store: &TypedStore<V::Key, V>,
    retry: RetryPolicy,
    operation: &'static str,
    key: &V::Key,
    model_id: &str,
) -> Result<(), TrainingError>
where
    V: ModelIdSet,
    BincodeCodec: ValueCodec<V>,
{
    let request = TypedCasRequest::new(
        vec![key.clone()],
        retry,
        |values: &[TypedKeyValue<V::Key, V>]| -> Result<CasUpdate<V::Key, V>, StoreError> {
            let mut record = match single_value(values, key)? {
                Some(record) if record.contains(model_id) => return Ok(CasUpdate::Unchanged),
                Some(record) => record.clone(),
                None => V::empty_for(key),
            };
            record.model_ids_mut().push(model_id.to_string());
            Ok(CasUpdate::Write(vec![(key.clone(), record)]))
        },
    );
    committed(store.execute_transaction(request)?, operation, key)
}

/// Remove `model_id` from the list under `key` if present. An emptied list is
/// kept, not deleted.
pub(crate) fn remove_model_id<V>(
    store: &TypedStore<V::Key, V>,
    retry: RetryPolicy,
    operation: &'static str,
    key: &V::Key,
    model_id: &str,
) -> Result<(), TrainingError>
where
    V: ModelIdSet,
    BincodeCodec: ValueCodec<V>,
{
    let request = TypedCasRequest::new(
        vec![key.clone()],
        retry,
        |values: &[TypedKeyValue<V::Key, V>]| -> Result<CasUpdate<V::Key, V>, StoreError> {
            let mut record = match single_value(values, key)? {
                Some(record) if record.contains(model_id) => record.clone(),
                _ => return Ok(CasUpdate::Unchanged),
            };
            record.model_ids_mut().retain(|id| id != model_id);
            Ok(CasUpdate::Write(vec![(key.clone(), record)]))
        },
    );
    committed(store.execute_transaction(request)?, operation, key)
}
