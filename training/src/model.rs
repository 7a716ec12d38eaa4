//! Model records.

use std::fmt;
use std::sync::Arc;

use marketd_store::{
    AtomicStore, CanonicalKey, CasUpdate, KeyEncoder, PrefixedStore, RetryPolicy, StoreError,
    TypedCasRequest, TypedKeyValue, TypedStore,
};
use serde::{Deserialize, Serialize};

use crate::{Status, TrainingError};

pub const MODEL_PREFIX: &str = "/model-user/modelStorage";

type ModelCasUpdate = CasUpdate<ModelKey, ModelData>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub organization_id: String,
    pub service_id: String,
    pub group_id: String,
    pub model_id: String,
}

impl ModelKey {
    pub fn new(organization_id: &str, service_id: &str, group_id: &str, model_id: &str) -> Self {
        Self {
            organization_id: organization_id.to_string(),
            service_id: service_id.to_string(),
            group_id: group_id.to_string(),
            model_id: model_id.to_string(),
        }
    }
}

impl CanonicalKey for ModelKey {
    fn canonical_key(&self) -> String {
        KeyEncoder::new()
            .field(&self.organization_id)
            .field(&self.service_id)
            .field(&self.group_id)
            .field(&self.model_id)
            .finish()
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_key())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelData {
    pub is_public: bool,
    pub model_name: String,
    /// Addresses allowed to use the model besides its creator.
    pub authorized_addresses: Vec<String>,
    pub status: Status,
    pub created_by_address: String,
    pub model_id: String,
    pub updated_by_address: String,
    pub group_id: String,
    pub organization_id: String,
    pub service_id: String,
    pub grpc_method_name: String,
    pub grpc_service_name: String,
    pub description: String,
    pub is_default: bool,
    pub training_link: String,
    pub updated_date: String,
}

impl ModelData {
    /// The creator followed by every authorized address, without repeats or
    /// empty entries.
    pub fn accessible_by(&self) -> Vec<&str> {
        let mut addresses: Vec<&str> = Vec::with_capacity(self.authorized_addresses.len() + 1);
        let candidates = std::iter::once(self.created_by_address.as_str())
            .chain(self.authorized_addresses.iter().map(String::as_str));
        for address in candidates {
            if !address.is_empty() && !addresses.contains(&address) {
                addresses.push(address);
            }
        }
        addresses
    }
}

/// The record before and after a committed [`ModelStore::update`].
#[derive(Clone, Debug, PartialEq)]
pub struct ModelUpdate {
    pub previous: ModelData,
    pub current: ModelData,
}

pub struct ModelStore {
    delegate: TypedStore<ModelKey, ModelData>,
    retry: RetryPolicy,
}

impl ModelStore {
    pub fn new(store: Arc<dyn AtomicStore>) -> Self {
        Self {
            delegate: TypedStore::new(PrefixedStore::new(store, MODEL_PREFIX)),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn get(&self, key: &ModelKey) -> Result<Option<ModelData>, StoreError> {
        self.delegate.get(key)
    }

    pub fn get_all(&self) -> Result<Vec<ModelData>, StoreError> {
        self.delegate.get_all()
    }

    pub fn put(&self, key: &ModelKey, data: &ModelData) -> Result<(), StoreError> {
        self.delegate.put(key, data)
    }

    pub fn put_if_absent(&self, key: &ModelKey, data: &ModelData) -> Result<bool, StoreError> {
        self.delegate.put_if_absent(key, data)
    }

    pub fn compare_and_swap(
        &self,
        key: &ModelKey,
        previous: &ModelData,
        data: &ModelData,
    ) -> Result<bool, StoreError> {
        self.delegate.compare_and_swap(key, previous, data)
    }

    /// Apply `change` to the stored record in a CAS transaction.
    ///
    /// `change` may run more than once under contention. Returns `None` if
    /// there is no record under `key` or `change` left it as it was.
    pub fn update<F>(
        &self,
        key: &ModelKey,
        mut change: F,
    ) -> Result<Option<ModelUpdate>, TrainingError>
    where
        F: FnMut(&mut ModelData),
    {
        let mut outcome = None;
        let request = TypedCasRequest::new(
            vec![key.clone()],
            self.retry,
            |values: &[TypedKeyValue<ModelKey, ModelData>]| -> Result<ModelCasUpdate, StoreError> {
                outcome = None;
                let Some(previous) = values.first().and_then(|v| v.value.as_ref()) else {
                    return Ok(CasUpdate::Unchanged);
                };
                let mut current = previous.clone();
                change(&mut current);
                if current == *previous {
                    return Ok(CasUpdate::Unchanged);
                }
                outcome = Some(ModelUpdate {
                    previous: previous.clone(),
                    current: current.clone(),
                });
                Ok(CasUpdate::Write(vec![(key.clone(), current)]))
            },
        );
        if !self.delegate.execute_transaction(request)? {
            return Err(TrainingError::NotCommitted {
                operation: "update_model",
                key: key.canonical_key(),
            });
        }
        Ok(outcome)
    }
}
