//! Model ids whose training is still in progress.
//!
//! The daemon polls the service for every id listed here until the model
//! reaches a final status.

use std::fmt;
use std::sync::Arc;

use marketd_store::{
    AtomicStore, CanonicalKey, KeyEncoder, PrefixedStore, RetryPolicy, StoreError, TypedStore,
};
use serde::{Deserialize, Serialize};

use crate::membership::{add_model_id, remove_model_id, ModelIdSet};
use crate::{ModelKey, TrainingError};

pub const PENDING_MODEL_PREFIX: &str = "/model-user/pendingModelStorage";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PendingModelKey {
    pub organization_id: String,
    pub service_id: String,
    pub group_id: String,
}

impl PendingModelKey {
    pub fn new(organization_id: &str, service_id: &str, group_id: &str) -> Self {
        Self {
            organization_id: organization_id.to_string(),
            service_id: service_id.to_string(),
            group_id: group_id.to_string(),
        }
    }
}

impl From<&ModelKey> for PendingModelKey {
    fn from(key: &ModelKey) -> Self {
        Self::new(&key.organization_id, &key.service_id, &key.group_id)
    }
}

impl CanonicalKey for PendingModelKey {
    fn canonical_key(&self) -> String {
        KeyEncoder::new()
            .field(&self.organization_id)
            .field(&self.service_id)
            .field(&self.group_id)
            .finish()
    }
}

impl fmt::Display for PendingModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_key())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingModelData {
    pub model_ids: Vec<String>,
}

impl ModelIdSet for PendingModelData {
    type Key = PendingModelKey;

    fn empty_for(_key: &PendingModelKey) -> Self {
        Self::default()
    }

    fn model_ids(&self) -> &[String] {
        &self.model_ids
    }

    fn model_ids_mut(&mut self) -> &mut Vec<String> {
        &mut self.model_ids
    }
}

pub struct PendingModelStore {
    delegate: TypedStore<PendingModelKey, PendingModelData>,
    retry: RetryPolicy,
}

impl PendingModelStore {
    pub fn new(store: Arc<dyn AtomicStore>) -> Self {
        Self {
            delegate: TypedStore::new(PrefixedStore::new(store, PENDING_MODEL_PREFIX)),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn get(&self, key: &PendingModelKey) -> Result<Option<PendingModelData>, StoreError> {
        self.delegate.get(key)
    }

    pub fn get_all(&self) -> Result<Vec<PendingModelData>, StoreError> {
        self.delegate.get_all()
    }

    pub fn put(&self, key: &PendingModelKey, data: &PendingModelData) -> Result<(), StoreError> {
        self.delegate.put(key, data)
    }

    pub fn put_if_absent(
        &self,
        key: &PendingModelKey,
        data: &PendingModelData,
    ) -> Result<bool, StoreError> {
        self.delegate.put_if_absent(key, data)
    }

    pub fn compare_and_swap(
        &self,
        key: &PendingModelKey,
        previous: &PendingModelData,
        data: &PendingModelData,
    ) -> Result<bool, StoreError> {
        self.delegate.compare_and_swap(key, previous, data)
    }

    /// Add `model_id` to the pending list under `key`; a no-op if it is
    /// already listed.
    pub fn add_pending_model_id(
        &self,
        key: &PendingModelKey,
        model_id: &str,
    ) -> Result<(), TrainingError> {
        add_model_id(&self.delegate, self.retry, "add_pending_model_id", key, model_id)
    }

    pub fn remove_pending_model_id(
        &self,
        key: &PendingModelKey,
        model_id: &str,
    ) -> Result<(), TrainingError> {
        remove_model_id(&self.delegate, self.retry, "remove_pending_model_id", key, model_id)
    }
}
