//! Model ids visible to every user of a service group.

use std::fmt;
use std::sync::Arc;

use marketd_store::{
    AtomicStore, CanonicalKey, KeyEncoder, PrefixedStore, RetryPolicy, StoreError, TypedStore,
};
use serde::{Deserialize, Serialize};

use crate::membership::{add_model_id, remove_model_id, ModelIdSet};
use crate::{ModelKey, TrainingError};

pub const PUBLIC_MODEL_PREFIX: &str = "/model-user/publicModelStorage";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PublicModelKey {
    pub organization_id: String,
    pub service_id: String,
    pub group_id: String,
}

impl PublicModelKey {
    pub fn new(organization_id: &str, service_id: &str, group_id: &str) -> Self {
        Self {
            organization_id: organization_id.to_string(),
            service_id: service_id.to_string(),
            group_id: group_id.to_string(),
        }
    }
}

impl From<&ModelKey> for PublicModelKey {
    fn from(key: &ModelKey) -> Self {
        Self::new(&key.organization_id, &key.service_id, &key.group_id)
    }
}

impl CanonicalKey for PublicModelKey {
    fn canonical_key(&self) -> String {
        KeyEncoder::new()
            .field(&self.organization_id)
            .field(&self.service_id)
            .field(&self.group_id)
            .finish()
    }
}

impl fmt::Display for PublicModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_key())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicModelData {
    pub model_ids: Vec<String>,
}

impl ModelIdSet for PublicModelData {
    type Key = PublicModelKey;

    fn empty_for(_key: &PublicModelKey) -> Self {
        Self::default()
    }

    fn model_ids(&self) -> &[String] {
        &self.model_ids
    }

    fn model_ids_mut(&mut self) -> &mut Vec<String> {
        &mut self.model_ids
    }
}

pub struct PublicModelStore {
    delegate: TypedStore<PublicModelKey, PublicModelData>,
    retry: RetryPolicy,
}

impl PublicModelStore {
    pub fn new(store: Arc<dyn AtomicStore>) -> Self {
        Self {
            delegate: TypedStore::new(PrefixedStore::new(store, PUBLIC_MODEL_PREFIX)),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn get(&self, key: &PublicModelKey) -> Result<Option<PublicModelData>, StoreError> {
        self.delegate.get(key)
    }

    pub fn get_all(&self) -> Result<Vec<PublicModelData>, StoreError> {
        self.delegate.get_all()
    }

    pub fn put(&self, key: &PublicModelKey, data: &PublicModelData) -> Result<(), StoreError> {
        self.delegate.put(key, data)
    }

    pub fn put_if_absent(
        &self,
        key: &PublicModelKey,
        data: &PublicModelData,
    ) -> Result<bool, StoreError> {
        self.delegate.put_if_absent(key, data)
    }

    pub fn compare_and_swap(
        &self,
        key: &PublicModelKey,
        previous: &PublicModelData,
        data: &PublicModelData,
    ) -> Result<bool, StoreError> {
        self.delegate.compare_and_swap(key, previous, data)
    }

    pub fn add_public_model_id(
        &self,
        key: &PublicModelKey,
        model_id: &str,
    ) -> Result<(), TrainingError> {
        add_model_id(&self.delegate, self.retry, "add_public_model_id", key, model_id)
    }

    pub fn remove_public_model_id(
        &self,
        key: &PublicModelKey,
        model_id: &str,
    ) -> Result<(), TrainingError> {
        remove_model_id(&self.delegate, self.retry, "remove_public_model_id", key, model_id)
    }
}
