//! Per-user lists of accessible model ids.

use std::fmt;
use std::sync::Arc;

use marketd_store::{
    AtomicStore, CanonicalKey, KeyEncoder, PrefixedStore, RetryPolicy, StoreError, TypedStore,
};
use serde::{Deserialize, Serialize};

use crate::membership::{add_model_id, remove_model_id, ModelIdSet};
use crate::{ModelKey, TrainingError};

pub const MODEL_USER_PREFIX: &str = "/model-user/userModelStorage";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelUserKey {
    pub organization_id: String,
    pub service_id: String,
    pub group_id: String,
    pub user_address: String,
}

impl ModelUserKey {
    pub fn new(
        organization_id: &str,
        service_id: &str,
        group_id: &str,
        user_address: &str,
    ) -> Self {
        Self {
            organization_id: organization_id.to_string(),
            service_id: service_id.to_string(),
            group_id: group_id.to_string(),
            user_address: user_address.to_string(),
        }
    }

    /// The user key for `user_address` in the group that owns `model`.
    pub fn for_model(model: &ModelKey, user_address: &str) -> Self {
        Self::new(
            &model.organization_id,
            &model.service_id,
            &model.group_id,
            user_address,
        )
    }
}

impl CanonicalKey for ModelUserKey {
    fn canonical_key(&self) -> String {
        KeyEncoder::new()
            .field(&self.organization_id)
            .field(&self.service_id)
            .field(&self.group_id)
            .field(&self.user_address)
            .finish()
    }
}

impl fmt::Display for ModelUserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_key())
    }
}

/// All model ids a user address can access within one group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUserData {
    pub model_ids: Vec<String>,
    // Copies of the key fields, for display only.
    pub organization_id: String,
    pub service_id: String,
    pub group_id: String,
    pub user_address: String,
}

impl ModelIdSet for ModelUserData {
    type Key = ModelUserKey;

    fn empty_for(key: &ModelUserKey) -> Self {
        Self {
            model_ids: Vec::new(),
            organization_id: key.organization_id.clone(),
            service_id: key.service_id.clone(),
            group_id: key.group_id.clone(),
            user_address: key.user_address.clone(),
        }
    }

    fn model_ids(&self) -> &[String] {
        &self.model_ids
    }

    fn model_ids_mut(&mut self) -> &mut Vec<String> {
        &mut self.model_ids
    }
}

pub struct ModelUserStore {
    delegate: TypedStore<ModelUserKey, ModelUserData>,
    retry: RetryPolicy,
}

impl ModelUserStore {
    pub fn new(store: Arc<dyn AtomicStore>) -> Self {
        Self {
            delegate: TypedStore::new(PrefixedStore::new(store, MODEL_USER_PREFIX)),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn get(&self, key: &ModelUserKey) -> Result<Option<ModelUserData>, StoreError> {
        self.delegate.get(key)
    }

    pub fn get_all(&self) -> Result<Vec<ModelUserData>, StoreError> {
        self.delegate.get_all()
    }

    pub fn put(&self, key: &ModelUserKey, data: &ModelUserData) -> Result<(), StoreError> {
        self.delegate.put(key, data)
    }

    pub fn put_if_absent(
        &self,
        key: &ModelUserKey,
        data: &ModelUserData,
    ) -> Result<bool, StoreError> {
        self.delegate.put_if_absent(key, data)
    }

    pub fn compare_and_swap(
        &self,
        key: &ModelUserKey,
        previous: &ModelUserData,
        data: &ModelUserData,
    ) -> Result<bool, StoreError> {
        self.delegate.compare_and_swap(key, previous, data)
    }

    pub fn add_model_id(&self, key: &ModelUserKey, model_id: &str) -> Result<(), TrainingError> {
        add_model_id(&self.delegate, self.retry, "add_user_model_id", key, model_id)
    }

    pub fn remove_model_id(&self, key: &ModelUserKey, model_id: &str) -> Result<(), TrainingError> {
        remove_model_id(&self.delegate, self.retry, "remove_user_model_id", key, model_id)
    }
}
