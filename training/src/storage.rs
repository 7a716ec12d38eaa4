//! One handle over all four training stores.
//!
//! Keeps the pending, public and per-user lists in line with the model
//! records. List memberships are always derived from the model record as
//! stored, never from the value a caller wrote, so concurrent updates of one
//! model settle on the lists of whichever update committed last. Each list
//! update is its own CAS transaction; there is no atomicity across records,
//! so a crash between the model write and the list updates leaves the lists
//! behind until the next [`TrainingStorage::sync_model_indexes`].

use std::sync::Arc;

use marketd_store::{AtomicStore, RetryPolicy};
use tracing::debug;

use crate::{
    ModelData, ModelKey, ModelStore, ModelUpdate, ModelUserKey, ModelUserStore, PendingModelKey,
    PendingModelStore, PublicModelKey, PublicModelStore, TrainingError,
};

pub struct TrainingStorage {
    pub models: ModelStore,
    pub users: ModelUserStore,
    pub pending: PendingModelStore,
    pub public: PublicModelStore,
}

impl TrainingStorage {
    pub fn new(store: Arc<dyn AtomicStore>, retry: RetryPolicy) -> Self {
        Self {
            models: ModelStore::new(store.clone()).with_retry_policy(retry),
            users: ModelUserStore::new(store.clone()).with_retry_policy(retry),
            pending: PendingModelStore::new(store.clone()).with_retry_policy(retry),
            public: PublicModelStore::new(store).with_retry_policy(retry),
        }
    }

    /// Store a new model and list it for its users, and in the pending and
    /// public lists as its status and visibility require.
    ///
    /// Returns `false` without touching any list if a model already exists
    /// under `key`.
    pub fn register_model(&self, key: &ModelKey, data: &ModelData) -> Result<bool, TrainingError> {
        if !self.models.put_if_absent(key, data)? {
            debug!(%key, "model already registered");
            return Ok(false);
        }
        let addresses: Vec<String> = data.accessible_by().into_iter().map(String::from).collect();
        self.reconcile_indexes(key, &addresses)?;
        debug!(%key, status = %data.status, "registered model");
        Ok(true)
    }

    /// Change a stored model and bring the lists in line with the result.
    ///
    /// Addresses that gained access get the id added to their user record;
    /// addresses that lost it get it removed. Returns `None` if there is no
    /// model under `key` or `change` made no difference.
    pub fn update_model<F>(
        &self,
        key: &ModelKey,
        change: F,
    ) -> Result<Option<ModelUpdate>, TrainingError>
    where
        F: FnMut(&mut ModelData),
    {
        let Some(update) = self.models.update(key, change)? else {
            return Ok(None);
        };

        let mut addresses: Vec<String> = Vec::new();
        for address in update
            .previous
            .accessible_by()
            .into_iter()
            .chain(update.current.accessible_by())
        {
            if !addresses.iter().any(|a| a == address) {
                addresses.push(address.to_string());
            }
        }
        self.reconcile_indexes(key, &addresses)?;
        debug!(%key, status = %update.current.status, "updated model");
        Ok(Some(update))
    }

    /// List or unlist the model in the pending and public stores, and in the
    /// records of the users it is accessible to, according to the model
    /// record currently stored under `key`. Idempotent.
    pub fn sync_model_indexes(&self, key: &ModelKey) -> Result<(), TrainingError> {
        self.reconcile_indexes(key, &[])
    }

    /// Apply the list memberships of the stored record, then read it again
    /// and repeat until it did not change in between. A sync working from an
    /// outdated record is always followed by one working from a newer record,
    /// so the last list writes reflect the last committed model.
    ///
    /// `addresses` are checked for membership in addition to the ones the
    /// record grants access to, so revoked users are unlisted. Every address
    /// listed along the way stays a candidate for later rounds.
    fn reconcile_indexes(&self, key: &ModelKey, addresses: &[String]) -> Result<(), TrainingError> {
        let mut candidates = addresses.to_vec();
        let mut seen = self.models.get(key)?;
        loop {
            if let Some(data) = &seen {
                for address in data.accessible_by() {
                    if !candidates.iter().any(|a| a == address) {
                        candidates.push(address.to_string());
                    }
                }
            }
            self.apply_indexes(key, seen.as_ref(), &candidates)?;
            let now = self.models.get(key)?;
            if now == seen {
                return Ok(());
            }
            debug!(%key, "model changed while syncing its lists, syncing again");
            seen = now;
        }
    }

    fn apply_indexes(
        &self,
        key: &ModelKey,
        data: Option<&ModelData>,
        addresses: &[String],
    ) -> Result<(), TrainingError> {
        let pending_key = PendingModelKey::from(key);
        if data.is_some_and(|d| d.status.is_pending()) {
            self.pending
                .add_pending_model_id(&pending_key, &key.model_id)?;
        } else {
            self.pending
                .remove_pending_model_id(&pending_key, &key.model_id)?;
        }

        let public_key = PublicModelKey::from(key);
        if data.is_some_and(|d| d.is_public) {
            self.public.add_public_model_id(&public_key, &key.model_id)?;
        } else {
            self.public
                .remove_public_model_id(&public_key, &key.model_id)?;
        }

        let granted = data.map(ModelData::accessible_by).unwrap_or_default();
        for address in &granted {
            self.users
                .add_model_id(&ModelUserKey::for_model(key, address), &key.model_id)?;
        }
        for address in addresses.iter().filter(|a| !granted.contains(&a.as_str())) {
            self.users
                .remove_model_id(&ModelUserKey::for_model(key, address), &key.model_id)?;
        }
        Ok(())
    }

    /// Every stored model listed for `user`. Ids whose model record is
    /// missing are skipped.
    pub fn models_for_user(&self, user: &ModelUserKey) -> Result<Vec<ModelData>, TrainingError> {
        let Some(record) = self.users.get(user)? else {
            return Ok(Vec::new());
        };
        let mut models = Vec::with_capacity(record.model_ids.len());
        for model_id in &record.model_ids {
            let key = ModelKey::new(
                &user.organization_id,
                &user.service_id,
                &user.group_id,
                model_id,
            );
            match self.models.get(&key)? {
                Some(model) => models.push(model),
                None => debug!(%key, "user lists a model that is not stored"),
            }
        }
        Ok(models)
    }

    /// Every stored model listed as pending under `key`.
    pub fn pending_models(&self, key: &PendingModelKey) -> Result<Vec<ModelData>, TrainingError> {
        let Some(record) = self.pending.get(key)? else {
            return Ok(Vec::new());
        };
        let mut models = Vec::with_capacity(record.model_ids.len());
        for model_id in &record.model_ids {
            let model_key = ModelKey::new(
                &key.organization_id,
                &key.service_id,
                &key.group_id,
                model_id,
            );
            if let Some(model) = self.models.get(&model_key)? {
                models.push(model);
            }
        }
        Ok(models)
    }
}
