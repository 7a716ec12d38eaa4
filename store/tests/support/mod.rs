#![allow(dead_code)]

use std::sync::Arc;

use marketd_nullables::NullAtomicStore;
use marketd_store::{AtomicStore, CanonicalKey, KeyEncoder, PrefixedStore, TypedStore};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemKey {
    pub owner: String,
    pub name: String,
}

impl ItemKey {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }
}

impl CanonicalKey for ItemKey {
    fn canonical_key(&self) -> String {
        KeyEncoder::new().field(&self.owner).field(&self.name).finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub tags: Vec<String>,
    pub count: u32,
}

impl Item {
    pub fn with_count(count: u32) -> Self {
        Self {
            tags: Vec::new(),
            count,
        }
    }
}

pub fn null_store() -> Arc<NullAtomicStore> {
    Arc::new(NullAtomicStore::new())
}

pub fn item_store(backend: &Arc<NullAtomicStore>, prefix: &str) -> TypedStore<ItemKey, Item> {
    let backend: Arc<dyn AtomicStore> = backend.clone();
    TypedStore::new(PrefixedStore::new(backend, prefix))
}
