#![allow(dead_code)]

use std::sync::Arc;

use marketd_nullables::NullAtomicStore;
use marketd_store::AtomicStore;
use marketd_training::{ModelData, ModelKey, Status};

pub fn backend() -> (Arc<NullAtomicStore>, Arc<dyn AtomicStore>) {
    let null = Arc::new(NullAtomicStore::new());
    let shared: Arc<dyn AtomicStore> = null.clone();
    (null, shared)
}

pub fn model_key(model_id: &str) -> ModelKey {
    ModelKey::new("o1", "s1", "g1", model_id)
}

pub fn model(model_id: &str, creator: &str) -> ModelData {
    ModelData {
        model_id: model_id.to_string(),
        model_name: format!("{model_id}-name"),
        organization_id: "o1".to_string(),
        service_id: "s1".to_string(),
        group_id: "g1".to_string(),
        created_by_address: creator.to_string(),
        updated_by_address: creator.to_string(),
        grpc_service_name: "ExampleService".to_string(),
        grpc_method_name: "/example.ExampleService/Train".to_string(),
        status: Status::Created,
        ..ModelData::default()
    }
}
