mod support;

use std::thread;

use marketd_store::RetryPolicy;
use marketd_training::{PendingModelData, PendingModelKey, PendingModelStore, TrainingError};
use support::backend;

fn key() -> PendingModelKey {
    PendingModelKey::new("o1", "s1", "g1")
}

#[test]
fn add_pending_model_id_builds_a_deduplicated_list() {
    let (_null, shared) = backend();
    let store = PendingModelStore::new(shared);

    assert_eq!(store.get(&key()).unwrap(), None);

    store.add_pending_model_id(&key(), "modelA").unwrap();
    assert_eq!(store.get(&key()).unwrap().unwrap().model_ids, vec!["modelA"]);

    store.add_pending_model_id(&key(), "modelA").unwrap();
    assert_eq!(store.get(&key()).unwrap().unwrap().model_ids, vec!["modelA"]);

    store.add_pending_model_id(&key(), "modelB").unwrap();
    assert_eq!(
        store.get(&key()).unwrap().unwrap().model_ids,
        vec!["modelA", "modelB"]
    );
}

#[test]
fn adding_a_listed_id_writes_nothing() {
    let (null, shared) = backend();
    let store = PendingModelStore::new(shared);
    store.add_pending_model_id(&key(), "m1").unwrap();
    let writes = null.write_count();

    store.add_pending_model_id(&key(), "m1").unwrap();
    assert_eq!(null.write_count(), writes);
}

#[test]
fn remove_pending_model_id_keeps_the_rest_in_order() {
    let (null, shared) = backend();
    let store = PendingModelStore::new(shared);
    for id in ["a", "b", "c"] {
        store.add_pending_model_id(&key(), id).unwrap();
    }
    store.remove_pending_model_id(&key(), "b").unwrap();
    assert_eq!(store.get(&key()).unwrap().unwrap().model_ids, vec!["a", "c"]);

    let writes = null.write_count();
    store.remove_pending_model_id(&key(), "b").unwrap();
    assert_eq!(null.write_count(), writes);
}

#[test]
fn removing_from_a_missing_list_creates_nothing() {
    let (null, shared) = backend();
    let store = PendingModelStore::new(shared);
    store.remove_pending_model_id(&key(), "m1").unwrap();
    assert!(null.is_empty());
}

#[test]
fn concurrent_adds_keep_every_id_once() {
    let (_null, shared) = backend();
    let store = PendingModelStore::new(shared).with_retry_policy(RetryPolicy::unbounded());

    thread::scope(|s| {
        for n in 0..16 {
            let store = &store;
            s.spawn(move || {
                let id = format!("model-{n}");
                store.add_pending_model_id(&key(), &id).unwrap();
                store.add_pending_model_id(&key(), &id).unwrap();
            });
        }
    });

    let mut ids = store.get(&key()).unwrap().unwrap().model_ids;
    assert_eq!(ids.len(), 16);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
}

#[test]
fn lost_races_are_retried() {
    let (null, shared) = backend();
    let store = PendingModelStore::new(shared);
    null.lose_next_races(5);
    store.add_pending_model_id(&key(), "m1").unwrap();
    assert_eq!(store.get(&key()).unwrap().unwrap().model_ids, vec!["m1"]);
}

#[test]
fn exhausted_retries_are_reported() {
    let (null, shared) = backend();
    let store = PendingModelStore::new(shared).with_retry_policy(RetryPolicy::bounded(2));
    null.lose_next_races(2);
    let err = store.add_pending_model_id(&key(), "m1").unwrap_err();
    assert!(matches!(
        err,
        TrainingError::NotCommitted {
            operation: "add_pending_model_id",
            ..
        }
    ));
    assert_eq!(store.get(&key()).unwrap(), None);
}

#[test]
fn backend_failures_surface_as_store_errors() {
    let (null, shared) = backend();
    let store = PendingModelStore::new(shared);
    null.fail_next("get", "unreachable");
    let err = store.add_pending_model_id(&key(), "m1").unwrap_err();
    assert!(matches!(err, TrainingError::Store(ref e) if e.is_backend()));
}

#[test]
fn pass_through_operations() {
    let (_null, shared) = backend();
    let store = PendingModelStore::new(shared);
    let first = PendingModelData {
        model_ids: vec!["x".into()],
    };
    let second = PendingModelData {
        model_ids: vec!["x".into(), "y".into()],
    };

    assert!(store.put_if_absent(&key(), &first).unwrap());
    assert!(!store.put_if_absent(&key(), &second).unwrap());
    assert_eq!(store.get(&key()).unwrap(), Some(first.clone()));

    assert!(!store.compare_and_swap(&key(), &second, &first).unwrap());
    assert!(store.compare_and_swap(&key(), &first, &second).unwrap());
    assert_eq!(store.get(&key()).unwrap(), Some(second.clone()));

    store.put(&PendingModelKey::new("o2", "s1", "g1"), &first).unwrap();
    let mut all = store.get_all().unwrap();
    all.sort_by_key(|p| p.model_ids.len());
    assert_eq!(all, vec![first, second]);
}

#[test]
fn put_then_get_round_trips_the_list() {
    let (_null, shared) = backend();
    let store = PendingModelStore::new(shared);
    for data in [
        PendingModelData::default(),
        PendingModelData {
            model_ids: vec!["m2".into(), "m1".into(), "with|pipe".into()],
        },
    ] {
        store.put(&key(), &data).unwrap();
        assert_eq!(store.get(&key()).unwrap(), Some(data));
    }
}
