mod support;

use std::sync::Arc;
use std::thread;

use marketd_store::{AtomicStore, BincodeCodec, JsonCodec, PrefixedStore, TypedStore, ValueCodec};
use support::{item_store, null_store, Item, ItemKey};

#[test]
fn get_on_empty_store_is_not_found() {
    let backend = null_store();
    let store = item_store(&backend, "/items");
    assert_eq!(store.get(&ItemKey::new("o", "n")).unwrap(), None);
}

#[test]
fn put_then_get_round_trips() {
    let backend = null_store();
    let store = item_store(&backend, "/items");
    let key = ItemKey::new("o", "n");
    let item = Item {
        tags: vec!["a".into(), "b".into()],
        count: 7,
    };
    store.put(&key, &item).unwrap();
    assert_eq!(store.get(&key).unwrap(), Some(item));
}

#[test]
fn keys_are_canonical_under_the_prefix() {
    let backend = null_store();
    let store = item_store(&backend, "/items");
    store.put(&ItemKey::new("o|x", "n"), &Item::default()).unwrap();
    assert_eq!(backend.keys(), vec![r"/items/{ID:o\|x|n}".to_string()]);
}

#[test]
fn put_if_absent_keeps_the_first_value() {
    let backend = null_store();
    let store = item_store(&backend, "/items");
    let key = ItemKey::new("o", "n");
    assert!(store.put_if_absent(&key, &Item::with_count(1)).unwrap());
    assert!(!store.put_if_absent(&key, &Item::with_count(2)).unwrap());
    assert_eq!(store.get(&key).unwrap(), Some(Item::with_count(1)));
}

#[test]
fn compare_and_swap_requires_the_expected_value() {
    let backend = null_store();
    let store = item_store(&backend, "/items");
    let key = ItemKey::new("o", "n");
    store.put(&key, &Item::with_count(1)).unwrap();

    assert!(!store
        .compare_and_swap(&key, &Item::with_count(9), &Item::with_count(2))
        .unwrap());
    assert!(store
        .compare_and_swap(&key, &Item::with_count(1), &Item::with_count(2))
        .unwrap());
    assert_eq!(store.get(&key).unwrap(), Some(Item::with_count(2)));
}

#[test]
fn racing_swaps_from_the_same_value_have_one_winner() {
    let backend = null_store();
    let store = item_store(&backend, "/items");
    let key = ItemKey::new("o", "n");
    store.put(&key, &Item::with_count(0)).unwrap();

    let wins: usize = thread::scope(|s| {
        let handles: Vec<_> = (1..=8)
            .map(|n| {
                let store = &store;
                let key = &key;
                s.spawn(move || {
                    store
                        .compare_and_swap(key, &Item::with_count(0), &Item::with_count(n))
                        .unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum()
    });
    assert_eq!(wins, 1);
}

#[test]
fn get_all_returns_only_this_namespace() {
    let backend = null_store();
    let items = item_store(&backend, "/items");
    let others = item_store(&backend, "/others");
    items.put(&ItemKey::new("o", "1"), &Item::with_count(1)).unwrap();
    items.put(&ItemKey::new("o", "2"), &Item::with_count(2)).unwrap();
    others.put(&ItemKey::new("o", "1"), &Item::with_count(3)).unwrap();

    let mut counts: Vec<u32> = items.get_all().unwrap().iter().map(|i| i.count).collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2]);
}

#[test]
fn get_all_still_returns_records_under_non_canonical_keys() {
    let backend = null_store();
    let items = item_store(&backend, "/items");
    items.put(&ItemKey::new("o", "1"), &Item::with_count(1)).unwrap();
    let raw = ValueCodec::<Item>::encode(&BincodeCodec, &Item::with_count(2)).unwrap();
    backend.put("/items/stray", &raw).unwrap();

    let mut counts: Vec<u32> = items.get_all().unwrap().iter().map(|i| i.count).collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2]);
}

#[test]
fn same_fields_in_another_namespace_are_invisible() {
    let backend = null_store();
    let items = item_store(&backend, "/items");
    let others = item_store(&backend, "/others");
    let key = ItemKey::new("o", "n");
    items.put(&key, &Item::with_count(1)).unwrap();
    assert_eq!(others.get(&key).unwrap(), None);
}

#[test]
fn malformed_payload_is_a_serialization_error() {
    let backend = null_store();
    let store = item_store(&backend, "/items");
    backend.put("/items/{ID:o|n}", &[0xff]).unwrap();
    let err = store.get(&ItemKey::new("o", "n")).unwrap_err();
    assert!(err.is_serialization());
    assert!(err.to_string().contains("Item"));

    let err = store.get_all().unwrap_err();
    assert!(err.is_serialization());
}

#[test]
fn backend_errors_are_propagated() {
    let backend = null_store();
    let store = item_store(&backend, "/items");
    backend.fail_next("get", "connection reset");
    let err = store.get(&ItemKey::new("o", "n")).unwrap_err();
    assert!(err.is_backend());
    assert!(err.to_string().contains("connection reset"));
}

#[test]
fn json_codec_stores_readable_payloads() {
    let backend = null_store();
    let dyn_backend: Arc<dyn AtomicStore> = backend.clone();
    let store: TypedStore<ItemKey, Item, JsonCodec> =
        TypedStore::with_codec(PrefixedStore::new(dyn_backend, "/json"), JsonCodec);
    let key = ItemKey::new("o", "n");
    store.put(&key, &Item::with_count(4)).unwrap();

    let raw = backend.get("/json/{ID:o|n}").unwrap().unwrap();
    assert_eq!(String::from_utf8(raw).unwrap(), r#"{"tags":[],"count":4}"#);
    assert_eq!(store.get(&key).unwrap(), Some(Item::with_count(4)));
}

#[test]
fn delete_removes_the_record() {
    let backend = null_store();
    let store = item_store(&backend, "/items");
    let key = ItemKey::new("o", "n");
    store.put(&key, &Item::default()).unwrap();
    store.delete(&key).unwrap();
    assert_eq!(store.get(&key).unwrap(), None);
}
