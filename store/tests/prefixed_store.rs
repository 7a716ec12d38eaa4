use std::sync::Arc;

use marketd_nullables::NullAtomicStore;
use marketd_store::{AtomicStore, PrefixedStore};

fn prefixed(backend: &Arc<NullAtomicStore>, prefix: &str) -> PrefixedStore {
    let backend: Arc<dyn AtomicStore> = backend.clone();
    PrefixedStore::new(backend, prefix)
}

#[test]
fn keys_are_written_under_the_prefix() {
    let backend = Arc::new(NullAtomicStore::new());
    let store = prefixed(&backend, "/model-user/modelStorage");
    store.put("{ID:a}", b"1").unwrap();
    assert_eq!(backend.keys(), vec!["/model-user/modelStorage/{ID:a}".to_string()]);
    assert_eq!(store.get("{ID:a}").unwrap(), Some(b"1".to_vec()));
}

#[test]
fn trailing_separator_in_prefix_is_ignored() {
    let backend = Arc::new(NullAtomicStore::new());
    let store = prefixed(&backend, "/ns/");
    store.put("k", b"1").unwrap();
    assert_eq!(store.prefix(), "/ns");
    assert_eq!(backend.keys(), vec!["/ns/k".to_string()]);
}

#[test]
fn enumeration_strips_the_prefix() {
    let backend = Arc::new(NullAtomicStore::new());
    let store = prefixed(&backend, "/ns");
    store.put("a", b"1").unwrap();
    store.put("b", b"2").unwrap();
    let all = store.get_by_prefix("").unwrap();
    assert_eq!(all.keys().cloned().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn sibling_prefixes_do_not_see_each_other() {
    let backend = Arc::new(NullAtomicStore::new());
    let models = prefixed(&backend, "/model-user/modelStorage");
    let longer = prefixed(&backend, "/model-user/modelStorageX");
    models.put("k", b"model").unwrap();
    longer.put("k", b"other").unwrap();

    assert_eq!(models.get("k").unwrap(), Some(b"model".to_vec()));
    assert_eq!(longer.get("k").unwrap(), Some(b"other".to_vec()));
    assert_eq!(models.get_by_prefix("").unwrap().len(), 1);
    assert_eq!(longer.get_by_prefix("").unwrap().len(), 1);
}

#[test]
fn conditional_writes_are_delegated() {
    let backend = Arc::new(NullAtomicStore::new());
    let store = prefixed(&backend, "/ns");
    assert!(store.put_if_absent("k", b"1").unwrap());
    assert!(!store.put_if_absent("k", b"2").unwrap());
    assert!(store.compare_and_swap("k", b"1", b"3").unwrap());
    assert_eq!(backend.get("/ns/k").unwrap(), Some(b"3".to_vec()));
    store.delete("k").unwrap();
    assert!(backend.is_empty());
}

#[test]
fn backend_errors_pass_through_with_the_full_key() {
    let backend = Arc::new(NullAtomicStore::new());
    let store = prefixed(&backend, "/ns");
    backend.fail_next("put", "disk full");
    let err = store.put("k", b"1").unwrap_err();
    assert!(err.is_backend());
    assert!(err.to_string().contains("/ns/k"));
}
