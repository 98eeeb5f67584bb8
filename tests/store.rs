use concord::errors::StoreError;
use concord::store::{Database, SledStore};

#[test]
fn staged_writes_are_invisible_until_commit() {
    let dir = tempfile::tempdir().unwrap();
    let store = SledStore::open(dir.path()).unwrap();

    let mut writer = store.begin().unwrap();
    writer.put(b"k", b"v").unwrap();

    let reader = store.begin().unwrap();
    assert_eq!(reader.get(b"k").unwrap(), None);

    writer.commit().unwrap();

    let reader = store.begin().unwrap();
    assert_eq!(reader.get(b"k").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn scope_reads_shadow_the_backing_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SledStore::open(dir.path()).unwrap();

    let mut seed = store.begin().unwrap();
    seed.put(b"k", b"old").unwrap();
    seed.commit().unwrap();

    let mut scope = store.begin().unwrap();
    scope.put(b"k", b"new").unwrap();
    assert_eq!(scope.get(b"k").unwrap(), Some(b"new".to_vec()));
    scope.rollback().unwrap();

    let reader = store.begin().unwrap();
    assert_eq!(reader.get(b"k").unwrap(), Some(b"old".to_vec()));
}

#[test]
fn rollback_discards_staged_writes() {
    let dir = tempfile::tempdir().unwrap();
    let store = SledStore::open(dir.path()).unwrap();

    let mut scope = store.begin().unwrap();
    scope.put(b"k", b"v").unwrap();
    scope.rollback().unwrap();

    let reader = store.begin().unwrap();
    assert_eq!(reader.get(b"k").unwrap(), None);
}

#[test]
fn released_scope_rejects_further_use() {
    let dir = tempfile::tempdir().unwrap();
    let store = SledStore::open(dir.path()).unwrap();

    let mut scope = store.begin().unwrap();
    scope.commit().unwrap();

    assert!(matches!(scope.put(b"k", b"v"), Err(StoreError::Released)));
    assert!(matches!(scope.get(b"k"), Err(StoreError::Released)));
    assert!(matches!(scope.commit(), Err(StoreError::Released)));
    assert!(matches!(scope.rollback(), Err(StoreError::Released)));
}
