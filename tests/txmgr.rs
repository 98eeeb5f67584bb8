use concord::errors::TxManagerError;
use concord::store::{Database, SledStore};
use concord::txmgr::{MonitoredStatus, SledTxManager, TxManager, TxRequest};
use ethers_core::types::{Address, Bytes, U256};

const OWNER: &str = "interop";
const ID: &str = "0x01";

fn request() -> TxRequest {
    TxRequest {
        from: Address::repeat_byte(0xad),
        to: Address::repeat_byte(0xde),
        value: U256::zero(),
        data: Bytes::from(vec![1, 2]),
        gas_offset: 80_000,
    }
}

fn pool() -> (SledStore, SledTxManager, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = SledStore::open(dir.path()).unwrap();
    let pool = SledTxManager::new(store.handle());
    (store, pool, dir)
}

#[test]
fn added_records_enter_the_pool_as_created() {
    let (store, pool, _dir) = pool();

    let mut scope = store.begin().unwrap();
    pool.add(OWNER, ID, request(), scope.as_mut()).unwrap();
    // visible through the open scope before commit
    let staged = pool.result(OWNER, ID, scope.as_ref()).unwrap();
    assert_eq!(staged.status, MonitoredStatus::Created);
    scope.commit().unwrap();

    let scope = store.begin().unwrap();
    let result = pool.result(OWNER, ID, scope.as_ref()).unwrap();
    assert_eq!(result.id, ID);
    assert_eq!(result.status, MonitoredStatus::Created);
    assert_eq!(result.sent_tx_hash, None);
}

#[test]
fn rolled_back_records_never_land() {
    let (store, pool, _dir) = pool();

    let mut scope = store.begin().unwrap();
    pool.add(OWNER, ID, request(), scope.as_mut()).unwrap();
    scope.rollback().unwrap();

    let scope = store.begin().unwrap();
    assert!(matches!(
        pool.result(OWNER, ID, scope.as_ref()),
        Err(TxManagerError::NotFound(_))
    ));
}

#[test]
fn duplicate_identifiers_are_rejected() {
    let (store, pool, _dir) = pool();

    // within one scope
    let mut scope = store.begin().unwrap();
    pool.add(OWNER, ID, request(), scope.as_mut()).unwrap();
    assert!(matches!(
        pool.add(OWNER, ID, request(), scope.as_mut()),
        Err(TxManagerError::AlreadyExists(_))
    ));
    scope.commit().unwrap();

    // and across committed scopes
    let mut scope = store.begin().unwrap();
    assert!(matches!(
        pool.add(OWNER, ID, request(), scope.as_mut()),
        Err(TxManagerError::AlreadyExists(_))
    ));
}

#[test]
fn owners_partition_the_pool() {
    let (store, pool, _dir) = pool();

    let mut scope = store.begin().unwrap();
    pool.add(OWNER, ID, request(), scope.as_mut()).unwrap();
    pool.add("other", ID, request(), scope.as_mut()).unwrap();
    scope.commit().unwrap();

    assert_eq!(pool.pending(OWNER).unwrap().len(), 1);
    assert_eq!(pool.pending("other").unwrap().len(), 1);
    assert_eq!(pool.pending(OWNER).unwrap()[0].owner, OWNER);
}

#[test]
fn pending_skips_terminal_records() {
    let (store, pool, _dir) = pool();

    let mut scope = store.begin().unwrap();
    pool.add(OWNER, "0x01", request(), scope.as_mut()).unwrap();
    pool.add(OWNER, "0x02", request(), scope.as_mut()).unwrap();
    scope.commit().unwrap();
    assert_eq!(pool.pending(OWNER).unwrap().len(), 2);

    let mut record = pool.pending(OWNER).unwrap().remove(0);
    record.status = MonitoredStatus::Confirmed;
    pool.update(&record).unwrap();

    let pending = pool.pending(OWNER).unwrap();
    assert_eq!(pending.len(), 1);
    assert_ne!(pending[0].id, record.id);
}
