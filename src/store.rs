//! Store
//!
//! The persistent store behind the submission pipeline, plus the
//! transactional scopes that make "enqueue into the monitored pool" and any
//! local bookkeeping a single all-or-nothing unit. Writes are staged inside
//! a scope and applied atomically on commit; a rollback discards them. Every
//! pipeline call releases its scope on every exit path.

use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::StoreError;

#[cfg(test)]
use mockall::automock;

/// A transactional scope over the persistent store.
///
/// Reads through a scope observe its own staged writes before the backing
/// store. A scope is single-use: once committed or rolled back, further
/// operations fail with [StoreError::Released].
#[cfg_attr(test, automock)]
pub trait StateScope: Send {
    /// Reads a key, staged writes shadowing the backing store.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    /// Stages a write into the scope.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    /// Atomically applies all staged writes and releases the scope.
    fn commit(&mut self) -> Result<(), StoreError>;
    /// Discards all staged writes and releases the scope.
    fn rollback(&mut self) -> Result<(), StoreError>;
}

/// Persistent Store
///
/// The seam the pipeline begins its transactional scopes from.
#[cfg_attr(test, automock)]
pub trait Database: Send + Sync {
    /// Opens a new transactional scope.
    fn begin(&self) -> Result<Box<dyn StateScope>, StoreError>;
}

/// [Database] over a sled tree.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Opens (or creates) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::Open(e.to_string()))?;
        Ok(Self { db })
    }

    /// Returns a handle to the underlying tree.
    ///
    /// Direct reads outside a scope are only for subsystems that own their
    /// records, such as the monitored pool publisher.
    pub fn handle(&self) -> sled::Db {
        self.db.clone()
    }
}

impl Database for SledStore {
    fn begin(&self) -> Result<Box<dyn StateScope>, StoreError> {
        Ok(Box::new(SledScope {
            db: self.db.clone(),
            staged: BTreeMap::new(),
            released: false,
        }))
    }
}

/// A [StateScope] staging writes against a sled tree.
#[derive(Debug)]
struct SledScope {
    db: sled::Db,
    staged: BTreeMap<Vec<u8>, Vec<u8>>,
    released: bool,
}

impl StateScope for SledScope {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if self.released {
            return Err(StoreError::Released);
        }
        if let Some(value) = self.staged.get(key) {
            return Ok(Some(value.clone()));
        }
        Ok(self.db.get(key)?.map(|ivec| ivec.to_vec()))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        if self.released {
            return Err(StoreError::Released);
        }
        self.staged.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.released {
            return Err(StoreError::Released);
        }
        self.released = true;
        let mut batch = sled::Batch::default();
        for (key, value) in std::mem::take(&mut self.staged) {
            batch.insert(key, value);
        }
        self.db
            .apply_batch(batch)
            .map_err(|e| StoreError::Commit(e.to_string()))?;
        self.db
            .flush()
            .map_err(|e| StoreError::Commit(e.to_string()))?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if self.released {
            return Err(StoreError::Released);
        }
        self.released = true;
        self.staged.clear();
        Ok(())
    }
}
