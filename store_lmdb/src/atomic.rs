//! LMDB implementation of AtomicStore.
//!
//! LMDB admits a single write transaction at a time (across processes
//! sharing the environment), so a read-compare-write inside one write
//! transaction is atomic per key.

use std::collections::BTreeMap;

use heed::types::{Bytes, Str};
use heed::{Database, Env};

use marketd_store::{AtomicStore, StoreError};

#[derive(Clone)]
pub struct LmdbAtomicStore {
    pub(crate) env: Env,
    pub(crate) db: Database<Str, Bytes>,
}

impl AtomicStore for LmdbAtomicStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let err = |e: heed::Error| StoreError::backend("get", key, e);
        let rtxn = self.env.read_txn().map_err(err)?;
        let value = self.db.get(&rtxn, key).map_err(err)?;
        Ok(value.map(<[u8]>::to_vec))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let err = |e: heed::Error| StoreError::backend("put", key, e);
        let mut wtxn = self.env.write_txn().map_err(err)?;
        self.db.put(&mut wtxn, key, value).map_err(err)?;
        wtxn.commit().map_err(err)?;
        Ok(())
    }

    fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        let err = |e: heed::Error| StoreError::backend("put_if_absent", key, e);
        let mut wtxn = self.env.write_txn().map_err(err)?;
        if self.db.get(&wtxn, key).map_err(err)?.is_some() {
            return Ok(false);
        }
        self.db.put(&mut wtxn, key, value).map_err(err)?;
        wtxn.commit().map_err(err)?;
        Ok(true)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: &[u8],
    ) -> Result<bool, StoreError> {
        let err = |e: heed::Error| StoreError::backend("compare_and_swap", key, e);
        let mut wtxn = self.env.write_txn().map_err(err)?;
        let matches = self.db.get(&wtxn, key).map_err(err)? == Some(expected);
        if !matches {
            return Ok(false);
        }
        self.db.put(&mut wtxn, key, new).map_err(err)?;
        wtxn.commit().map_err(err)?;
        Ok(true)
    }

    fn get_by_prefix(&self, prefix: &str) -> Result<BTreeMap<String, Vec<u8>>, StoreError> {
        let err = |e: heed::Error| StoreError::backend("get_by_prefix", prefix, e);
        let rtxn = self.env.read_txn().map_err(err)?;
        let mut entries = BTreeMap::new();
        for result in self.db.prefix_iter(&rtxn, prefix).map_err(err)? {
            let (key, value) = result.map_err(err)?;
            entries.insert(key.to_string(), value.to_vec());
        }
        Ok(entries)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let err = |e: heed::Error| StoreError::backend("delete", key, e);
        let mut wtxn = self.env.write_txn().map_err(err)?;
        self.db.delete(&mut wtxn, key).map_err(err)?;
        wtxn.commit().map_err(err)?;
        Ok(())
    }
}
