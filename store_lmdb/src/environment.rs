//! LMDB environment setup.

use std::path::Path;

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};

use crate::migration::Migrator;
use crate::{LmdbAtomicStore, LmdbError};

const ATOMIC_DB: &str = "atomic";
const META_DB: &str = "meta";
const MAX_DBS: u32 = 2;

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1024 * 1024 * 1024;

/// Wraps the LMDB environment and its database handles.
#[derive(Clone)]
pub struct LmdbEnvironment {
    env: Env,
    atomic_db: Database<Str, Bytes>,
    meta_db: Database<Str, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at `path` and bring its schema up
    /// to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per path by this process and
        // its memory map is never truncated behind heed's back.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let atomic_db = env.create_database(&mut wtxn, Some(ATOMIC_DB))?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        let environment = Self {
            env,
            atomic_db,
            meta_db,
        };
        Migrator::run(&environment)?;
        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(environment)
    }

    /// An [`AtomicStore`](marketd_store::AtomicStore) over this environment.
    pub fn atomic_store(&self) -> LmdbAtomicStore {
        LmdbAtomicStore {
            env: self.env.clone(),
            db: self.atomic_db,
        }
    }

    pub(crate) fn env(&self) -> &Env {
        &self.env
    }

    pub(crate) fn meta_db(&self) -> Database<Str, Bytes> {
        self.meta_db
    }
}
