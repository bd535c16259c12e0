//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::attempt_log::LmdbAttemptLogStore;
use crate::meta::LmdbMetaStore;
use crate::migration::Migrator;
use crate::LmdbError;

/// Default LMDB map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Number of named databases the environment needs (with headroom).
pub const DEFAULT_MAX_DBS: u32 = 8;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub(crate) attempts_db: Database<Bytes, Bytes>,
    pub(crate) attempt_failures_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// Creates the directory and all databases if missing, then brings the
    /// schema up to date.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per path by this process and
        // the memory map is never modified outside of heed transactions.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let attempts_db = env.create_database(&mut wtxn, Some("attempts"))?;
        let attempt_failures_db = env.create_database(&mut wtxn, Some("attempt_failures"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let environment = Self {
            env: Arc::new(env),
            attempts_db,
            attempt_failures_db,
            meta_db,
        };

        Migrator::run(&environment.meta_store())?;

        tracing::info!(path = %path.display(), map_size, "opened attempt log environment");
        Ok(environment)
    }

    pub(crate) fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// The attempt log backed by this environment.
    pub fn attempt_log_store(&self) -> LmdbAttemptLogStore {
        LmdbAttemptLogStore {
            env: Arc::clone(&self.env),
            attempts_db: self.attempts_db,
            attempt_failures_db: self.attempt_failures_db,
            meta_db: self.meta_db,
        }
    }

    /// Metadata (schema version, id counter) for this environment.
    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
        }
    }
}
