//! LMDB implementation of MetaStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use agegate_store::meta::MetaStore;
use agegate_store::StoreError;

use crate::LmdbError;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Next identifier to hand out; advanced inside the insert transaction.
pub(crate) const NEXT_ATTEMPT_ID_KEY: &[u8] = b"next_attempt_id";

pub struct LmdbMetaStore {
    pub(crate) env: Arc<Env>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

/// Read the id counter within an open transaction; ids start at 1.
pub(crate) fn read_next_attempt_id(
    meta_db: &Database<Bytes, Bytes>,
    txn: &RoTxn,
) -> Result<u64, LmdbError> {
    match meta_db.get(txn, NEXT_ATTEMPT_ID_KEY)? {
        Some(bytes) => {
            let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                LmdbError::Corruption("next_attempt_id has unexpected byte length".to_string())
            })?;
            Ok(u64::from_be_bytes(arr))
        }
        None => Ok(1),
    }
}

impl MetaStore for LmdbMetaStore {
    fn get_schema_version(&self) -> Result<u32, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, SCHEMA_VERSION_KEY)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Corruption("schema_version has unexpected byte length".to_string())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        let bytes = version.to_le_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_env() -> (tempfile::TempDir, crate::LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = crate::LmdbEnvironment::open(dir.path(), 8, 1 << 20).unwrap();
        (dir, env)
    }

    #[test]
    fn fresh_environment_is_at_current_schema() {
        let (_dir, env) = open_test_env();
        assert_eq!(
            env.meta_store().get_schema_version().unwrap(),
            crate::migration::CURRENT_SCHEMA_VERSION
        );
    }

    #[test]
    fn malformed_schema_version_is_corruption() {
        let (_dir, env) = open_test_env();
        let meta = env.meta_store();
        let mut wtxn = meta.env.write_txn().unwrap();
        meta.meta_db.put(&mut wtxn, SCHEMA_VERSION_KEY, &[1u8, 2]).unwrap();
        wtxn.commit().unwrap();
        assert!(matches!(
            meta.get_schema_version(),
            Err(StoreError::Corruption(_))
        ));
    }
}
