//! LMDB implementation of AttemptLogStore.
//!
//! Records live in `attempts_db` keyed by big-endian id. Failed attempts are
//! additionally indexed in `attempt_failures_db` (see [`crate::keys`]) so the
//! lock-out count is a single prefix range-scan rather than a table scan.
//! Each index hit is confirmed against the stored record before it counts.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use agegate_store::attempt_log::{AttemptLogStore, FailureQuery};
use agegate_store::StoreError;
use agegate_types::{AttemptId, AttemptRecord, NewAttempt};

use crate::keys::{
    decode_attempt_key, decode_failure_suffix, failure_key, failure_prefix, increment_prefix,
};
use crate::meta::{read_next_attempt_id, NEXT_ATTEMPT_ID_KEY};
use crate::LmdbError;

pub struct LmdbAttemptLogStore {
    pub(crate) env: Arc<Env>,
    pub(crate) attempts_db: Database<Bytes, Bytes>,
    pub(crate) attempt_failures_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

fn decode_record(key: &[u8], val: &[u8]) -> Result<AttemptRecord, LmdbError> {
    let record: AttemptRecord = bincode::deserialize(val)?;
    match decode_attempt_key(key) {
        Some(id) if id == record.id => Ok(record),
        _ => Err(LmdbError::Corruption(format!(
            "attempt key does not match record id {}",
            record.id
        ))),
    }
}

impl AttemptLogStore for LmdbAttemptLogStore {
    fn insert_attempt(&self, attempt: &NewAttempt) -> Result<AttemptId, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let next = read_next_attempt_id(&self.meta_db, &wtxn)?;
        let id = AttemptId::new(next);
        let record = attempt.clone().into_record(id);
        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;

        self.attempts_db
            .put(&mut wtxn, &id.to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;

        if !record.is_success {
            let key = failure_key(
                &record.user_name,
                &record.email_address,
                record.submitted_at,
                id,
            );
            self.attempt_failures_db
                .put(&mut wtxn, &key, &[])
                .map_err(LmdbError::from)?;
        }

        let following = next.checked_add(1).ok_or_else(|| {
            LmdbError::Corruption("attempt id counter exhausted".to_string())
        })?;
        self.meta_db
            .put(&mut wtxn, NEXT_ATTEMPT_ID_KEY, &following.to_be_bytes())
            .map_err(LmdbError::from)?;

        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(id = %id, is_success = record.is_success, "attempt persisted");
        Ok(id)
    }

    fn iter_attempts(&self) -> Result<Vec<AttemptRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.attempts_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for result in iter {
            let (key, val) = result.map_err(LmdbError::from)?;
            results.push(decode_record(key, val)?);
        }
        Ok(results)
    }

    fn get_attempt(&self, id: AttemptId) -> Result<Option<AttemptRecord>, StoreError> {
        let key = id.to_be_bytes();
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .attempts_db
            .get(&rtxn, &key)
            .map_err(LmdbError::from)?
        {
            Some(val) => Ok(Some(decode_record(&key, val)?)),
            None => Ok(None),
        }
    }

    fn count_failed_attempts(&self, query: &FailureQuery<'_>) -> Result<u64, StoreError> {
        // Keys at exactly `submitted_after` sort below `prefix ++ after ++ MAX_ID`
        // or equal it, so an excluded lower bound gives the strict `>`.
        let prefix = failure_prefix(query.user_name, query.email_address);
        let mut lower = prefix.clone();
        lower.extend_from_slice(&query.submitted_after.as_secs().to_be_bytes());
        lower.extend_from_slice(&u64::MAX.to_be_bytes());

        let mut upper = prefix;
        increment_prefix(&mut upper);
        let upper_bound = if upper.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(upper.as_slice())
        };

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bounds = (Bound::Excluded(lower.as_slice()), upper_bound);
        let iter = self
            .attempt_failures_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut count = 0u64;
        for result in iter {
            let (key, _) = result.map_err(LmdbError::from)?;
            let Some((_, id)) = decode_failure_suffix(key) else {
                return Err(LmdbError::Corruption("malformed failure index key".to_string()).into());
            };
            let attempt_key = id.to_be_bytes();
            let val = self
                .attempts_db
                .get(&rtxn, &attempt_key)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    LmdbError::Corruption(format!("failure index points at missing attempt {id}"))
                })?;
            let record = decode_record(&attempt_key, val)?;
            // Digest collisions are filtered out here.
            if query.matches(&record) {
                count += 1;
            }
        }
        Ok(count)
    }

    fn delete_attempt(&self, id: AttemptId) -> Result<bool, StoreError> {
        let key = id.to_be_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let record = match self
            .attempts_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
        {
            Some(val) => decode_record(&key, val)?,
            None => return Ok(false),
        };

        self.attempts_db
            .delete(&mut wtxn, &key)
            .map_err(LmdbError::from)?;
        if !record.is_success {
            let index_key = failure_key(
                &record.user_name,
                &record.email_address,
                record.submitted_at,
                id,
            );
            self.attempt_failures_db
                .delete(&mut wtxn, &index_key)
                .map_err(LmdbError::from)?;
        }

        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(id = %id, "attempt deleted");
        Ok(true)
    }

    fn attempt_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.attempts_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
