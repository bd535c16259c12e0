//! Nullable stores: thread-safe in-memory attempt logs for testing.

use agegate_store::{AttemptLogStore, FailureQuery, StoreError};
use agegate_types::{AttemptId, AttemptRecord, NewAttempt};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier, Mutex};

/// An in-memory attempt log for testing.
/// Thread-safe; identifiers start at 1 and are never reused.
pub struct NullAttemptStore {
    records: Mutex<BTreeMap<AttemptId, AttemptRecord>>,
    next_id: AtomicU64,
    scans: AtomicU64,
    count_barrier: Mutex<Option<Arc<Barrier>>>,
}

impl NullAttemptStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            scans: AtomicU64::new(0),
            count_barrier: Mutex::new(None),
        }
    }

    /// Number of full scans (`iter_attempts`) served so far.
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::SeqCst)
    }

    /// Make every `count_failed_attempts` call wait on `barrier` after it has
    /// computed its result. Lets tests line up concurrent callers between the
    /// count and the insert.
    pub fn pause_after_count(&self, barrier: Arc<Barrier>) {
        *self.count_barrier.lock().unwrap() = Some(barrier);
    }
}

impl Default for NullAttemptStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttemptLogStore for NullAttemptStore {
    fn insert_attempt(&self, attempt: &NewAttempt) -> Result<AttemptId, StoreError> {
        let id = AttemptId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.records
            .lock()
            .unwrap()
            .insert(id, attempt.clone().into_record(id));
        Ok(id)
    }

    fn iter_attempts(&self) -> Result<Vec<AttemptRecord>, StoreError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }

    fn get_attempt(&self, id: AttemptId) -> Result<Option<AttemptRecord>, StoreError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    fn count_failed_attempts(&self, query: &FailureQuery<'_>) -> Result<u64, StoreError> {
        let count = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| query.matches(r))
            .count() as u64;

        let barrier = self.count_barrier.lock().unwrap().clone();
        if let Some(barrier) = barrier {
            barrier.wait();
        }
        Ok(count)
    }

    fn delete_attempt(&self, id: AttemptId) -> Result<bool, StoreError> {
        Ok(self.records.lock().unwrap().remove(&id).is_some())
    }

    fn attempt_count(&self) -> Result<u64, StoreError> {
        Ok(self.records.lock().unwrap().len() as u64)
    }
}

/// A store whose backend is down.
///
/// Writes always fail. Reads either fail too ([`failing_all`](Self::failing_all))
/// or behave like an empty log ([`failing_writes`](Self::failing_writes)).
pub struct FailingAttemptStore {
    fail_reads: bool,
    inserts: AtomicU64,
}

impl FailingAttemptStore {
    pub fn failing_writes() -> Self {
        Self {
            fail_reads: false,
            inserts: AtomicU64::new(0),
        }
    }

    pub fn failing_all() -> Self {
        Self {
            fail_reads: true,
            inserts: AtomicU64::new(0),
        }
    }

    /// Number of insert attempts received.
    pub fn insert_calls(&self) -> u64 {
        self.inserts.load(Ordering::SeqCst)
    }

    fn read<T>(&self, empty: T) -> Result<T, StoreError> {
        if self.fail_reads {
            Err(StoreError::Backend("read failed: backend unavailable".to_string()))
        } else {
            Ok(empty)
        }
    }
}

impl AttemptLogStore for FailingAttemptStore {
    fn insert_attempt(&self, _attempt: &NewAttempt) -> Result<AttemptId, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Backend("write failed: backend unavailable".to_string()))
    }

    fn iter_attempts(&self) -> Result<Vec<AttemptRecord>, StoreError> {
        self.read(Vec::new())
    }

    fn get_attempt(&self, _id: AttemptId) -> Result<Option<AttemptRecord>, StoreError> {
        self.read(None)
    }

    fn count_failed_attempts(&self, _query: &FailureQuery<'_>) -> Result<u64, StoreError> {
        self.read(0)
    }

    fn delete_attempt(&self, _id: AttemptId) -> Result<bool, StoreError> {
        Err(StoreError::Backend("write failed: backend unavailable".to_string()))
    }
}
