//! Attempt log storage trait.

use std::sync::Arc;

use crate::StoreError;
use agegate_types::{AttemptId, AttemptRecord, NewAttempt, Timestamp};

/// Filter for counting recent failed attempts by the same person.
///
/// Matches records whose user name AND email address are equal to the query,
/// whose success flag is `false`, and whose submission time is strictly after
/// `submitted_after`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FailureQuery<'a> {
    pub user_name: &'a str,
    pub email_address: &'a str,
    pub submitted_after: Timestamp,
}

impl FailureQuery<'_> {
    /// Whether a stored record falls inside this filter.
    pub fn matches(&self, record: &AttemptRecord) -> bool {
        !record.is_success
            && record.user_name == self.user_name
            && record.email_address == self.email_address
            && record.submitted_at > self.submitted_after
    }
}

/// Append-only log of verification attempts.
///
/// Records are immutable once inserted: there is no update operation. Deletion
/// exists for administrative clean-up only and is never used when deciding an
/// attempt.
pub trait AttemptLogStore: Send + Sync {
    /// Persist an evaluated attempt and return its newly assigned identifier.
    ///
    /// Identifiers are unique across the store and never reused.
    fn insert_attempt(&self, attempt: &NewAttempt) -> Result<AttemptId, StoreError>;

    /// Every record in the log. Order is unspecified.
    fn iter_attempts(&self) -> Result<Vec<AttemptRecord>, StoreError>;

    /// Look up a single record.
    fn get_attempt(&self, id: AttemptId) -> Result<Option<AttemptRecord>, StoreError>;

    /// Count failed attempts matching `query` without materialising the log.
    fn count_failed_attempts(&self, query: &FailureQuery<'_>) -> Result<u64, StoreError>;

    /// Remove a record. Returns `false` if no record had that identifier.
    fn delete_attempt(&self, id: AttemptId) -> Result<bool, StoreError>;

    /// Number of records currently in the log.
    fn attempt_count(&self) -> Result<u64, StoreError> {
        self.iter_attempts().map(|v| v.len() as u64)
    }
}

impl<T: AttemptLogStore + ?Sized> AttemptLogStore for Arc<T> {
    fn insert_attempt(&self, attempt: &NewAttempt) -> Result<AttemptId, StoreError> {
        (**self).insert_attempt(attempt)
    }

    fn iter_attempts(&self) -> Result<Vec<AttemptRecord>, StoreError> {
        (**self).iter_attempts()
    }

    fn get_attempt(&self, id: AttemptId) -> Result<Option<AttemptRecord>, StoreError> {
        (**self).get_attempt(id)
    }

    fn count_failed_attempts(&self, query: &FailureQuery<'_>) -> Result<u64, StoreError> {
        (**self).count_failed_attempts(query)
    }

    fn delete_attempt(&self, id: AttemptId) -> Result<bool, StoreError> {
        (**self).delete_attempt(id)
    }

    fn attempt_count(&self) -> Result<u64, StoreError> {
        (**self).attempt_count()
    }
}
