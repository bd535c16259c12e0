//! Verification engine: decides each attempt and appends it to the log.

use agegate_store::AttemptLogStore;
use agegate_types::{
    AttemptId, AttemptRecord, Candidate, Clock, NewAttempt, SystemClock, Timestamp,
};
use serde::{Deserialize, Serialize};

use crate::age::is_of_permissible_age;
use crate::error::VerificationError;
use crate::lockout::LockoutPolicy;
use crate::sort::{sort_records, SortDirection, SortField};

/// Full outcome of one recorded attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub id: AttemptId,
    pub submitted_at: Timestamp,
    /// Age eligibility, independent of lock-out.
    pub is_of_age: bool,
    pub is_locked_out: bool,
}

impl Verdict {
    /// Access is granted only to an eligible attempt that is not locked out.
    pub fn admitted(&self) -> bool {
        self.is_of_age && !self.is_locked_out
    }
}

/// Decides verification attempts against the attempt log.
///
/// Each evaluation is a read (failure count) followed by a write (insert).
/// The pair is not atomic: concurrent attempts for the same name/email may
/// each see a count below the threshold.
pub struct VerificationEngine<S, C = SystemClock> {
    store: S,
    clock: C,
    policy: LockoutPolicy,
}

impl<S: AttemptLogStore> VerificationEngine<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: AttemptLogStore, C: Clock> VerificationEngine<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            policy: LockoutPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LockoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> LockoutPolicy {
        self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Evaluate a candidate, record the attempt, and return whether access is granted.
    pub fn evaluate_and_record(&self, candidate: Candidate) -> Result<bool, VerificationError> {
        self.evaluate_and_record_detailed(candidate)
            .map(|verdict| verdict.admitted())
    }

    /// Like [`evaluate_and_record`](Self::evaluate_and_record) but returns
    /// the full verdict, including the identifier of the stored record.
    pub fn evaluate_and_record_detailed(
        &self,
        candidate: Candidate,
    ) -> Result<Verdict, VerificationError> {
        let submitted_at = self.clock.now();
        let is_of_age = is_of_permissible_age(candidate.date_of_birth, submitted_at.date());
        let is_locked_out = self.is_locked_out(&candidate, submitted_at)?;

        let attempt = NewAttempt::from_candidate(candidate, submitted_at, is_of_age, is_locked_out);
        let id = self.store.insert_attempt(&attempt).map_err(|e| {
            tracing::error!(
                error = %e,
                user_name = %attempt.user_name,
                "failed to record verification attempt"
            );
            VerificationError::from(e)
        })?;

        let verdict = Verdict {
            id,
            submitted_at,
            is_of_age,
            is_locked_out,
        };
        tracing::info!(
            id = %id,
            user_name = %attempt.user_name,
            is_of_age,
            is_locked_out,
            admitted = verdict.admitted(),
            "verification attempt recorded"
        );
        Ok(verdict)
    }

    fn is_locked_out(
        &self,
        candidate: &Candidate,
        now: Timestamp,
    ) -> Result<bool, VerificationError> {
        let query =
            self.policy
                .failure_query(&candidate.user_name, &candidate.email_address, now);
        let prior_failures = self.store.count_failed_attempts(&query).map_err(|e| {
            tracing::error!(error = %e, "failed to count recent failed attempts");
            VerificationError::from(e)
        })?;
        let locked = self.policy.is_locked_out(prior_failures);
        if locked {
            tracing::warn!(
                user_name = %candidate.user_name,
                prior_failures,
                window_secs = self.policy.window_secs,
                "attempt locked out after repeated failures"
            );
        }
        Ok(locked)
    }

    /// The whole history sorted by a caller-named field.
    ///
    /// `field` must name a record attribute (see [`SortField`]); it is
    /// validated before the log is read. `direction` is parsed leniently:
    /// only `"desc"` sorts descending.
    pub fn list_sorted(
        &self,
        field: &str,
        direction: &str,
    ) -> Result<Vec<AttemptRecord>, VerificationError> {
        let field: SortField = field.parse()?;
        self.list_sorted_by(field, SortDirection::parse_lenient(direction))
    }

    pub fn list_sorted_by(
        &self,
        field: SortField,
        direction: SortDirection,
    ) -> Result<Vec<AttemptRecord>, VerificationError> {
        let mut records = self.store.iter_attempts()?;
        sort_records(&mut records, field, direction);
        tracing::debug!(
            count = records.len(),
            field = %field,
            direction = direction.as_str(),
            "listed attempt history"
        );
        Ok(records)
    }

    /// Administrative lookup of a single record.
    pub fn find_attempt(&self, id: AttemptId) -> Result<Option<AttemptRecord>, VerificationError> {
        Ok(self.store.get_attempt(id)?)
    }

    /// Administrative removal of a record. Returns `false` if it did not exist.
    pub fn delete_attempt(&self, id: AttemptId) -> Result<bool, VerificationError> {
        let removed = self.store.delete_attempt(id)?;
        tracing::info!(id = %id, removed, "administrative delete");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agegate_nullables::{FailingAttemptStore, NullAttemptStore, NullClock};
    use agegate_store::StoreError;
    use chrono::NaiveDate;

    use crate::age::shift_years;
    use crate::seed::demo_attempts;

    /// 2024-06-15T12:00:00Z
    const NOW: u64 = 1_718_452_800;

    fn engine() -> VerificationEngine<NullAttemptStore, NullClock> {
        VerificationEngine::with_clock(NullAttemptStore::new(), NullClock::new(NOW))
    }

    fn seeded_engine() -> VerificationEngine<NullAttemptStore, NullClock> {
        let engine = engine();
        for attempt in demo_attempts(Timestamp::new(NOW)) {
            engine.store().insert_attempt(&attempt).unwrap();
        }
        engine
    }

    fn today() -> NaiveDate {
        Timestamp::new(NOW).date()
    }

    fn years_ago(years: i32) -> NaiveDate {
        shift_years(today(), -years).unwrap()
    }

    fn candidate(name: &str, dob: NaiveDate) -> Candidate {
        Candidate::new(name, format!("{name}@email.com"), dob)
    }

    fn failed_attempt(name: &str, at: Timestamp) -> NewAttempt {
        NewAttempt::from_candidate(candidate(name, years_ago(10)), at, false, false)
    }

    fn names(records: &[AttemptRecord]) -> Vec<&str> {
        records.iter().map(|r| r.user_name.as_str()).collect()
    }

    #[test]
    fn adult_is_admitted() {
        let engine = engine();
        assert!(engine.evaluate_and_record(candidate("test", years_ago(20))).unwrap());
    }

    #[test]
    fn minor_is_rejected() {
        let engine = engine();
        assert!(!engine.evaluate_and_record(candidate("test", years_ago(10))).unwrap());
    }

    #[test]
    fn eighteenth_birthday_today_is_admitted() {
        let engine = engine();
        assert!(engine.evaluate_and_record(candidate("a", years_ago(18))).unwrap());

        let one_day_short = years_ago(18).succ_opt().unwrap();
        assert!(!engine.evaluate_and_record(candidate("b", one_day_short)).unwrap());
    }

    #[test]
    fn attempt_is_stamped_and_persisted() {
        let engine = engine();
        let input = candidate("stamp", years_ago(30));
        let verdict = engine.evaluate_and_record_detailed(input.clone()).unwrap();
        assert_eq!(verdict.submitted_at, Timestamp::new(NOW));

        let stored = engine.find_attempt(verdict.id).unwrap().unwrap();
        assert_eq!(stored.user_name, input.user_name);
        assert_eq!(stored.email_address, input.email_address);
        assert_eq!(stored.date_of_birth, input.date_of_birth);
        assert_eq!(stored.submitted_at, Timestamp::new(NOW));
        assert!(stored.is_success);
        assert!(!stored.is_locked_out);
        assert_eq!(engine.find_attempt(verdict.id).unwrap().unwrap(), stored);
    }

    #[test]
    fn three_recent_failures_lock_out_an_adult() {
        let engine = engine();
        for minutes in [3, 2, 1] {
            let at = Timestamp::new(NOW - minutes * 60);
            engine
                .store()
                .insert_attempt(&failed_attempt("lockmeout", at))
                .unwrap();
        }

        let verdict = engine
            .evaluate_and_record_detailed(candidate("lockmeout", years_ago(20)))
            .unwrap();
        assert!(verdict.is_of_age);
        assert!(verdict.is_locked_out);
        assert!(!verdict.admitted());

        // The true age outcome is kept for audit.
        let stored = engine.find_attempt(verdict.id).unwrap().unwrap();
        assert!(stored.is_success);
        assert!(stored.is_locked_out);
    }

    #[test]
    fn fourth_consecutive_failure_is_the_first_locked_out() {
        let engine = engine();
        let mut locked = Vec::new();
        for _ in 0..4 {
            let verdict = engine
                .evaluate_and_record_detailed(candidate("kid", years_ago(12)))
                .unwrap();
            locked.push(verdict.is_locked_out);
            engine.clock().advance(60);
        }
        assert_eq!(locked, vec![false, false, false, true]);
    }

    #[test]
    fn two_recent_failures_do_not_lock_out() {
        let engine = engine();
        for minutes in [2, 1] {
            let at = Timestamp::new(NOW - minutes * 60);
            engine
                .store()
                .insert_attempt(&failed_attempt("almost", at))
                .unwrap();
        }
        assert!(engine.evaluate_and_record(candidate("almost", years_ago(40))).unwrap());
    }

    #[test]
    fn window_boundary_is_strict() {
        let engine = engine();
        let store = engine.store();
        // Two failures comfortably inside the window.
        store
            .insert_attempt(&failed_attempt("edge", Timestamp::new(NOW - 60)))
            .unwrap();
        store
            .insert_attempt(&failed_attempt("edge", Timestamp::new(NOW - 120)))
            .unwrap();
        // 61 minutes ago and exactly 60 minutes ago: outside.
        store
            .insert_attempt(&failed_attempt("edge", Timestamp::new(NOW - 61 * 60)))
            .unwrap();
        store
            .insert_attempt(&failed_attempt("edge", Timestamp::new(NOW - 60 * 60)))
            .unwrap();

        let verdict = engine
            .evaluate_and_record_detailed(candidate("edge", years_ago(25)))
            .unwrap();
        assert!(!verdict.is_locked_out);

        // 59 minutes ago: inside, makes three.
        engine
            .store()
            .insert_attempt(&failed_attempt("edge", Timestamp::new(NOW - 59 * 60)))
            .unwrap();
        let verdict = engine
            .evaluate_and_record_detailed(candidate("edge", years_ago(25)))
            .unwrap();
        assert!(verdict.is_locked_out);
    }

    #[test]
    fn lockout_expires_after_window() {
        let engine = engine();
        for _ in 0..3 {
            engine.evaluate_and_record(candidate("kid", years_ago(12))).unwrap();
        }
        assert!(!engine.evaluate_and_record(candidate("kid", years_ago(30))).unwrap());

        // The locked-out adult attempt counted as a success, so only the three
        // minor failures (all at NOW) need to leave the window.
        engine.clock().advance(60 * 60);
        assert!(engine.evaluate_and_record(candidate("kid", years_ago(30))).unwrap());
    }

    #[test]
    fn lockout_is_scoped_to_name_and_email_pair() {
        let engine = engine();
        for _ in 0..3 {
            engine.evaluate_and_record(candidate("kid", years_ago(12))).unwrap();
        }
        let other_email = Candidate::new("kid", "different@email.com", years_ago(30));
        assert!(engine.evaluate_and_record(other_email).unwrap());
        let other_name = Candidate::new("kid2", "kid@email.com", years_ago(30));
        assert!(engine.evaluate_and_record(other_name).unwrap());
    }

    #[test]
    fn custom_policy_is_honoured() {
        let engine = engine().with_policy(LockoutPolicy {
            max_failed_attempts: 1,
            window_secs: 60,
        });
        engine.evaluate_and_record(candidate("kid", years_ago(12))).unwrap();
        assert!(!engine.evaluate_and_record(candidate("kid", years_ago(30))).unwrap());
        engine.clock().advance(60);
        assert!(engine.evaluate_and_record(candidate("kid", years_ago(30))).unwrap());
    }

    #[test]
    fn list_sorted_returns_all_records() {
        let engine = seeded_engine();
        let records = engine.list_sorted("SubmittedDateTime", "desc").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            names(&records),
            vec!["seeded_user1", "seeded_user2", "seeded_user3"]
        );
    }

    #[test]
    fn list_sorted_on_user_name_descending() {
        let engine = seeded_engine();
        let records = engine.list_sorted("UserName", "desc").unwrap();
        assert_eq!(
            names(&records),
            vec!["seeded_user3", "seeded_user2", "seeded_user1"]
        );
    }

    #[test]
    fn list_sorted_on_email_ascending() {
        let engine = seeded_engine();
        let records = engine.list_sorted("EmailAddress", "asc").unwrap();
        assert_eq!(
            names(&records),
            vec!["seeded_user1", "seeded_user2", "seeded_user3"]
        );
    }

    #[test]
    fn unrecognised_direction_sorts_ascending() {
        let engine = seeded_engine();
        let records = engine.list_sorted("UserName", "Desc").unwrap();
        assert_eq!(
            names(&records),
            vec!["seeded_user1", "seeded_user2", "seeded_user3"]
        );
    }

    #[test]
    fn unknown_field_fails_without_reading_the_log() {
        let store = NullAttemptStore::new();
        let engine = VerificationEngine::with_clock(store, NullClock::new(NOW));
        let err = engine.list_sorted("NoSuchField", "asc").unwrap_err();
        assert!(matches!(err, VerificationError::InvalidField(ref f) if f == "NoSuchField"));
        assert_eq!(engine.store().scan_count(), 0);
    }

    #[test]
    fn storage_failure_on_insert_propagates() {
        let engine = VerificationEngine::with_clock(
            FailingAttemptStore::failing_writes(),
            NullClock::new(NOW),
        );
        let err = engine
            .evaluate_and_record(candidate("x", years_ago(30)))
            .unwrap_err();
        assert!(matches!(err, VerificationError::Storage(StoreError::Backend(_))));
    }

    #[test]
    fn storage_failure_on_lockout_count_propagates() {
        let engine =
            VerificationEngine::with_clock(FailingAttemptStore::failing_all(), NullClock::new(NOW));
        let err = engine
            .evaluate_and_record(candidate("x", years_ago(30)))
            .unwrap_err();
        assert!(matches!(err, VerificationError::Storage(_)));
        assert_eq!(engine.store().insert_calls(), 0);
    }

    #[test]
    fn storage_failure_on_list_propagates() {
        let engine =
            VerificationEngine::with_clock(FailingAttemptStore::failing_all(), NullClock::new(NOW));
        assert!(matches!(
            engine.list_sorted("UserName", "asc"),
            Err(VerificationError::Storage(_))
        ));
    }

    #[test]
    fn administrative_delete_passes_through() {
        let engine = seeded_engine();
        let first = engine.list_sorted("AttemptId", "asc").unwrap()[0].id;
        assert!(engine.delete_attempt(first).unwrap());
        assert_eq!(engine.find_attempt(first).unwrap(), None);
        assert!(!engine.delete_attempt(first).unwrap());
        assert_eq!(engine.list_sorted("AttemptId", "asc").unwrap().len(), 2);
    }
}
