//! End-to-end: verification engine over the LMDB attempt log.

use agegate_nullables::NullClock;
use agegate_store_lmdb::{check_integrity, LmdbAttemptLogStore, LmdbEnvironment};
use agegate_types::{Candidate, Timestamp};
use agegate_verification::{seed_if_empty, VerificationEngine, VerificationError};
use chrono::NaiveDate;

/// 2024-06-15T12:00:00Z
const NOW: u64 = 1_718_452_800;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
    let dir = tempfile::tempdir().expect("temp dir");
    let env = LmdbEnvironment::open(dir.path(), 8, 16 * 1024 * 1024).expect("open env");
    (dir, env)
}

fn engine_at(env: &LmdbEnvironment, now: u64) -> VerificationEngine<LmdbAttemptLogStore, NullClock> {
    VerificationEngine::with_clock(env.attempt_log_store(), NullClock::new(now))
}

fn candidate(name: &str, born: (i32, u32, u32)) -> Candidate {
    let dob = NaiveDate::from_ymd_opt(born.0, born.1, born.2).unwrap();
    Candidate::new(name, format!("{name}@email.com"), dob)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn round_trip_through_lmdb() {
    let (_dir, env) = temp_env();
    let engine = engine_at(&env, NOW);

    let input = candidate("roundtrip", (1990, 1, 1));
    let verdict = engine.evaluate_and_record_detailed(input.clone()).unwrap();
    assert!(verdict.admitted());

    let stored = engine.find_attempt(verdict.id).unwrap().expect("stored");
    assert_eq!(stored.user_name, input.user_name);
    assert_eq!(stored.email_address, input.email_address);
    assert_eq!(stored.date_of_birth, input.date_of_birth);
    assert_eq!(stored.submitted_at, Timestamp::new(NOW));
    assert_eq!((stored.is_success, stored.is_locked_out), (true, false));
}

#[test]
fn lockout_uses_the_failure_index() {
    let (_dir, env) = temp_env();
    let engine = engine_at(&env, NOW);

    for _ in 0..3 {
        assert!(!engine.evaluate_and_record(candidate("kid", (2012, 1, 1))).unwrap());
        engine.clock().advance(60);
    }
    let verdict = engine
        .evaluate_and_record_detailed(candidate("kid", (1990, 1, 1)))
        .unwrap();
    assert!(verdict.is_of_age);
    assert!(verdict.is_locked_out);

    // At 61 minutes only the third failure is still inside the window.
    engine.clock().set(NOW + 61 * 60);
    assert!(engine.evaluate_and_record(candidate("kid", (1990, 1, 1))).unwrap());

    assert!(check_integrity(&env).unwrap().is_healthy());
}

#[test]
fn seeded_log_sorts_like_the_listing_page() {
    let (_dir, env) = temp_env();
    let engine = engine_at(&env, NOW);
    assert_eq!(seed_if_empty(engine.store(), Timestamp::new(NOW)).unwrap(), 3);
    assert_eq!(seed_if_empty(engine.store(), Timestamp::new(NOW)).unwrap(), 0);

    let by_name: Vec<String> = engine
        .list_sorted("UserName", "desc")
        .unwrap()
        .into_iter()
        .map(|r| r.user_name)
        .collect();
    assert_eq!(by_name, vec!["seeded_user3", "seeded_user2", "seeded_user1"]);

    let by_email: Vec<String> = engine
        .list_sorted("EmailAddress", "asc")
        .unwrap()
        .into_iter()
        .map(|r| r.user_name)
        .collect();
    assert_eq!(by_email, vec!["seeded_user1", "seeded_user2", "seeded_user3"]);

    let by_id: Vec<u64> = engine
        .list_sorted("AccessLogId", "desc")
        .unwrap()
        .into_iter()
        .map(|r| r.id.as_u64())
        .collect();
    assert_eq!(by_id, vec![3, 2, 1]);

    assert!(matches!(
        engine.list_sorted("NoSuchField", "asc"),
        Err(VerificationError::InvalidField(_))
    ));
}

#[test]
fn long_identities_accrue_lockout() {
    let (_dir, env) = temp_env();
    let engine = engine_at(&env, NOW);
    let dob = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap();
    let name = "x".repeat(250);
    let email = format!("{}@email.com", "y".repeat(250));

    for _ in 0..3 {
        let verdict = engine
            .evaluate_and_record_detailed(Candidate::new(name.clone(), email.clone(), dob))
            .unwrap();
        assert!(!verdict.is_locked_out);
        engine.clock().advance(60);
    }
    let verdict = engine
        .evaluate_and_record_detailed(Candidate::new(name, email, dob))
        .unwrap();
    assert!(verdict.is_locked_out);
}

#[test]
fn history_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let id = {
        let env = LmdbEnvironment::open(dir.path(), 8, 16 * 1024 * 1024).unwrap();
        let engine = engine_at(&env, NOW);
        engine
            .evaluate_and_record_detailed(candidate("durable", (2010, 2, 2)))
            .unwrap()
            .id
    };

    let env = LmdbEnvironment::open(dir.path(), 8, 16 * 1024 * 1024).unwrap();
    let engine = engine_at(&env, NOW + 10);
    let stored = engine.find_attempt(id).unwrap().unwrap();
    assert_eq!(stored.user_name, "durable");
    assert!(!stored.is_success);

    assert!(engine.delete_attempt(id).unwrap());
    assert!(engine.list_sorted("AttemptId", "asc").unwrap().is_empty());
}
