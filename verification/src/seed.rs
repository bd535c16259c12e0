//! Demonstration data for an empty attempt log.

use agegate_store::{AttemptLogStore, StoreError};
use agegate_types::{Candidate, NewAttempt, Timestamp};

use crate::age::shift_years;

const HOUR_SECS: u64 = 60 * 60;

/// Three historical attempts submitted one, two and three hours before `now`.
///
/// `seeded_user2` is underage and recorded as a failure; the others succeeded.
pub fn demo_attempts(now: Timestamp) -> Vec<NewAttempt> {
    let today = now.date();
    let seeded = [
        ("seeded_user1", "seeded_user1@test.com", 1, 20, true),
        ("seeded_user2", "seeded_user2@test.co.uk", 2, 10, false),
        ("seeded_user3", "seeded_user_3@test.net", 3, 30, true),
    ];

    seeded
        .into_iter()
        .map(|(name, email, hours_ago, age, is_success)| {
            let dob = shift_years(today, -age).unwrap_or(today);
            NewAttempt::from_candidate(
                Candidate::new(name, email, dob),
                now.saturating_sub_secs(hours_ago * HOUR_SECS),
                is_success,
                false,
            )
        })
        .collect()
}

/// Insert [`demo_attempts`] if the log is empty. Returns how many were inserted.
pub fn seed_if_empty(store: &impl AttemptLogStore, now: Timestamp) -> Result<usize, StoreError> {
    if store.attempt_count()? > 0 {
        tracing::debug!("attempt log already populated, skipping seed");
        return Ok(0);
    }

    let attempts = demo_attempts(now);
    for attempt in &attempts {
        store.insert_attempt(attempt)?;
    }
    tracing::info!(count = attempts.len(), "seeded attempt log");
    Ok(attempts.len())
}
