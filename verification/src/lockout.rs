//! Lock-out policy: repeated recent failures by the same name/email pair.

use agegate_store::FailureQuery;
use agegate_types::Timestamp;
use serde::{Deserialize, Serialize};

/// Number of prior failed attempts inside the window that locks out the next attempt.
pub const MAX_REPEAT_FAILED_ATTEMPTS: u64 = 3;

/// Length of the trailing window, in seconds, in which failures count.
pub const LOCKOUT_WINDOW_SECS: u64 = 60 * 60;

/// Sliding-window lock-out rule.
///
/// An attempt is locked out when at least `max_failed_attempts` failed
/// attempts with the same user name and email address were submitted strictly
/// after `now - window_secs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutPolicy {
    pub max_failed_attempts: u64,
    pub window_secs: u64,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: MAX_REPEAT_FAILED_ATTEMPTS,
            window_secs: LOCKOUT_WINDOW_SECS,
        }
    }
}

impl LockoutPolicy {
    /// Exclusive lower bound of the window ending at `now`.
    pub fn window_start(&self, now: Timestamp) -> Timestamp {
        now.saturating_sub_secs(self.window_secs)
    }

    /// Store filter selecting the failures that count against this pair.
    pub fn failure_query<'a>(
        &self,
        user_name: &'a str,
        email_address: &'a str,
        now: Timestamp,
    ) -> FailureQuery<'a> {
        FailureQuery {
            user_name,
            email_address,
            submitted_after: self.window_start(now),
        }
    }

    pub fn is_locked_out(&self, prior_failures: u64) -> bool {
        prior_failures >= self.max_failed_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_constants() {
        let policy = LockoutPolicy::default();
        assert_eq!(policy.max_failed_attempts, 3);
        assert_eq!(policy.window_secs, 3600);
    }

    #[test]
    fn threshold_is_inclusive() {
        let policy = LockoutPolicy::default();
        assert!(!policy.is_locked_out(2));
        assert!(policy.is_locked_out(3));
        assert!(policy.is_locked_out(4));
    }

    #[test]
    fn window_start_is_one_hour_back() {
        let policy = LockoutPolicy::default();
        assert_eq!(
            policy.window_start(Timestamp::new(10_000)),
            Timestamp::new(6_400)
        );
        assert_eq!(policy.window_start(Timestamp::new(10)), Timestamp::EPOCH);
    }

    #[test]
    fn failure_query_carries_identity() {
        let policy = LockoutPolicy::default();
        let q = policy.failure_query("u", "e@x.com", Timestamp::new(7200));
        assert_eq!(q.user_name, "u");
        assert_eq!(q.email_address, "e@x.com");
        assert_eq!(q.submitted_after, Timestamp::new(3600));
    }
}
