//! Age verification engine.
//!
//! Every attempt is evaluated on two independent criteria and both results
//! are written to the attempt log:
//! 1. **Age**: the candidate must be at least [`PERMISSIBLE_AGE`] on the day of the attempt.
//! 2. **Lock-out**: the same user name and email pair must not have
//!    [`MAX_REPEAT_FAILED_ATTEMPTS`] failures inside the trailing window.
//!
//! Access is granted only when the first holds and the second does not.
//! The log can be listed sorted by any record attribute.

pub mod age;
pub mod engine;
pub mod error;
pub mod lockout;
pub mod seed;
pub mod sort;

pub use age::{age_in_years, is_of_permissible_age, PERMISSIBLE_AGE};
pub use engine::{VerificationEngine, Verdict};
pub use error::VerificationError;
pub use lockout::{LockoutPolicy, LOCKOUT_WINDOW_SECS, MAX_REPEAT_FAILED_ATTEMPTS};
pub use seed::{demo_attempts, seed_if_empty};
pub use sort::{SortDirection, SortField};
