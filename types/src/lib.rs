//! Fundamental types for AgeGate.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! attempt identifiers and records, timestamps, and the clock abstraction.

pub mod attempt;
pub mod error;
pub mod time;

pub use attempt::{AttemptId, AttemptRecord, Candidate, NewAttempt};
pub use error::TypeError;
pub use time::{parse_date, Clock, SystemClock, Timestamp};
