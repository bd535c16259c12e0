//! Verification attempt types.
//!
//! An attempt moves through three shapes:
//! [`Candidate`] (what the caller submits) → [`NewAttempt`] (stamped with the
//! submission time and the computed flags) → [`AttemptRecord`] (persisted,
//! carrying the store-assigned [`AttemptId`]).

use crate::Timestamp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a persisted attempt, assigned by the store on insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttemptId(u64);

impl AttemptId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Big-endian key bytes; sorts in allocation order.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AttemptId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Identity fields submitted for verification.
///
/// Carries no timestamp and no outcome: both are computed by the engine.
/// Callers are expected to have validated the fields already.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub user_name: String,
    pub email_address: String,
    pub date_of_birth: NaiveDate,
}

impl Candidate {
    pub fn new(
        user_name: impl Into<String>,
        email_address: impl Into<String>,
        date_of_birth: NaiveDate,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            email_address: email_address.into(),
            date_of_birth,
        }
    }
}

/// A fully evaluated attempt that has not yet been persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttempt {
    pub submitted_at: Timestamp,
    pub user_name: String,
    pub email_address: String,
    pub date_of_birth: NaiveDate,
    /// Whether the candidate met the minimum age.
    pub is_success: bool,
    /// Whether the candidate was locked out by recent failures.
    pub is_locked_out: bool,
}

impl NewAttempt {
    /// Stamp a candidate with its submission time and computed outcome.
    pub fn from_candidate(
        candidate: Candidate,
        submitted_at: Timestamp,
        is_success: bool,
        is_locked_out: bool,
    ) -> Self {
        Self {
            submitted_at,
            user_name: candidate.user_name,
            email_address: candidate.email_address,
            date_of_birth: candidate.date_of_birth,
            is_success,
            is_locked_out,
        }
    }

    /// Attach the identifier the store assigned on insert.
    pub fn into_record(self, id: AttemptId) -> AttemptRecord {
        AttemptRecord {
            id,
            submitted_at: self.submitted_at,
            user_name: self.user_name,
            email_address: self.email_address,
            date_of_birth: self.date_of_birth,
            is_success: self.is_success,
            is_locked_out: self.is_locked_out,
        }
    }
}

/// One immutable row of the attempt log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: AttemptId,
    pub submitted_at: Timestamp,
    pub user_name: String,
    pub email_address: String,
    pub date_of_birth: NaiveDate,
    pub is_success: bool,
    pub is_locked_out: bool,
}

impl AttemptRecord {
    /// Whether this attempt was granted access.
    ///
    /// A locked-out attempt is denied regardless of its age result.
    pub fn admitted(&self) -> bool {
        self.is_success && !self.is_locked_out
    }
}
