//! Sorting of the attempt history by a caller-named field.
//!
//! Field names are resolved against a closed set of record attributes; an
//! unknown name is a [`VerificationError::InvalidField`], never a panic.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use agegate_types::AttemptRecord;
use serde::{Deserialize, Serialize};

use crate::error::VerificationError;

/// Attribute of an [`AttemptRecord`] the history can be sorted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    AttemptId,
    SubmittedDateTime,
    UserName,
    EmailAddress,
    DateOfBirth,
    IsSuccess,
    IsLockedOut,
}

impl SortField {
    pub const ALL: [SortField; 7] = [
        SortField::AttemptId,
        SortField::SubmittedDateTime,
        SortField::UserName,
        SortField::EmailAddress,
        SortField::DateOfBirth,
        SortField::IsSuccess,
        SortField::IsLockedOut,
    ];

    /// Alternative name accepted for [`SortField::AttemptId`]; listing pages
    /// address the identifier column as `AccessLogId`.
    pub const ATTEMPT_ID_ALIAS: &'static str = "AccessLogId";

    /// The name callers use to select this field. Matching is case-sensitive.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::AttemptId => "AttemptId",
            SortField::SubmittedDateTime => "SubmittedDateTime",
            SortField::UserName => "UserName",
            SortField::EmailAddress => "EmailAddress",
            SortField::DateOfBirth => "DOB",
            SortField::IsSuccess => "IsSuccess",
            SortField::IsLockedOut => "IsLockedOut",
        }
    }

    /// Natural ordering of two records on this field.
    pub fn compare(&self, a: &AttemptRecord, b: &AttemptRecord) -> Ordering {
        match self {
            SortField::AttemptId => a.id.cmp(&b.id),
            SortField::SubmittedDateTime => a.submitted_at.cmp(&b.submitted_at),
            SortField::UserName => a.user_name.cmp(&b.user_name),
            SortField::EmailAddress => a.email_address.cmp(&b.email_address),
            SortField::DateOfBirth => a.date_of_birth.cmp(&b.date_of_birth),
            SortField::IsSuccess => a.is_success.cmp(&b.is_success),
            SortField::IsLockedOut => a.is_locked_out.cmp(&b.is_locked_out),
        }
    }
}

impl FromStr for SortField {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == SortField::ATTEMPT_ID_ALIAS {
            return Ok(SortField::AttemptId);
        }
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| VerificationError::InvalidField(s.to_string()))
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Token that selects [`SortDirection::Descending`].
    pub const DESCENDING_TOKEN: &'static str = "desc";

    /// Lenient parse: exactly `"desc"` is descending, every other token
    /// (including `"DESC"` and typos) is ascending.
    pub fn parse_lenient(token: &str) -> Self {
        if token == Self::DESCENDING_TOKEN {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// Sort `records` in place. Ties keep no guaranteed order.
pub fn sort_records(records: &mut [AttemptRecord], field: SortField, direction: SortDirection) {
    match direction {
        SortDirection::Ascending => records.sort_unstable_by(|a, b| field.compare(a, b)),
        SortDirection::Descending => records.sort_unstable_by(|a, b| field.compare(b, a)),
    }
}
