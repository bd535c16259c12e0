//! Age eligibility.

use chrono::{Datelike, Months, NaiveDate};

/// Minimum age, in whole years, required for access to be granted.
pub const PERMISSIBLE_AGE: i32 = 18;

/// Shift a calendar date by whole years.
///
/// February 29 lands on February 28 in non-leap target years. Returns `None`
/// if the result is outside chrono's representable range.
pub fn shift_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let months = Months::new(years.unsigned_abs().checked_mul(12)?);
    if years >= 0 {
        date.checked_add_months(months)
    } else {
        date.checked_sub_months(months)
    }
}

/// Age in completed years on `today` for someone born on `dob`.
///
/// Compares full calendar dates: the year difference is reduced by one when
/// this year's birthday (the date of birth advanced by that difference) is
/// still ahead of `today`. A date of birth after `today` yields a negative age.
pub fn age_in_years(dob: NaiveDate, today: NaiveDate) -> i32 {
    let years = today.year() - dob.year();
    let birthday_passed = match shift_years(dob, years) {
        Some(anniversary) => anniversary <= today,
        // Only reachable at the edges of the calendar range: an anniversary
        // that cannot be represented lies beyond `today` when moving forward.
        None => years < 0,
    };
    if birthday_passed {
        years
    } else {
        years - 1
    }
}

/// Whether someone born on `dob` has reached [`PERMISSIBLE_AGE`] on `today`.
pub fn is_of_permissible_age(dob: NaiveDate, today: NaiveDate) -> bool {
    age_in_years(dob, today) >= PERMISSIBLE_AGE
}
