//! LMDB database integrity checks.
//!
//! Cross-checks the failure index against the attempt records: every failed
//! attempt must have exactly one index entry and every index entry must point
//! at a failed attempt with the same name, email and timestamp.

use std::collections::HashSet;
use std::path::Path;

use agegate_types::AttemptRecord;

use crate::keys::{decode_attempt_key, decode_failure_suffix, failure_key};
use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug)]
pub struct IntegrityReport {
    pub attempts_checked: u64,
    pub index_entries_checked: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check attempt log integrity.
///
/// Decode failures are recorded in the report rather than causing a hard
/// error; only transaction-level failures are returned as `Err`.
pub fn check_integrity(environment: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        attempts_checked: 0,
        index_entries_checked: 0,
        errors: Vec::new(),
    };

    let rtxn = environment.env().read_txn()?;
    let mut expected_index: HashSet<Vec<u8>> = HashSet::new();

    for result in environment.attempts_db.iter(&rtxn)? {
        let (key, val) = result?;
        report.attempts_checked += 1;
        let Some(id) = decode_attempt_key(key) else {
            report.errors.push(format!("malformed attempt key {key:?}"));
            continue;
        };
        match bincode::deserialize::<AttemptRecord>(val) {
            Ok(record) if record.id != id => {
                report
                    .errors
                    .push(format!("attempt {id} stores record with id {}", record.id));
            }
            Ok(record) => {
                if !record.is_success {
                    expected_index.insert(failure_key(
                        &record.user_name,
                        &record.email_address,
                        record.submitted_at,
                        record.id,
                    ));
                }
            }
            Err(e) => report
                .errors
                .push(format!("failed to decode attempt {id}: {e}")),
        }
    }

    for result in environment.attempt_failures_db.iter(&rtxn)? {
        let (key, _) = result?;
        report.index_entries_checked += 1;
        if !expected_index.remove(key) {
            let target = decode_failure_suffix(key)
                .map(|(_, id)| id.to_string())
                .unwrap_or_else(|| "?".to_string());
            report
                .errors
                .push(format!("dangling failure index entry for attempt {target}"));
        }
    }

    for missing in expected_index {
        let target = decode_failure_suffix(&missing)
            .map(|(_, id)| id.to_string())
            .unwrap_or_else(|| "?".to_string());
        report
            .errors
            .push(format!("failed attempt {target} missing from failure index"));
    }

    Ok(report)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh directory, either nonexistent or empty.
/// Returns an error if the directory has contents but `data.mdb` is missing,
/// which suggests corruption or misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let mut entries = std::fs::read_dir(path)
        .map_err(|e| format!("cannot read data directory {}: {e}", path.display()))?;
    if entries.next().is_none() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}
