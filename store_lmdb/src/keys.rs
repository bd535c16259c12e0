//! Binary key layouts.
//!
//! - `attempts_db`: `id_be_u64(8)` → bincode `AttemptRecord`.
//!   Big-endian ids sort in allocation order, so a cursor scan yields insertion order.
//! - `attempt_failures_db`: `identity_digest(32) ++ submitted_at_be_u64(8)
//!   ++ id_be_u64(8)` → empty.
//!   Only failed attempts are indexed. The digest is Blake2b-256 over the
//!   length-prefixed `(user_name, email)` pair, so keys have a fixed width
//!   (well under LMDB's 511-byte key limit) whatever the input length. The
//!   big-endian timestamp lets a lock-out window be answered with one range
//!   scan; readers re-check the identity against the stored record.

use agegate_types::{AttemptId, Timestamp};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

/// Width of the identity digest at the start of a failure-index key.
pub(crate) const IDENTITY_DIGEST_LEN: usize = 32;

/// Width of the `submitted_at ++ id` suffix of a failure-index key.
pub(crate) const FAILURE_SUFFIX_LEN: usize = 16;

/// Digest prefix shared by all failure-index entries of one person.
pub(crate) fn failure_prefix(user_name: &str, email_address: &str) -> Vec<u8> {
    let name = user_name.as_bytes();
    let email = email_address.as_bytes();
    let mut hasher = Blake2b256::new();
    hasher.update((name.len() as u64).to_be_bytes());
    hasher.update(name);
    hasher.update((email.len() as u64).to_be_bytes());
    hasher.update(email);
    let digest = hasher.finalize();

    let mut key = Vec::with_capacity(IDENTITY_DIGEST_LEN + FAILURE_SUFFIX_LEN);
    key.extend_from_slice(&digest);
    key
}

/// Full failure-index key for one attempt.
pub(crate) fn failure_key(
    user_name: &str,
    email_address: &str,
    submitted_at: Timestamp,
    id: AttemptId,
) -> Vec<u8> {
    let mut key = failure_prefix(user_name, email_address);
    key.extend_from_slice(&submitted_at.as_secs().to_be_bytes());
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Smallest key that is greater than every key starting with `prefix`.
///
/// Increments the last byte with carry. An all-`0xFF` prefix has no finite
/// successor and becomes empty; callers treat that as an unbounded range.
pub(crate) fn increment_prefix(prefix: &mut Vec<u8>) {
    while let Some(last) = prefix.last_mut() {
        if *last == u8::MAX {
            prefix.pop();
        } else {
            *last += 1;
            return;
        }
    }
}

/// Split a failure-index key back into `(submitted_at, id)`.
pub(crate) fn decode_failure_suffix(key: &[u8]) -> Option<(Timestamp, AttemptId)> {
    if key.len() < FAILURE_SUFFIX_LEN {
        return None;
    }
    let suffix = &key[key.len() - FAILURE_SUFFIX_LEN..];
    let ts: [u8; 8] = suffix[..8].try_into().ok()?;
    let id: [u8; 8] = suffix[8..].try_into().ok()?;
    Some((
        Timestamp::new(u64::from_be_bytes(ts)),
        AttemptId::from_be_bytes(id),
    ))
}

/// Decode an `attempts_db` key.
pub(crate) fn decode_attempt_key(key: &[u8]) -> Option<AttemptId> {
    let bytes: [u8; 8] = key.try_into().ok()?;
    Some(AttemptId::from_be_bytes(bytes))
}
