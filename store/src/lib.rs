//! Abstract storage traits for AgeGate.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The verification engine depends only on the traits.

pub mod attempt_log;
pub mod error;
pub mod meta;

pub use attempt_log::{AttemptLogStore, FailureQuery};
pub use error::StoreError;
pub use meta::MetaStore;
