//! LMDB storage backend for AgeGate.
//!
//! Implements the storage traits from `agegate-store` using the `heed` LMDB bindings.
//! All logical stores share a single environment.

pub mod attempt_log;
pub mod environment;
pub mod error;
pub mod integrity;
mod keys;
pub mod meta;
pub mod migration;

pub use attempt_log::LmdbAttemptLogStore;
pub use environment::{LmdbEnvironment, DEFAULT_MAP_SIZE, DEFAULT_MAX_DBS};
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use meta::LmdbMetaStore;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
