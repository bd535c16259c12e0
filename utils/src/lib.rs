//! Shared utilities for the age gate.

pub mod logging;

pub use logging::{init_logging, LogFormat, LogFormatError};
