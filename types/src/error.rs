//! Errors raised while constructing fundamental types from raw input.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypeError {
    #[error("invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },
}
