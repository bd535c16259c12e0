use agegate_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("unknown sort field '{0}'")]
    InvalidField(String),
}
