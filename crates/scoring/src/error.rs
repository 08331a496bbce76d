//! Scoring errors
//!
//! Missing optional lead fields never produce an error; they score neutral.

use leadflow_persistence::PersistenceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Store error: {0}")]
    Store(#[from] PersistenceError),

    #[error("Lead belongs to tenant {found}, engine is scoped to {expected}")]
    TenantMismatch { expected: String, found: String },
}

pub type Result<T> = std::result::Result<T, ScoringError>;
