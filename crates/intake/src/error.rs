//! Intake errors
//!
//! Business rejections (spam, rate limit, invalid email) are not errors; see
//! [`crate::Rejection`]. Only store failures and bad windows end up here.

use leadflow_persistence::PersistenceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Store error: {0}")]
    Store(#[from] PersistenceError),

    #[error("Window out of range: {0:?}")]
    InvalidWindow(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, IntakeError>;

/// Convert a configured window into a chrono duration
pub(crate) fn window(duration: std::time::Duration) -> Result<chrono::Duration> {
    chrono::Duration::from_std(duration).map_err(|_| IntakeError::InvalidWindow(duration))
}
