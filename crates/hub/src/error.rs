//! Error types for the hub

use thiserror::Error;

/// Hub error types
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Could not retrieve chat history within the timeout")]
    HistoryTimeout,

    #[error("Store error: {0}")]
    Store(String),
}

impl From<shelter_store::StoreError> for HubError {
    fn from(err: shelter_store::StoreError) -> Self {
        HubError::Store(err.to_string())
    }
}

/// Result type for hub operations
pub type Result<T> = std::result::Result<T, HubError>;
