//! Error types for the coordinator

use shelter_common::TransactionId;
use shelter_store::StoreError;
use thiserror::Error;

/// Coordinator error types
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("Resource is locked: {0}")]
    ResourceLocked(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Invalid transaction state: {0}")]
    InvalidState(String),

    #[error("Call deadline exceeded")]
    Timeout,

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoordinatorError {
    /// Stable reason code surfaced to callers
    pub fn reason_code(&self) -> &'static str {
        match self {
            CoordinatorError::ResourceLocked(_) => "locked",
            CoordinatorError::PreconditionFailed(_) => "precondition_failed",
            CoordinatorError::InvalidState(_) | CoordinatorError::TransactionNotFound(_) => {
                "transaction_state_error"
            }
            CoordinatorError::Timeout => "timeout",
            CoordinatorError::UnknownParticipant(_) | CoordinatorError::Internal(_) => "internal",
        }
    }

    /// Whether the caller may retry after backing off
    ///
    /// A state error indicates an out-of-order call, not something a blind
    /// retry can fix.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoordinatorError::ResourceLocked(_) | CoordinatorError::Timeout
        )
    }
}

impl From<StoreError> for CoordinatorError {
    fn from(err: StoreError) -> Self {
        CoordinatorError::Internal(err.to_string())
    }
}

/// Result type for coordinator operations
pub type Result<T> = std::result::Result<T, CoordinatorError>;
