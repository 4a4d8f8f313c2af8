//! RPC-shaped responses returned to coordinator callers

use crate::error::{CoordinatorError, Result};
use serde::{Deserialize, Serialize};
use shelter_common::TransactionId;

/// Outcome of a prepare/commit/rollback call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub transaction_id: TransactionId,
    pub success: bool,
    pub message: String,
}

impl TransactionResponse {
    /// Successful response
    pub fn ok(transaction_id: TransactionId, message: impl Into<String>) -> Self {
        Self {
            transaction_id,
            success: true,
            message: message.into(),
        }
    }

    /// Failure response carrying the error's reason code and detail
    pub fn failure(transaction_id: TransactionId, err: &CoordinatorError) -> Self {
        Self {
            transaction_id,
            success: false,
            message: format!("{}: {}", err.reason_code(), err),
        }
    }

    /// Map a coordinator result into the wire shape
    pub fn from_result(
        transaction_id: TransactionId,
        result: &Result<()>,
        ok_message: &str,
    ) -> Self {
        match result {
            Ok(()) => Self::ok(transaction_id, ok_message),
            Err(err) => Self::failure(transaction_id, err),
        }
    }
}
