//! Transaction records and their state machine

use crate::error::{CoordinatorError, Result};
use crate::participant::AdoptionPayload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelter_common::{Operation, TransactionId};
use shelter_lock::LockKey;
use std::fmt;
use std::time::Duration;

/// Transaction state in the coordinator
///
/// Transitions only move forward; `Committed`, `RolledBack`, and `Aborted`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    /// Record created, no participant prepared yet
    Initiated,
    /// All participants prepared so far hold their locks
    Prepared,
    /// Every participant applied its operation
    Committed,
    /// Locks released, staged work discarded
    RolledBack,
    /// A precondition failed during prepare
    Aborted,
}

impl TransactionState {
    /// Whether the transaction can never change state again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Committed | TransactionState::RolledBack | TransactionState::Aborted
        )
    }

    fn can_transition_to(&self, next: TransactionState) -> bool {
        use TransactionState::*;
        matches!(
            (*self, next),
            (Initiated, Prepared) | (Initiated, Aborted) | (Prepared, Committed)
                | (Prepared, RolledBack)
                | (Prepared, Aborted)
        )
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionState::Initiated => "initiated",
            TransactionState::Prepared => "prepared",
            TransactionState::Committed => "committed",
            TransactionState::RolledBack => "rolled_back",
            TransactionState::Aborted => "aborted",
        };
        write!(f, "{}", s)
    }
}

/// A transaction record owned by the coordinator
///
/// The record is the only channel between the prepare phase and the later
/// commit/rollback: everything commit needs (payload, participants, lock
/// keys) is stored here under the transaction id.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    pub state: TransactionState,
    pub resource_id: u64,
    pub operation: Operation,
    /// Resource types of participants prepared so far, in prepare order
    pub participants: Vec<String>,
    pub payload: AdoptionPayload,
    /// Locks held on behalf of this transaction
    pub lock_keys: Vec<LockKey>,
    pub created_at: DateTime<Utc>,
    /// Point past which the locks may have lapsed to TTL expiry
    pub expires_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a fresh record in `Initiated`
    pub fn new(
        id: TransactionId,
        operation: Operation,
        payload: AdoptionPayload,
        lock_ttl: Duration,
    ) -> Self {
        let created_at = Utc::now();
        let expires_at = created_at
            + chrono::Duration::from_std(lock_ttl).unwrap_or_else(|_| chrono::Duration::seconds(60));

        Self {
            id,
            state: TransactionState::Initiated,
            resource_id: payload.post_id,
            operation,
            participants: Vec::new(),
            payload,
            lock_keys: Vec::new(),
            created_at,
            expires_at,
        }
    }

    /// Move to `next`, failing on any backward or skipped transition
    pub fn transition(&mut self, next: TransactionState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(CoordinatorError::InvalidState(format!(
                "transaction {} cannot move from {} to {}",
                self.id, self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }
}
