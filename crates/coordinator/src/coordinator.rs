//! Core coordinator implementation

use crate::error::{CoordinatorError, Result};
use crate::participant::{AdoptionPayload, Participant};
use crate::transaction::{Transaction, TransactionState};
use chrono::Utc;
use parking_lot::Mutex;
use shelter_common::{Operation, TransactionId};
use shelter_lock::LockManager;
use shelter_store::KvStore;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;

/// Coordinator tuning parameters
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Hard deadline on every participant/store call
    pub call_timeout: Duration,
    /// TTL on resource locks; the sole recovery for abandoned transactions
    pub lock_ttl: Duration,
    /// How long finished transaction records are kept before sweeping
    pub retention: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
            lock_ttl: Duration::from_secs(60),
            retention: Duration::from_secs(300),
        }
    }
}

/// A table entry; the async mutex serializes all calls on one transaction id
struct TableEntry {
    txn: Arc<AsyncMutex<Transaction>>,
    inserted_at: Instant,
}

/// Transaction coordinator driving two-phase commit across participants
///
/// Owns the transaction table exclusively. Locks are touched only through
/// the lock manager and participants only through their two hooks, so every
/// cross-store effect funnels through `prepare`/`commit`/`rollback`.
pub struct Coordinator {
    /// Per-resource TTL locks
    locks: LockManager,

    /// Registered participants keyed by resource type
    participants: HashMap<&'static str, Arc<dyn Participant>>,

    /// Transaction records owned by this coordinator
    transactions: Mutex<HashMap<TransactionId, TableEntry>>,

    config: CoordinatorConfig,
}

impl Coordinator {
    /// Create a coordinator with locks stored in `kv`
    pub fn new(kv: Arc<dyn KvStore>, config: CoordinatorConfig) -> Self {
        Self {
            locks: LockManager::new(kv, config.lock_ttl),
            participants: HashMap::new(),
            transactions: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Register a participant under its resource type
    pub fn register(&mut self, participant: Arc<dyn Participant>) {
        self.participants
            .insert(participant.resource_type(), participant);
    }

    /// Prepare one participant for a transaction
    ///
    /// Acquires the participant's resource lock under `txn_id`, checks the
    /// precondition, and stages the payload. The first successful prepare
    /// moves the record to `Prepared`; later prepares for other participants
    /// extend it.
    pub async fn prepare(
        &self,
        txn_id: TransactionId,
        resource_type: &str,
        operation: Operation,
        payload: AdoptionPayload,
    ) -> Result<()> {
        self.sweep();

        let participant = self
            .participants
            .get(resource_type)
            .cloned()
            .ok_or_else(|| CoordinatorError::UnknownParticipant(resource_type.to_string()))?;

        // Get or create the record, then serialize on its mutex
        let txn_arc = {
            let mut table = self.transactions.lock();
            match table.get(&txn_id) {
                Some(entry) => entry.txn.clone(),
                None => {
                    let txn =
                        Transaction::new(txn_id, operation, payload.clone(), self.config.lock_ttl);
                    let arc = Arc::new(AsyncMutex::new(txn));
                    table.insert(
                        txn_id,
                        TableEntry {
                            txn: arc.clone(),
                            inserted_at: Instant::now(),
                        },
                    );
                    arc
                }
            }
        };
        let mut txn = txn_arc.lock().await;

        if !matches!(
            txn.state,
            TransactionState::Initiated | TransactionState::Prepared
        ) {
            return Err(CoordinatorError::InvalidState(format!(
                "transaction {} is {}, cannot prepare",
                txn_id, txn.state
            )));
        }
        if txn.participants.iter().any(|p| p == resource_type) {
            return Err(CoordinatorError::InvalidState(format!(
                "participant {} already prepared for transaction {}",
                resource_type, txn_id
            )));
        }

        let key = participant.lock_key(&payload);
        let acquired = match self.bounded(self.locks.acquire(&key, txn_id)).await {
            Ok(acquired) => acquired,
            Err(err) => {
                self.drop_if_empty(txn_id, &txn);
                return Err(err);
            }
        };
        if !acquired {
            self.drop_if_empty(txn_id, &txn);
            return Err(CoordinatorError::ResourceLocked(key.to_string()));
        }

        let precondition = self
            .bounded(participant.check_precondition(&payload, operation))
            .await;
        match precondition {
            Ok(true) => {}
            Ok(false) => {
                let _ = self.locks.release(&key).await;
                if txn.participants.is_empty() {
                    txn.transition(TransactionState::Aborted)?;
                }
                return Err(CoordinatorError::PreconditionFailed(format!(
                    "post {} is not {} for {}",
                    payload.post_id,
                    operation.required_status(),
                    operation
                )));
            }
            Err(err) => {
                let _ = self.locks.release(&key).await;
                self.drop_if_empty(txn_id, &txn);
                return Err(err);
            }
        }

        txn.lock_keys.push(key);
        txn.participants.push(resource_type.to_string());
        if txn.state == TransactionState::Initiated {
            txn.transition(TransactionState::Prepared)?;
        }

        tracing::debug!(%txn_id, participant = resource_type, "prepared");
        Ok(())
    }

    /// Commit a prepared transaction
    ///
    /// Applies every prepared participant, then releases all locks. An apply
    /// failure leaves the record `Prepared` so the caller can retry commit
    /// or roll back; the record never silently becomes `Committed`. Commit
    /// on an already-committed id is a no-op success.
    pub async fn commit(&self, txn_id: TransactionId) -> Result<()> {
        let txn_arc = self.entry(txn_id)?;
        let mut txn = txn_arc.lock().await;

        if txn.state == TransactionState::Committed {
            return Ok(());
        }
        if txn.state != TransactionState::Prepared {
            return Err(CoordinatorError::InvalidState(format!(
                "transaction {} is {}, not prepared",
                txn_id, txn.state
            )));
        }

        // Past the lease deadline exclusivity cannot be assumed, even
        // before asking the store.
        if Utc::now() >= txn.expires_at {
            return Err(CoordinatorError::ResourceLocked(format!(
                "lock lease for transaction {} expired",
                txn_id
            )));
        }

        // A lock lost to TTL expiry means exclusivity is gone; fail fast
        // instead of applying against a resource someone else may now own.
        for key in &txn.lock_keys {
            let owner = self.bounded(self.locks.owner(key)).await?;
            if owner != Some(txn_id) {
                return Err(CoordinatorError::ResourceLocked(format!(
                    "{} no longer held by transaction {}",
                    key, txn_id
                )));
            }
        }

        for resource_type in txn.participants.clone() {
            let participant = self
                .participants
                .get(resource_type.as_str())
                .cloned()
                .ok_or_else(|| CoordinatorError::UnknownParticipant(resource_type.clone()))?;

            if let Err(err) = self
                .bounded(participant.apply(&txn.payload, txn.operation))
                .await
            {
                tracing::warn!(
                    %txn_id,
                    participant = %resource_type,
                    %err,
                    "apply failed, transaction stays prepared"
                );
                return Err(err);
            }
        }

        txn.transition(TransactionState::Committed)?;
        for key in &txn.lock_keys {
            if let Err(err) = self.locks.release(key).await {
                tracing::warn!(%txn_id, %key, %err, "failed to release lock after commit");
            }
        }

        tracing::info!(%txn_id, "transaction committed");
        Ok(())
    }

    /// Roll back a prepared transaction, releasing its locks
    pub async fn rollback(&self, txn_id: TransactionId) -> Result<()> {
        let txn_arc = self.entry(txn_id)?;
        let mut txn = txn_arc.lock().await;

        if txn.state != TransactionState::Prepared {
            return Err(CoordinatorError::InvalidState(format!(
                "transaction {} is {}, not prepared",
                txn_id, txn.state
            )));
        }

        for key in &txn.lock_keys {
            if let Err(err) = self.locks.release(key).await {
                tracing::warn!(%txn_id, %key, %err, "failed to release lock on rollback");
            }
        }
        txn.transition(TransactionState::RolledBack)?;

        tracing::info!(%txn_id, "transaction rolled back");
        Ok(())
    }

    /// Current state of a transaction, if its record still exists
    pub async fn transaction_state(&self, txn_id: TransactionId) -> Option<TransactionState> {
        let txn_arc = {
            let table = self.transactions.lock();
            table.get(&txn_id)?.txn.clone()
        };
        let state = txn_arc.lock().await.state;
        Some(state)
    }

    fn entry(&self, txn_id: TransactionId) -> Result<Arc<AsyncMutex<Transaction>>> {
        let table = self.transactions.lock();
        table
            .get(&txn_id)
            .map(|e| e.txn.clone())
            .ok_or(CoordinatorError::TransactionNotFound(txn_id))
    }

    /// Drop a record that never got any participant prepared
    fn drop_if_empty(&self, txn_id: TransactionId, txn: &Transaction) {
        if txn.participants.is_empty() {
            self.transactions.lock().remove(&txn_id);
        }
    }

    /// Bound a call by the configured timeout
    ///
    /// On expiry the call is abandoned from our perspective; the underlying
    /// operation may still land, which is why rollback stays safe to call
    /// afterwards.
    async fn bounded<T, E>(&self, fut: impl Future<Output = std::result::Result<T, E>>) -> Result<T>
    where
        E: Into<CoordinatorError>,
    {
        match tokio::time::timeout(self.config.call_timeout, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(CoordinatorError::Timeout),
        }
    }

    /// Evict records past the retention window
    ///
    /// Terminal records are dropped. In-flight records that old have long
    /// since lost their locks to TTL expiry, so they are aborted and
    /// dropped. Entries currently serving a call are skipped.
    fn sweep(&self) {
        let now = Instant::now();
        let retention = self.config.retention;
        let mut table = self.transactions.lock();

        table.retain(|id, entry| {
            if now.saturating_duration_since(entry.inserted_at) < retention {
                return true;
            }
            match entry.txn.try_lock() {
                Ok(mut txn) => {
                    if !txn.state.is_terminal() {
                        let _ = txn.transition(TransactionState::Aborted);
                        tracing::warn!(txn_id = %id, "evicting expired in-flight transaction");
                    }
                    false
                }
                Err(_) => true,
            }
        });
    }
}
