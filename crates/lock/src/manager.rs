//! Lock acquisition and release over the key-value store

use crate::key::LockKey;
use shelter_common::TransactionId;
use shelter_store::{KvStore, Result};
use std::sync::Arc;
use std::time::Duration;

/// Lock manager backed by the key-value store
///
/// Acquisition rides on the store's atomic set-if-absent, so two concurrent
/// acquirers of the same key cannot both succeed. The manager does not queue
/// waiters; a conflicting acquire simply fails and the caller decides
/// whether to retry.
pub struct LockManager {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl LockManager {
    /// Create a manager whose locks expire after `ttl` without release
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Try to acquire a lock for `owner`
    ///
    /// Returns true iff no live lock existed on the key.
    pub async fn acquire(&self, key: &LockKey, owner: TransactionId) -> Result<bool> {
        let storage_key = key.to_string();
        let granted = self
            .kv
            .set_if_absent(&storage_key, &owner.to_string(), self.ttl)
            .await?;

        if granted {
            tracing::debug!(key = %storage_key, %owner, "lock acquired");
        } else {
            tracing::debug!(key = %storage_key, %owner, "lock conflict");
        }
        Ok(granted)
    }

    /// Release a lock unconditionally
    ///
    /// Releasing an absent or already-expired lock is not an error.
    pub async fn release(&self, key: &LockKey) -> Result<()> {
        let storage_key = key.to_string();
        self.kv.delete(&storage_key).await?;
        tracing::debug!(key = %storage_key, "lock released");
        Ok(())
    }

    /// Current live owner of a lock, if any
    ///
    /// Used before commit to detect a lock silently lost to TTL expiry.
    pub async fn owner(&self, key: &LockKey) -> Result<Option<TransactionId>> {
        let value = self.kv.get(&key.to_string()).await?;
        Ok(value.and_then(|v| v.parse().ok()))
    }
}
