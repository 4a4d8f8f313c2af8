//! Adoption flow driving the two-phase commit

use shelter_common::{Operation, TransactionId};
use shelter_coordinator::{AdoptionPayload, Coordinator, TransactionResponse};
use std::sync::Arc;

/// Outcome of one adoption attempt, in the coordinator's response shape
///
/// On failure the message starts with the reason code ("locked",
/// "precondition_failed", ...); clients never see it verbatim.
pub type AdoptionResult = TransactionResponse;

/// Drives prepare/prepare/commit across both participants, rolling back on
/// any failure along the way
pub struct AdoptionFlow {
    coordinator: Arc<Coordinator>,
}

impl AdoptionFlow {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    /// Run one adoption end to end
    ///
    /// The post participant is prepared first (lock + availability check),
    /// then the notification participant (stage the room event), then both
    /// are committed. Any failure rolls back whatever was prepared and
    /// releases the locks.
    pub async fn adopt(&self, post_id: u64, username: &str, room: &str) -> AdoptionResult {
        let txn_id = TransactionId::new();
        let result = self.drive(txn_id, post_id, username, room).await;

        match &result {
            Ok(()) => tracing::info!(%txn_id, post_id, username, "adoption committed"),
            Err(err) => tracing::warn!(%txn_id, post_id, %err, "adoption failed"),
        }
        TransactionResponse::from_result(txn_id, &result, "Adoption committed")
    }

    async fn drive(
        &self,
        txn_id: TransactionId,
        post_id: u64,
        username: &str,
        room: &str,
    ) -> shelter_coordinator::Result<()> {
        let payload = AdoptionPayload {
            post_id,
            username: username.to_string(),
            room: room.to_string(),
        };

        self.coordinator
            .prepare(txn_id, "post", Operation::Adopt, payload.clone())
            .await?;

        if let Err(err) = self
            .coordinator
            .prepare(txn_id, "notification", Operation::Adopt, payload)
            .await
        {
            self.rollback(txn_id).await;
            return Err(err);
        }

        if let Err(err) = self.coordinator.commit(txn_id).await {
            self.rollback(txn_id).await;
            return Err(err);
        }
        Ok(())
    }

    async fn rollback(&self, txn_id: TransactionId) {
        if let Err(err) = self.coordinator.rollback(txn_id).await {
            // Nothing prepared, or already terminal; the locks will lapse
            tracing::debug!(%txn_id, %err, "rollback skipped");
        }
    }
}
