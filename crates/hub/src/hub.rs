//! Chat hub tying the room registry to the event store

use crate::error::{HubError, Result};
use crate::message::{HistoryEntry, ServerMessage};
use crate::registry::RoomRegistry;
use shelter_common::ChatMessage;
use shelter_store::EventStore;
use std::sync::Arc;
use std::time::Duration;

/// Chat operations over the registry and the event store
pub struct ChatHub {
    registry: Arc<RoomRegistry>,
    events: Arc<dyn EventStore>,
    history_timeout: Duration,
}

impl ChatHub {
    pub fn new(
        registry: Arc<RoomRegistry>,
        events: Arc<dyn EventStore>,
        history_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            events,
            history_timeout,
        }
    }

    /// The room registry this hub broadcasts through
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Persist a chat message to the room's log
    pub async fn save_message(&self, message: ChatMessage) -> Result<()> {
        self.events.insert(message).await?;
        Ok(())
    }

    /// Room history ordered by timestamp ascending, as wire entries
    ///
    /// Bounded by the configured timeout; a store that never responds
    /// surfaces an explicit timeout error instead of hanging the caller.
    pub async fn history(&self, room: &str) -> Result<Vec<HistoryEntry>> {
        let read = self.events.find_by_room(room);
        let messages = tokio::time::timeout(self.history_timeout, read)
            .await
            .map_err(|_| HubError::HistoryTimeout)??;
        Ok(messages.iter().map(HistoryEntry::from).collect())
    }

    /// Broadcast a system notice to a room
    pub async fn announce(&self, room: &str, text: impl Into<String>) {
        self.registry
            .broadcast(room, ServerMessage::system(text))
            .await;
    }
}
