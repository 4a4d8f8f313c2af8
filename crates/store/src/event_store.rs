//! Chat/event store interface and in-memory implementation

use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use shelter_common::ChatMessage;
use std::sync::Arc;

/// Document store holding chat messages and adoption events
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append a message record
    async fn insert(&self, message: ChatMessage) -> Result<()>;

    /// All messages for a room, ordered by timestamp ascending
    async fn find_by_room(&self, room: &str) -> Result<Vec<ChatMessage>>;
}

/// In-memory event store
#[derive(Default)]
pub struct MemoryEventStore {
    messages: Arc<Mutex<Vec<ChatMessage>>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, message: ChatMessage) -> Result<()> {
        self.messages.lock().push(message);
        Ok(())
    }

    async fn find_by_room(&self, room: &str) -> Result<Vec<ChatMessage>> {
        let mut found: Vec<ChatMessage> = self
            .messages
            .lock()
            .iter()
            .filter(|m| m.room == room)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.timestamp);
        Ok(found)
    }
}
