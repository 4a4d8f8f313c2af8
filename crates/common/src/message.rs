//! Chat message records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chat message as stored in the event store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: String,
    pub username: String,
    pub message: String,
    pub room: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message with a generated id and the current timestamp
    pub fn new(
        username: impl Into<String>,
        message: impl Into<String>,
        room: impl Into<String>,
    ) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            username: username.into(),
            message: message.into(),
            room: room.into(),
            timestamp: Utc::now(),
        }
    }

    /// Adoption event record appended to a room's log when a post is adopted
    pub fn adoption_event(username: impl Into<String>, post_id: u64, room: impl Into<String>) -> Self {
        let username = username.into();
        let message = format!("{} adopted post {}", username, post_id);
        Self::new(username, message, room)
    }
}
