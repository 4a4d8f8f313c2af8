//! Outbound wire messages delivered to clients

use serde::{Deserialize, Serialize};
use shelter_common::ChatMessage;

/// One history record as sent to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub username: String,
    pub message: String,
}

impl From<&ChatMessage> for HistoryEntry {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            username: msg.username.clone(),
            message: msg.message.clone(),
        }
    }
}

/// A message sent from the server to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Acknowledgement for a stored chat message
    MessageSaved {
        message_id: String,
        status: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Reply to a history request
    ChatHistory { history: Vec<HistoryEntry> },

    /// Room-wide system notice (joins, leaves, adoptions)
    System { message: String },

    /// Reply to an adoption request, sent to the initiator only
    Adoption {
        status: String,
        post_id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Error reply for malformed or invalid input
    Error { error: String },
}

impl ServerMessage {
    pub fn saved(message_id: impl Into<String>) -> Self {
        ServerMessage::MessageSaved {
            message_id: message_id.into(),
            status: "success".into(),
            error: None,
        }
    }

    pub fn save_failed(message_id: impl Into<String>, error: impl Into<String>) -> Self {
        ServerMessage::MessageSaved {
            message_id: message_id.into(),
            status: "failure".into(),
            error: Some(error.into()),
        }
    }

    pub fn system(message: impl Into<String>) -> Self {
        ServerMessage::System {
            message: message.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        ServerMessage::Error {
            error: error.into(),
        }
    }
}
