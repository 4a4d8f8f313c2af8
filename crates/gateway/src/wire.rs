//! Inbound wire protocol
//!
//! Frames are JSON objects dispatched on their `action` field; anything
//! without a recognized action is treated as a chat message, whose field
//! validation happens in the chat handler so the failure can be acknowledged
//! in the shape the client expects.

use serde_json::Value;
use thiserror::Error;

/// A parsed inbound command
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// Switch to another room, leaving the current one
    JoinRoom { room: String },

    /// Request the current room's history
    GetHistory,

    /// Adopt a post, driving the two-phase commit
    Adopt { post_id: u64, username: String },

    /// Anything else: a chat message, validated downstream
    Chat {
        message_id: Option<String>,
        username: Option<String>,
        message: Option<String>,
    },
}

/// Why a frame could not be parsed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Invalid JSON format")]
    Malformed,

    #[error("Missing or invalid field: {0}")]
    MissingField(&'static str),
}

/// Parse one inbound frame
pub fn parse(frame: &str) -> Result<ClientCommand, ParseError> {
    let value: Value = serde_json::from_str(frame).map_err(|_| ParseError::Malformed)?;
    let obj = value.as_object().ok_or(ParseError::Malformed)?;

    match obj.get("action").and_then(Value::as_str) {
        Some("join_room") => {
            let room = obj
                .get("room")
                .and_then(Value::as_str)
                .unwrap_or("lobby")
                .to_string();
            Ok(ClientCommand::JoinRoom { room })
        }
        Some("get_history") => Ok(ClientCommand::GetHistory),
        Some("adopt") => {
            // "animal_id" is the historical field name for the same thing
            let post_id = obj
                .get("post_id")
                .or_else(|| obj.get("animal_id"))
                .and_then(Value::as_u64)
                .ok_or(ParseError::MissingField("post_id"))?;
            let username = obj
                .get("username")
                .and_then(Value::as_str)
                .ok_or(ParseError::MissingField("username"))?
                .to_string();
            Ok(ClientCommand::Adopt { post_id, username })
        }
        _ => Ok(ClientCommand::Chat {
            message_id: obj
                .get("message_id")
                .and_then(Value::as_str)
                .map(str::to_string),
            username: obj
                .get("username")
                .and_then(Value::as_str)
                .map(str::to_string),
            message: obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        }),
    }
}
