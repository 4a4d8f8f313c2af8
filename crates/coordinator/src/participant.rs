//! Participant adapters over the post and event stores
//!
//! A participant is local to one store and exposes exactly the two hooks the
//! coordinator drives: a precondition check during prepare and an apply
//! during commit. New operations get new participants or new `Operation`
//! variants; the coordinator never branches on participant type.

use crate::error::{CoordinatorError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shelter_common::{ChatMessage, Operation};
use shelter_lock::LockKey;
use shelter_store::{EventStore, PostStore};
use std::sync::Arc;

/// Payload staged at prepare time and consumed at commit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdoptionPayload {
    pub post_id: u64,
    pub username: String,
    pub room: String,
}

/// A store-local participant in the two-phase commit
#[async_trait]
pub trait Participant: Send + Sync {
    /// Resource type this participant owns, also its registration key
    fn resource_type(&self) -> &'static str;

    /// Lock key guarding the resource this payload touches
    fn lock_key(&self, payload: &AdoptionPayload) -> LockKey;

    /// Whether the operation is currently valid against the store
    async fn check_precondition(
        &self,
        payload: &AdoptionPayload,
        operation: Operation,
    ) -> Result<bool>;

    /// Apply the operation to the store
    async fn apply(&self, payload: &AdoptionPayload, operation: Operation) -> Result<()>;
}

/// Participant owning animal posts
///
/// Precondition: the post exists and its status matches the operation's
/// required pre-state. Apply: move the post to the operation's resulting
/// status.
pub struct PostParticipant {
    posts: Arc<dyn PostStore>,
}

impl PostParticipant {
    pub fn new(posts: Arc<dyn PostStore>) -> Self {
        Self { posts }
    }
}

#[async_trait]
impl Participant for PostParticipant {
    fn resource_type(&self) -> &'static str {
        "post"
    }

    fn lock_key(&self, payload: &AdoptionPayload) -> LockKey {
        LockKey::Post {
            id: payload.post_id,
        }
    }

    async fn check_precondition(
        &self,
        payload: &AdoptionPayload,
        operation: Operation,
    ) -> Result<bool> {
        let post = self.posts.get(payload.post_id).await?;
        Ok(matches!(post, Some(p) if p.status == operation.required_status()))
    }

    async fn apply(&self, payload: &AdoptionPayload, operation: Operation) -> Result<()> {
        self.posts
            .update_status(payload.post_id, operation.resulting_status())
            .await
            .map_err(|e| CoordinatorError::Internal(e.to_string()))
    }
}

/// Participant owning the chat/event log
///
/// Precondition: always true; staging an event cannot conflict. Apply:
/// append the adoption event record to the room's log.
pub struct NotificationParticipant {
    events: Arc<dyn EventStore>,
}

impl NotificationParticipant {
    pub fn new(events: Arc<dyn EventStore>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl Participant for NotificationParticipant {
    fn resource_type(&self) -> &'static str {
        "notification"
    }

    fn lock_key(&self, payload: &AdoptionPayload) -> LockKey {
        LockKey::Room {
            name: payload.room.clone(),
        }
    }

    async fn check_precondition(
        &self,
        _payload: &AdoptionPayload,
        _operation: Operation,
    ) -> Result<bool> {
        Ok(true)
    }

    async fn apply(&self, payload: &AdoptionPayload, _operation: Operation) -> Result<()> {
        self.events
            .insert(ChatMessage::adoption_event(
                payload.username.clone(),
                payload.post_id,
                payload.room.clone(),
            ))
            .await
            .map_err(|e| CoordinatorError::Internal(e.to_string()))
    }
}
