//! Two-phase-commit coordinator for adoptions
//!
//! An adoption must flip a post's availability and append a durable chat
//! event even though the two records live in independently owned stores with
//! no shared transaction manager. This crate drives a minimal 2PC over
//! per-resource TTL locks: prepare each participant (lock + precondition),
//! then commit (apply + release) or roll back (release).

mod coordinator;
mod error;
mod participant;
mod responses;
mod transaction;

pub use coordinator::{Coordinator, CoordinatorConfig};
pub use error::{CoordinatorError, Result};
pub use participant::{AdoptionPayload, NotificationParticipant, Participant, PostParticipant};
pub use responses::TransactionResponse;
pub use transaction::{Transaction, TransactionState};
