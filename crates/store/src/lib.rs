//! Store interfaces for the shelter platform
//!
//! The platform keeps posts, chat history, and locks in three independently
//! owned stores. This crate defines the trait seams the rest of the system
//! programs against, plus in-memory implementations used by tests and the
//! local demo.

mod error;
mod event_store;
mod kv_store;
mod post_store;

pub use error::{Result, StoreError};
pub use event_store::{EventStore, MemoryEventStore};
pub use kv_store::{KvStore, MemoryKvStore};
pub use post_store::{MemoryPostStore, PostStore};
