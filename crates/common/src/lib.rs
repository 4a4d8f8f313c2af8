//! Common types shared across the shelter platform crates

mod message;
mod operation;
mod post;
mod transaction_id;

pub use message::ChatMessage;
pub use operation::Operation;
pub use post::{AnimalPost, PostStatus};
pub use transaction_id::TransactionId;
