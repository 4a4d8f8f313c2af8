//! Lock key identifying what is being locked

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lock key identifying what is being locked
///
/// Rendered as the storage key `lock:<resource_type>:<resource_id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockKey {
    /// An animal post
    Post { id: u64 },
    /// A chat room's event log
    Room { name: String },
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKey::Post { id } => write!(f, "lock:post:{}", id),
            LockKey::Room { name } => write!(f, "lock:room:{}", name),
        }
    }
}
