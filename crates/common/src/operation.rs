//! Transaction operations over animal posts

use crate::post::PostStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An operation a transaction can apply to a post
///
/// Each variant names the status a post must be in before the operation and
/// the status it ends up in afterwards. Participants consult these instead of
/// hard-coding status strings, so adding an operation is a new variant here
/// plus whatever participant behavior it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Adopt an animal, taking the post off the market
    Adopt,
}

impl Operation {
    /// Status the post must have for the operation to be valid
    pub fn required_status(&self) -> PostStatus {
        match self {
            Operation::Adopt => PostStatus::Available,
        }
    }

    /// Status the post ends up with once the operation is applied
    pub fn resulting_status(&self) -> PostStatus {
        match self {
            Operation::Adopt => PostStatus::Unavailable,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Adopt => write!(f, "adopt"),
        }
    }
}
