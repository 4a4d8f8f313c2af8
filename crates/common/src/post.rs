//! Animal post records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability status of an animal post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Post is open for adoption
    Available,
    /// Animal has been adopted
    Unavailable,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostStatus::Available => write!(f, "available"),
            PostStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// A found/lost animal post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalPost {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub status: PostStatus,
}

impl AnimalPost {
    /// Create a new available post
    pub fn new(
        id: u64,
        title: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            location: location.into(),
            status: PostStatus::Available,
        }
    }
}
