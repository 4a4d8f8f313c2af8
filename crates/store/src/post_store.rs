//! Post store interface and in-memory implementation

use crate::error::{Result, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use shelter_common::{AnimalPost, PostStatus};
use std::collections::HashMap;
use std::sync::Arc;

/// Relational store holding animal posts
///
/// The status field drives adoption preconditions, so updates to it go
/// through `update_status` rather than whole-record writes.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Fetch a post by id
    async fn get(&self, id: u64) -> Result<Option<AnimalPost>>;

    /// Insert a post, returning its id
    async fn insert(&self, post: AnimalPost) -> Result<u64>;

    /// Update the status of an existing post
    async fn update_status(&self, id: u64, status: PostStatus) -> Result<()>;

    /// Number of stored posts
    async fn count(&self) -> Result<u64>;
}

/// In-memory post store
#[derive(Default)]
pub struct MemoryPostStore {
    posts: Arc<Mutex<HashMap<u64, AnimalPost>>>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn get(&self, id: u64) -> Result<Option<AnimalPost>> {
        Ok(self.posts.lock().get(&id).cloned())
    }

    async fn insert(&self, post: AnimalPost) -> Result<u64> {
        let id = post.id;
        self.posts.lock().insert(id, post);
        Ok(id)
    }

    async fn update_status(&self, id: u64, status: PostStatus) -> Result<()> {
        let mut posts = self.posts.lock();
        let post = posts.get_mut(&id).ok_or(StoreError::PostNotFound(id))?;
        post.status = status;
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.posts.lock().len() as u64)
    }
}
