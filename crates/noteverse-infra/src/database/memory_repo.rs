//! In-memory post repository - used when no database is configured, and in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use noteverse_core::domain::{Post, PostPatch, UpdateAck};
use noteverse_core::error::RepoError;
use noteverse_core::ports::{BaseRepository, PostRepository};

/// Post store backed by a `Vec` behind an async RwLock.
///
/// Posts are listed in insertion order. Data is lost on process restart.
pub struct InMemoryPostRepository {
    posts: RwLock<Vec<Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, entity: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.iter().any(|p| p.id == entity.id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        posts.push(entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<u64, RepoError> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok((before - posts.len()) as u64)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_all(&self, author_id: Option<&str>) -> Result<Vec<Post>, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts
            .iter()
            .filter(|p| author_id.is_none_or(|a| p.author_id == a))
            .cloned()
            .collect())
    }

    async fn update_fields(
        &self,
        id: Uuid,
        patch: &PostPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<UpdateAck, RepoError> {
        let mut posts = self.posts.write().await;
        match posts.iter_mut().find(|p| p.id == id) {
            Some(post) => {
                patch.apply_to(post, updated_at);
                Ok(UpdateAck::new(1, 1))
            }
            None => Ok(UpdateAck::new(0, 0)),
        }
    }
}
