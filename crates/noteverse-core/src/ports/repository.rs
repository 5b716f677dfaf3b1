use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Post, PostPatch, UpdateAck};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, returning the number of rows removed.
    async fn delete(&self, id: ID) -> Result<u64, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// All posts, or only those owned by `author_id`. No ordering guarantee.
    async fn find_all(&self, author_id: Option<&str>) -> Result<Vec<Post>, RepoError>;

    /// Merge `patch` into the stored post in a single write.
    async fn update_fields(
        &self,
        id: Uuid,
        patch: &PostPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<UpdateAck, RepoError>;
}
