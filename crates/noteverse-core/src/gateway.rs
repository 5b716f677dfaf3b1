//! Post store gateway - ownership-gated CRUD over a [`PostRepository`].

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{DeleteAck, InsertAck, NewPost, Post, PostPatch, UpdateAck};
use crate::error::DomainError;
use crate::ports::PostRepository;

/// Translates post operations into repository calls.
///
/// Each mutating operation performs at most one ownership-check read
/// followed by one write. Nothing guards the gap between the two.
#[derive(Clone)]
pub struct PostGateway {
    repo: Arc<dyn PostRepository>,
}

impl PostGateway {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    /// List all posts, optionally only those owned by `author_id`.
    pub async fn list(&self, author_id: Option<&str>) -> Result<Vec<Post>, DomainError> {
        let author_id = author_id.filter(|a| !a.is_empty());
        tracing::debug!(author_id = ?author_id, "Listing posts");

        Ok(self.repo.find_all(author_id).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Post, DomainError> {
        tracing::debug!(post_id = %id, "Fetching post");

        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))
    }

    pub async fn create(&self, draft: NewPost) -> Result<InsertAck, DomainError> {
        let post = Post::new(draft, Utc::now())?;
        let saved = self.repo.insert(post).await?;

        tracing::info!(post_id = %saved.id, author_id = %saved.author_id, "Post created");
        Ok(InsertAck::new(saved.id))
    }

    /// Merge `patch` into the post, unless the patch carries an email that
    /// contradicts the stored owner.
    pub async fn update(&self, id: Uuid, patch: PostPatch) -> Result<UpdateAck, DomainError> {
        let existing = self.get(id).await?;
        patch.validate()?;

        if !existing.permits(patch.credential()) {
            tracing::warn!(
                post_id = %id,
                author_email = %mask_email(patch.credential().unwrap_or_default()),
                "Update rejected: author email mismatch"
            );
            return Err(DomainError::Forbidden);
        }

        let ack = self.repo.update_fields(id, &patch, Utc::now()).await?;
        tracing::info!(post_id = %id, matched = ack.matched_count, "Post updated");
        Ok(ack)
    }

    /// Delete the post, unless `author_email` contradicts the stored owner.
    pub async fn delete(
        &self,
        id: Uuid,
        author_email: Option<&str>,
    ) -> Result<DeleteAck, DomainError> {
        let existing = self.get(id).await?;

        if !existing.permits(author_email) {
            tracing::warn!(
                post_id = %id,
                author_email = %mask_email(author_email.unwrap_or_default()),
                "Delete rejected: author email mismatch"
            );
            return Err(DomainError::Forbidden);
        }

        let deleted = self.repo.delete(id).await?;
        tracing::info!(post_id = %id, deleted, "Post deleted");
        Ok(DeleteAck::new(deleted))
    }
}

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.len() > 1 => format!("{first}***"),
                _ => "***".to_string(),
            };
            format!("{masked_local}{domain}")
        }
        None => "***".to_string(),
    }
}
