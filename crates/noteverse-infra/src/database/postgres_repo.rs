//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use noteverse_core::domain::{Post, PostPatch, UpdateAck};
use noteverse_core::error::RepoError;
use noteverse_core::ports::PostRepository;

use super::entity::post::{self, Entity as PostEntity};
use super::postgres_base::{PostgresBaseRepository, repo_err};

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_all(&self, author_id: Option<&str>) -> Result<Vec<Post>, RepoError> {
        let mut query = PostEntity::find();
        if let Some(author_id) = author_id {
            query = query.filter(post::Column::AuthorId.eq(author_id));
        }

        let result = query.all(&self.db).await.map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn update_fields(
        &self,
        id: Uuid,
        patch: &PostPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<UpdateAck, RepoError> {
        let mut update = PostEntity::update_many()
            .col_expr(
                post::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(updated_at)),
            )
            .filter(post::Column::Id.eq(id));

        if let Some(email) = &patch.author_email {
            update = update.col_expr(post::Column::AuthorEmail, Expr::value(email.clone()));
        }
        if let Some(title) = &patch.title {
            update = update.col_expr(post::Column::Title, Expr::value(title.clone()));
        }
        if let Some(content) = &patch.content {
            update = update.col_expr(post::Column::Content, Expr::value(content.clone()));
        }
        let extra = patch.extra_updates();
        if !extra.is_empty() {
            // jsonb `||` overwrites matching top-level keys and keeps the rest
            update = update.col_expr(
                post::Column::Extra,
                Expr::cust_with_exprs(
                    "$1 || $2",
                    [
                        Expr::col(post::Column::Extra).into(),
                        Expr::value(serde_json::Value::Object(extra)),
                    ],
                ),
            );
        }

        let result = update.exec(&self.db).await.map_err(repo_err)?;
        tracing::debug!(post_id = %id, rows = result.rows_affected, "Applied post patch");

        Ok(UpdateAck::new(result.rows_affected, result.rows_affected))
    }
}
