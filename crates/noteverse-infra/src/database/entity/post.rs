//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use noteverse_core::domain::{Attributes, Post};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: String,
    pub author_email: Option<String>,
    pub title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub extra: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for Post {
    fn from(model: Model) -> Self {
        let extra = match model.extra {
            Json::Object(map) => map,
            _ => Attributes::new(),
        };

        Self {
            id: model.id,
            author_id: model.author_id,
            author_email: model.author_email,
            title: model.title,
            content: model.content,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.map(Into::into),
            extra,
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<Post> for ActiveModel {
    fn from(post: Post) -> Self {
        Self {
            id: Set(post.id),
            author_id: Set(post.author_id),
            author_email: Set(post.author_email),
            title: Set(post.title),
            content: Set(post.content),
            extra: Set(Json::Object(post.extra)),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.map(Into::into)),
        }
    }
}
