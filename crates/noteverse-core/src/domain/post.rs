use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::DomainError;

/// Extra attributes carried verbatim alongside the known post fields.
pub type Attributes = Map<String, Value>;

/// Keys a client may never supply on create.
const RESERVED_ON_CREATE: &[&str] = &["id", "_id", "createdAt", "updatedAt"];

/// Keys a client may never supply on update.
const RESERVED_ON_UPDATE: &[&str] = &["id", "_id", "authorId", "createdAt", "updatedAt"];

/// Post entity - a user-authored note owned by an author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Attributes,
}

impl Post {
    /// Create a new post from a validated payload.
    ///
    /// The id is generated here and `created_at` is stamped with `now`;
    /// neither is ever taken from the client.
    pub fn new(draft: NewPost, now: DateTime<Utc>) -> Result<Self, DomainError> {
        draft.validate()?;
        let NewPost {
            author_id,
            author_email,
            title,
            content,
            extra,
        } = draft;

        Ok(Self {
            id: Uuid::new_v4(),
            author_id: author_id.unwrap_or_default(),
            author_email,
            title,
            content,
            created_at: now,
            updated_at: None,
            extra,
        })
    }

    /// Whether `credential` is allowed to mutate this post.
    ///
    /// A missing or empty credential, or a post without a stored email,
    /// always passes.
    pub fn permits(&self, credential: Option<&str>) -> bool {
        match (credential.filter(|c| !c.is_empty()), &self.author_email) {
            (Some(given), Some(stored)) => given == stored,
            _ => true,
        }
    }
}

/// Create payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.author_id.as_deref().is_none_or(str::is_empty) {
            return Err(DomainError::Validation("authorId is required".to_string()));
        }
        reject_reserved(&self.extra, RESERVED_ON_CREATE, "is server-assigned")
    }
}

/// Update payload. Every field is optional; only the ones present are merged.
///
/// A `null` value counts as absent, for known fields and extra attributes
/// alike, so a patch can never clear a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

impl PostPatch {
    pub fn validate(&self) -> Result<(), DomainError> {
        reject_reserved(&self.extra, RESERVED_ON_UPDATE, "cannot be updated")
    }

    /// The ownership credential carried by this patch, if any.
    pub fn credential(&self) -> Option<&str> {
        self.author_email.as_deref().filter(|e| !e.is_empty())
    }

    /// Extra attributes to write, with `null` entries dropped.
    pub fn extra_updates(&self) -> Attributes {
        self.extra
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Merge this patch into `post` and stamp `updated_at`.
    pub fn apply_to(&self, post: &mut Post, now: DateTime<Utc>) {
        if let Some(email) = &self.author_email {
            post.author_email = Some(email.clone());
        }
        if let Some(title) = &self.title {
            post.title = Some(title.clone());
        }
        if let Some(content) = &self.content {
            post.content = Some(content.clone());
        }
        post.extra.extend(self.extra_updates());
        post.updated_at = Some(now);
    }
}

fn reject_reserved(extra: &Attributes, reserved: &[&str], reason: &str) -> Result<(), DomainError> {
    match reserved.iter().find(|key| extra.contains_key(**key)) {
        Some(key) => Err(DomainError::Validation(format!("field `{key}` {reason}"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored(email: Option<&str>) -> Post {
        let draft = NewPost {
            author_id: Some("a1".into()),
            author_email: email.map(Into::into),
            ..Default::default()
        };
        Post::new(draft, Utc::now()).unwrap()
    }

    #[test]
    fn test_new_post_requires_author_id() {
        let missing = NewPost::default();
        let empty = NewPost {
            author_id: Some(String::new()),
            ..Default::default()
        };

        for draft in [missing, empty] {
            match Post::new(draft, Utc::now()) {
                Err(DomainError::Validation(msg)) => assert_eq!(msg, "authorId is required"),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_new_post_rejects_client_timestamps() {
        let draft: NewPost =
            serde_json::from_value(json!({"authorId": "a1", "createdAt": "2001-01-01T00:00:00Z"}))
                .unwrap();
        assert!(matches!(draft.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_wire_shape_flattens_extra_fields() {
        let draft: NewPost =
            serde_json::from_value(json!({"authorId": "a1", "title": "x", "tags": ["rust"]}))
                .unwrap();
        let post = Post::new(draft, Utc::now()).unwrap();

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["authorId"], "a1");
        assert_eq!(value["title"], "x");
        assert_eq!(value["tags"], json!(["rust"]));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_none());
        assert!(value.get("authorEmail").is_none());
    }

    #[test]
    fn test_patch_rejects_server_owned_fields() {
        for key in ["id", "_id", "authorId", "createdAt", "updatedAt"] {
            let mut raw = Attributes::new();
            raw.insert(key.to_string(), json!("x"));
            let patch: PostPatch = serde_json::from_value(Value::Object(raw)).unwrap();
            assert!(patch.validate().is_err(), "{key} should be rejected");
        }
    }

    #[test]
    fn test_patch_merges_only_present_fields() {
        let mut post = stored(Some("e1"));
        post.title = Some("old".into());
        post.content = Some("body".into());

        let patch: PostPatch =
            serde_json::from_value(json!({"title": "new", "mood": "happy"})).unwrap();
        let now = Utc::now();
        patch.apply_to(&mut post, now);

        assert_eq!(post.title.as_deref(), Some("new"));
        assert_eq!(post.content.as_deref(), Some("body"));
        assert_eq!(post.author_email.as_deref(), Some("e1"));
        assert_eq!(post.extra["mood"], "happy");
        assert_eq!(post.updated_at, Some(now));
    }

    #[test]
    fn test_patch_nulls_are_ignored() {
        let mut post = stored(Some("e1"));
        post.title = Some("kept".into());
        post.extra.insert("tags".into(), json!(["a"]));

        let patch: PostPatch =
            serde_json::from_value(json!({"title": null, "tags": null, "mood": null})).unwrap();
        assert!(patch.extra_updates().is_empty());

        patch.apply_to(&mut post, Utc::now());
        assert_eq!(post.title.as_deref(), Some("kept"));
        assert_eq!(post.extra["tags"], json!(["a"]));
        assert!(!post.extra.contains_key("mood"));
    }

    #[test]
    fn test_permits() {
        let owned = stored(Some("e1"));
        assert!(owned.permits(None));
        assert!(owned.permits(Some("")));
        assert!(owned.permits(Some("e1")));
        assert!(!owned.permits(Some("e2")));

        let unowned = stored(None);
        assert!(unowned.permits(Some("e2")));
    }
}
