//! Post CRUD handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use noteverse_core::domain::{NewPost, PostPatch};
use noteverse_shared::dto::{DeletePostQuery, ListPostsQuery};

use crate::middleware::error::{AppError, AppResult};
use crate::observability::RequestId;
use crate::state::AppState;

/// A malformed id cannot name any post.
fn parse_post_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Post not found".to_string()))
}

/// GET /posts?authorId=
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
    request_id: RequestId,
) -> AppResult<HttpResponse> {
    request_id
        .scope(async move {
            let posts = state.posts.list(query.author_id.as_deref()).await?;
            Ok(HttpResponse::Ok().json(posts))
        })
        .await
}

/// GET /posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request_id: RequestId,
) -> AppResult<HttpResponse> {
    request_id
        .scope(async move {
            let id = parse_post_id(&path)?;
            let post = state.posts.get(id).await?;
            Ok(HttpResponse::Ok().json(post))
        })
        .await
}

/// POST /posts
pub async fn create_post(
    state: web::Data<AppState>,
    body: web::Json<NewPost>,
    request_id: RequestId,
) -> AppResult<HttpResponse> {
    request_id
        .scope(async move {
            let ack = state.posts.create(body.into_inner()).await?;
            Ok(HttpResponse::Ok().json(ack))
        })
        .await
}

/// PUT /posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PostPatch>,
    request_id: RequestId,
) -> AppResult<HttpResponse> {
    request_id
        .scope(async move {
            let id = parse_post_id(&path)?;
            let ack = state.posts.update(id, body.into_inner()).await?;
            Ok(HttpResponse::Ok().json(ack))
        })
        .await
}

/// DELETE /posts/{id}?authorEmail=
pub async fn delete_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DeletePostQuery>,
    request_id: RequestId,
) -> AppResult<HttpResponse> {
    request_id
        .scope(async move {
            let id = parse_post_id(&path)?;
            let ack = state.posts.delete(id, query.author_email.as_deref()).await?;
            Ok(HttpResponse::Ok().json(ack))
        })
        .await
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use serde_json::{Value, json};

    use crate::handlers::configure_routes;
    use crate::observability::RequestIdMiddleware;
    use crate::state::AppState;

    macro_rules! test_app {
        () => {
            test_app!(AppState::in_memory())
        };
        ($state:expr) => {
            test::init_service(
                App::new()
                    .wrap(RequestIdMiddleware)
                    .app_data(web::Data::new($state))
                    .configure(configure_routes),
            )
            .await
        };
    }

    /// Create a post and return its generated id.
    macro_rules! create {
        ($app:expr, $body:expr) => {{
            let req = test::TestRequest::post()
                .uri("/posts")
                .set_json($body)
                .to_request();
            let ack: Value = test::call_and_read_body_json(&$app, req).await;
            assert_eq!(ack["acknowledged"], true);
            ack["insertedId"].as_str().unwrap().to_string()
        }};
    }

    #[actix_rt::test]
    async fn test_create_requires_author_id() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/posts")
            .set_json(json!({"title": "x"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "authorId is required");
        assert_eq!(body["status"], 400);
    }

    #[actix_rt::test]
    async fn test_malformed_body_is_bad_request() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/posts")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_create_get_update_delete_scenario() {
        let app = test_app!();
        let id = create!(app, json!({"authorId": "a1", "title": "x"}));

        // Fetch returns the stored fields plus server-stamped ones
        let req = test::TestRequest::get().uri(&format!("/posts/{id}")).to_request();
        let post: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(post["id"], id.as_str());
        assert_eq!(post["authorId"], "a1");
        assert_eq!(post["title"], "x");
        assert!(post["createdAt"].is_string());
        assert!(post.get("updatedAt").is_none());

        // No stored email, so any supplied email passes and is merged
        let req = test::TestRequest::put()
            .uri(&format!("/posts/{id}"))
            .set_json(json!({"authorEmail": "e1"}))
            .to_request();
        let ack: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ack["matchedCount"], 1);
        assert_eq!(ack["modifiedCount"], 1);

        let req = test::TestRequest::delete()
            .uri(&format!("/posts/{id}?authorEmail=wrong"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Not allowed");

        let req = test::TestRequest::delete()
            .uri(&format!("/posts/{id}?authorEmail=e1"))
            .to_request();
        let ack: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ack["deletedCount"], 1);

        let req = test::TestRequest::get().uri(&format!("/posts/{id}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_update_ownership_and_bypass() {
        let app = test_app!();
        let id = create!(
            app,
            json!({"authorId": "a1", "authorEmail": "e1", "title": "x"})
        );

        let req = test::TestRequest::put()
            .uri(&format!("/posts/{id}"))
            .set_json(json!({"authorEmail": "e2", "title": "stolen"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        // Omitting the email skips the ownership check entirely
        let req = test::TestRequest::put()
            .uri(&format!("/posts/{id}"))
            .set_json(json!({"title": "y", "tags": ["a"]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri(&format!("/posts/{id}")).to_request();
        let post: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(post["title"], "y");
        assert_eq!(post["tags"], json!(["a"]));
        assert_eq!(post["authorEmail"], "e1");
        assert!(post["updatedAt"].is_string());
    }

    #[actix_rt::test]
    async fn test_update_cannot_touch_server_fields() {
        let app = test_app!();
        let id = create!(app, json!({"authorId": "a1"}));

        let req = test::TestRequest::put()
            .uri(&format!("/posts/{id}"))
            .set_json(json!({"createdAt": "2000-01-01T00:00:00Z"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_unknown_and_malformed_ids_are_not_found() {
        let app = test_app!();

        for uri in [
            format!("/posts/{}", uuid::Uuid::new_v4()),
            "/posts/not-an-id".to_string(),
        ] {
            let req = test::TestRequest::get().uri(&uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "GET {uri}");

            let req = test::TestRequest::put()
                .uri(&uri)
                .set_json(json!({"title": "x"}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "PUT {uri}");

            let req = test::TestRequest::delete().uri(&uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "DELETE {uri}");
        }
    }

    #[actix_rt::test]
    async fn test_list_filters_by_author() {
        let app = test_app!();
        create!(app, json!({"authorId": "a1"}));
        create!(app, json!({"authorId": "a2"}));
        create!(app, json!({"authorId": "a1"}));

        let req = test::TestRequest::get().uri("/posts").to_request();
        let all: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(all.len(), 3);

        let req = test::TestRequest::get().uri("/posts?authorId=a1").to_request();
        let mine: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|p| p["authorId"] == "a1"));

        let req = test::TestRequest::get().uri("/posts?authorId=zz").to_request();
        let none: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(none.is_empty());
    }

    #[actix_rt::test]
    async fn test_error_bodies_carry_request_id() {
        let app = test_app!();
        let id = create!(app, json!({"authorId": "a1", "authorEmail": "e1"}));

        let req = test::TestRequest::get()
            .uri(&format!("/posts/{}", uuid::Uuid::new_v4()))
            .insert_header(("X-Request-ID", "req-404"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["request_id"], "req-404");

        let req = test::TestRequest::delete()
            .uri(&format!("/posts/{id}?authorEmail=wrong"))
            .insert_header(("X-Request-ID", "req-403"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["request_id"], "req-403");

        // Generated IDs match the response header
        let req = test::TestRequest::post()
            .uri("/posts")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let header = resp.headers().get("x-request-id").unwrap().to_str().unwrap().to_string();
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["request_id"], header.as_str());
    }

    mod store_failure {
        use std::sync::Arc;

        use async_trait::async_trait;
        use chrono::{DateTime, Utc};
        use uuid::Uuid;

        use noteverse_core::PostGateway;
        use noteverse_core::domain::{Post, PostPatch, UpdateAck};
        use noteverse_core::error::RepoError;
        use noteverse_core::ports::{BaseRepository, PostRepository};

        use super::*;

        struct UnreachableStore;

        fn refused() -> RepoError {
            RepoError::Connection("connection refused".into())
        }

        #[async_trait]
        impl BaseRepository<Post, Uuid> for UnreachableStore {
            async fn find_by_id(&self, _id: Uuid) -> Result<Option<Post>, RepoError> {
                Err(refused())
            }

            async fn insert(&self, _entity: Post) -> Result<Post, RepoError> {
                Err(refused())
            }

            async fn delete(&self, _id: Uuid) -> Result<u64, RepoError> {
                Err(refused())
            }
        }

        #[async_trait]
        impl PostRepository for UnreachableStore {
            async fn find_all(&self, _author_id: Option<&str>) -> Result<Vec<Post>, RepoError> {
                Err(refused())
            }

            async fn update_fields(
                &self,
                _id: Uuid,
                _patch: &PostPatch,
                _updated_at: DateTime<Utc>,
            ) -> Result<UpdateAck, RepoError> {
                Err(refused())
            }
        }

        #[actix_rt::test]
        async fn test_store_failure_is_500_with_store_message() {
            let state = AppState {
                posts: PostGateway::new(Arc::new(UnreachableStore)),
                db: None,
            };
            let app = test_app!(state);
            let post_uri = format!("/posts/{}", Uuid::new_v4());

            let requests = [
                test::TestRequest::get().uri("/posts"),
                test::TestRequest::get().uri(&post_uri),
                test::TestRequest::post()
                    .uri("/posts")
                    .set_json(json!({"authorId": "a1"})),
                test::TestRequest::put().uri(&post_uri).set_json(json!({"title": "x"})),
                test::TestRequest::delete().uri(&post_uri),
            ];

            for req in requests {
                let resp = test::call_service(&app, req.to_request()).await;
                assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

                let body: Value = test::read_body_json(resp).await;
                assert_eq!(body["status"], 500);
                assert!(
                    body["detail"].as_str().unwrap().contains("connection refused"),
                    "unexpected detail: {body}"
                );
            }
        }
    }
}
