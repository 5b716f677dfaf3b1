//! Liveness endpoints.

use actix_web::{HttpResponse, web};
use noteverse_shared::dto::HealthResponse;

use crate::state::AppState;

/// GET /
pub async fn root() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("NoteVerse Server is running...")
}

/// Health check endpoint - returns server and store status.
///
/// GET /health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let (status, store) = match &state.db {
        Some(db) => match db.ping().await {
            Ok(()) => ("ok", "postgres"),
            Err(e) => {
                tracing::warn!("Database ping failed: {}", e);
                ("degraded", "postgres")
            }
        },
        None => ("ok", "memory"),
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: store.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
