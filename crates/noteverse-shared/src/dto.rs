//! Data Transfer Objects - query parameters accepted by the API.

use serde::{Deserialize, Serialize};

/// Query string for `GET /posts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub author_id: Option<String>,
}

/// Query string for `DELETE /posts/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePostQuery {
    pub author_email: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
    pub timestamp: String,
}
