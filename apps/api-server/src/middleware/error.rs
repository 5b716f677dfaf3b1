//! Error handling - maps domain failures onto RFC 7807 responses.

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use noteverse_core::DomainError;
use noteverse_shared::ErrorResponse;
use std::fmt;

use crate::observability::tag_error;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Forbidden(String),
    Internal(String),
    /// Any of the above, answered with the ID of the request that failed.
    Tagged {
        error: Box<AppError>,
        request_id: String,
    },
}

impl AppError {
    /// Attach a request ID to the problem details of this error.
    pub fn with_request_id(self, request_id: impl Into<String>) -> Self {
        let error = match self {
            AppError::Tagged { error, .. } => error,
            other => Box::new(other),
        };
        AppError::Tagged {
            error,
            request_id: request_id.into(),
        }
    }

    fn problem(&self) -> ErrorResponse {
        match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Forbidden(detail) => ErrorResponse::forbidden(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error(detail)
            }
            AppError::Tagged { error, request_id } => error.problem().with_request_id(request_id),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::Tagged { error, .. } => fmt::Display::fmt(error, f),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Tagged { error, .. } => error.status_code(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.problem())
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, .. } => {
                AppError::NotFound(format!("{} not found", entity_type))
            }
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            DomainError::Forbidden => AppError::Forbidden("Not allowed".to_string()),
            // Store messages are passed through to the client
            DomainError::Store(msg) => AppError::Internal(msg),
        }
    }
}

/// Turn malformed JSON bodies into problem-details 400s.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tag_error(AppError::BadRequest(err.to_string()), req).into()
}

/// Turn malformed query strings into problem-details 400s.
pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tag_error(AppError::BadRequest(err.to_string()), req).into()
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
