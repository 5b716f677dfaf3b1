//! CORS policy.

use actix_cors::Cors;

/// Build the CORS middleware.
///
/// With no configured origins every origin is allowed; otherwise only the
/// listed ones are.
pub fn build_cors(origins: &[String]) -> Cors {
    let cors = if origins.is_empty() {
        Cors::default().allow_any_origin()
    } else {
        origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allow_any_method().allow_any_header().max_age(3600)
}
