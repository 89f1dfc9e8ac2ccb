//! Middleware for request logging and cross-origin access.

use actix_cors::Cors;
use actix_web::middleware::Logger;

/// Access log in the default format:
/// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}

// The dashboard UI may live on another origin; every endpoint is a GET.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET"])
        .max_age(3600)
}
