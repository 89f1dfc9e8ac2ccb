//! # rr-api
//!
//! The web routing layer for Rusty-Reader. Read-only JSON endpoints over the
//! feed and analytics engine in `rr-core`.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Configures the routes for the analytics API.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .route("/", web::get().to(handlers::index))
            .route("/feed", web::get().to(handlers::feed))
            // Author dashboard
            .route("/authors/{author_id}/top-posts", web::get().to(handlers::top_posts))
            .route("/authors/{author_id}/summary", web::get().to(handlers::author_summary))
            // Reader dashboard
            .route("/readers/{reader_id}/topics", web::get().to(handlers::reader_topics))
            .route("/readers/{reader_id}/daily-views", web::get().to(handlers::daily_views))
            .route("/readers/{reader_id}/streak", web::get().to(handlers::reading_streak))
            .route("/readers/{reader_id}/summary", web::get().to(handlers::reader_summary)),
    );
}
