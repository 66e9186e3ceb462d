use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only pages open to anonymous visitors. Each handler takes a `Viewer`
/// (or nothing) and applies the visibility rules itself, so a hidden post or
/// category looks exactly like a missing one.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Front page: publicly visible posts, newest first.
        .route("/", get(handlers::posts::index))
        // GET /posts/{post_id}/
        // Detail with comments; authors and superusers also see hidden posts.
        .route("/posts/{post_id}/", get(handlers::posts::post_detail))
        // GET /profile/{username}/
        // The owner sees every post they wrote, others only visible ones.
        .route("/profile/{username}/", get(handlers::profiles::profile))
        // GET /category/{slug}/
        // 404 for unpublished categories, whoever asks.
        .route("/category/{slug}/", get(handlers::categories::category_posts))
}
