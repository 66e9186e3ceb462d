use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Nested under `/admin`. Handlers resolve `AuthUser` (anonymous callers are
/// redirected to login) and then require `is_superuser`, answering 403
/// otherwise.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(handlers::admin::list_categories).post(handlers::admin::create_category),
        )
        .route(
            "/categories/{id}",
            put(handlers::admin::update_category).delete(handlers::admin::delete_category),
        )
        .route(
            "/locations",
            get(handlers::admin::list_locations).post(handlers::admin::create_location),
        )
        .route(
            "/locations/{id}",
            put(handlers::admin::update_location).delete(handlers::admin::delete_location),
        )
}
