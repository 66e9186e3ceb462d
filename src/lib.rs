use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod listing;
pub mod models;
pub mod policy;
pub mod repository;

// Routers split by access level (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, RepoError};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every page and form endpoint, served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::posts::index, handlers::posts::post_detail,
        handlers::posts::create_post_form, handlers::posts::create_post,
        handlers::posts::edit_post_form, handlers::posts::edit_post,
        handlers::posts::delete_post_confirm, handlers::posts::delete_post,
        handlers::comments::add_comment,
        handlers::comments::edit_comment_form, handlers::comments::edit_comment,
        handlers::comments::delete_comment_confirm, handlers::comments::delete_comment,
        handlers::profiles::profile,
        handlers::profiles::edit_profile_form, handlers::profiles::edit_profile,
        handlers::categories::category_posts,
        handlers::admin::list_categories, handlers::admin::create_category,
        handlers::admin::update_category, handlers::admin::delete_category,
        handlers::admin::list_locations, handlers::admin::create_location,
        handlers::admin::update_location, handlers::admin::delete_location,
    ),
    components(
        schemas(
            models::User, models::UserProfile, models::Category, models::Location,
            models::Post, models::Comment, models::PostForm, models::CommentForm,
            models::ProfileForm, models::CategoryForm, models::LocationForm,
            models::PostDetail, models::ProfilePage, models::CategoryPage,
        )
    ),
    tags(
        (name = "blogicum", description = "Blogicum blogging site")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable container of the services every request needs.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer.
    pub repo: RepositoryState,
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards `authenticated_routes`: if `AuthUser` cannot be resolved the
/// extractor rejects with a redirect to the login page before the handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routers, the request-id/tracing layers and the shared state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Superuser check happens inside the handlers.
        .nest("/admin", admin::admin_routes())
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// One `http_request` span per request, tagged with the `x-request-id` set above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
