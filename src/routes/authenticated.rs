use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Form pages (GET) and their submissions (POST). The router is wrapped in
/// the auth layer, and every handler also takes `AuthUser` so it has the
/// caller's identity for the author-or-superuser check.
///
/// Denied edits/deletes of posts and comments redirect to the post's detail page.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Posts ---
        .route(
            "/posts/create/",
            get(handlers::posts::create_post_form).post(handlers::posts::create_post),
        )
        .route(
            "/posts/{post_id}/edit/",
            get(handlers::posts::edit_post_form).post(handlers::posts::edit_post),
        )
        .route(
            "/posts/{post_id}/delete/",
            get(handlers::posts::delete_post_confirm).post(handlers::posts::delete_post),
        )
        // --- Comments ---
        .route(
            "/posts/{post_id}/comment/",
            axum::routing::post(handlers::comments::add_comment),
        )
        .route(
            "/posts/{post_id}/edit_comment/{comment_id}/",
            get(handlers::comments::edit_comment_form).post(handlers::comments::edit_comment),
        )
        .route(
            "/posts/{post_id}/delete_comment/{comment_id}/",
            get(handlers::comments::delete_comment_confirm)
                .post(handlers::comments::delete_comment),
        )
        // --- Profile ---
        .route(
            "/profile/edit/",
            get(handlers::profiles::edit_profile_form).post(handlers::profiles::edit_profile),
        )
}
