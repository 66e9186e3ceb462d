/// Router Module Index
///
/// Routes are split by access level; authentication is applied per module
/// as a layer in `create_router`.

/// Anyone, anonymous included. Visibility is decided per handler.
pub mod public;

/// Requires a resolved `AuthUser`; anonymous callers are redirected to login.
pub mod authenticated;

/// Superuser-only management of categories and locations.
pub mod admin;

/// `/posts/{post_id}/`
pub fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

/// `/profile/{username}/`
pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}
