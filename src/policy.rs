//! Visibility and authorization rules.
//!
//! Everything here is a pure function of the viewer, the target and `now`.
//! Handlers call these explicitly; nothing is read from ambient request state.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    auth::Viewer,
    error::AppError,
    models::{Comment, Post},
};

/// Anything with an owning author that may be edited or deleted.
pub trait Authored {
    fn author_id(&self) -> Uuid;
}

impl Authored for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

/// Outcome of an authorization check on a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    /// Denied, but a parent post is known: send the viewer back to it.
    DeniedRedirect { post_id: i64 },
    /// Denied with nowhere sensible to go.
    DeniedFatal,
}

impl Authorization {
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Authorization::Allowed => Ok(()),
            Authorization::DeniedRedirect { post_id } => Err(AppError::RedirectOnDenial { post_id }),
            Authorization::DeniedFatal => Err(AppError::PermissionDenied),
        }
    }
}

/// Which posts a listing may include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScope {
    /// Drafts, scheduled posts and posts under hidden categories included.
    AllPosts,
    PublishedOnly,
}

/// Effective visibility: published, due, and not filed under a hidden category.
/// A post without a category only needs the first two.
pub fn is_publicly_visible(post: &Post, now: DateTime<Utc>) -> bool {
    post.is_published && post.pub_date <= now && post.category_is_published.unwrap_or(true)
}

fn is_author<T: Authored>(viewer: &Viewer, target: &T) -> bool {
    viewer.user().is_some_and(|user| user.id == target.author_id())
}

/// True iff the viewer wrote the target or is a superuser. Anonymous viewers never qualify.
pub fn can_modify<T: Authored>(viewer: &Viewer, target: &T) -> bool {
    match viewer.user() {
        None => false,
        Some(user) => user.is_superuser || user.id == target.author_id(),
    }
}

/// Detail view access: the public rule, widened for the author and superusers.
pub fn can_view_post(viewer: &Viewer, post: &Post, now: DateTime<Utc>) -> bool {
    is_publicly_visible(post, now) || can_modify(viewer, post)
}

/// Commenting eligibility: the post is public or the viewer is its author.
/// Superuser status does not widen this rule.
pub fn can_comment(viewer: &Viewer, post: &Post, now: DateTime<Utc>) -> bool {
    viewer.is_authenticated() && (is_publicly_visible(post, now) || is_author(viewer, post))
}

/// authorize_mutation
///
/// Decides an edit/delete attempt. `parent_post_id` is the post the target
/// belongs to (the post itself for post mutations); without one a denial is fatal.
pub fn authorize_mutation<T: Authored>(
    viewer: &Viewer,
    target: &T,
    parent_post_id: Option<i64>,
) -> Authorization {
    if can_modify(viewer, target) {
        return Authorization::Allowed;
    }
    match parent_post_id {
        Some(post_id) => Authorization::DeniedRedirect { post_id },
        None => Authorization::DeniedFatal,
    }
}

/// The owner of a profile sees everything they wrote; everybody else sees
/// what is publicly visible.
pub fn profile_scope(viewer: &Viewer, profile_username: &str) -> ListingScope {
    match viewer.user() {
        Some(user) if user.username == profile_username => ListingScope::AllPosts,
        _ => ListingScope::PublishedOnly,
    }
}
