//! Listing operations that combine a repository query with a policy decision.

use chrono::{DateTime, Utc};

use crate::{
    auth::Viewer,
    error::AppError,
    models::{Category, Post, User},
    policy::{self, ListingScope},
    repository::{PostFilter, Repository},
};

/// list_for_profile
///
/// Resolves `username` and lists their posts: everything for the owner,
/// publicly visible posts for anyone else.
pub async fn list_for_profile(
    repo: &dyn Repository,
    viewer: &Viewer,
    username: &str,
    now: DateTime<Utc>,
) -> Result<(User, Vec<Post>), AppError> {
    let owner = repo
        .get_user_by_username(username)
        .await?
        .ok_or(AppError::NotFound)?;

    let filter = PostFilter::by_author(owner.id);
    let posts = match policy::profile_scope(viewer, &owner.username) {
        ListingScope::AllPosts => repo.all_posts(filter).await?,
        ListingScope::PublishedOnly => repo.published_posts(filter, now).await?,
    };
    Ok((owner, posts))
}

/// list_for_category
///
/// An unpublished category is hidden from everyone on this path, superusers included.
pub async fn list_for_category(
    repo: &dyn Repository,
    slug: &str,
    now: DateTime<Utc>,
) -> Result<(Category, Vec<Post>), AppError> {
    let category = repo
        .get_category_by_slug(slug)
        .await?
        .filter(|category| category.is_published)
        .ok_or(AppError::NotFound)?;

    let posts = repo
        .published_posts(PostFilter::by_category(category.id), now)
        .await?;
    Ok((category, posts))
}
