use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::RepoError,
    models::{
        Category, CategoryForm, Comment, CommentForm, Location, LocationForm, NewUser, Post,
        PostForm, ProfileForm, User,
    },
};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// PostFilter
///
/// Equality filters narrowing a post listing. Empty filter = every post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub category_id: Option<i64>,
    pub author_id: Option<Uuid>,
}

impl PostFilter {
    pub fn by_category(category_id: i64) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::default()
        }
    }

    pub fn by_author(author_id: Uuid) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.category_id.is_none_or(|id| post.category_id == Some(id))
            && self.author_id.is_none_or(|id| post.author_id == id)
    }
}

/// Repository Trait
///
/// Contract for every persistence operation. Each call is one atomic unit of
/// work; failures are returned, never retried.
///
/// Post listings are ordered newest `pub_date` first, comment listings oldest
/// `created_at` first.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    /// Conflict when the new username is taken.
    async fn update_profile(&self, id: Uuid, form: ProfileForm) -> RepoResult<Option<User>>;

    // --- Categories (admin-managed) ---
    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>>;
    async fn get_category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>>;
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn create_category(&self, form: CategoryForm) -> RepoResult<Category>;
    async fn update_category(&self, id: i64, form: CategoryForm) -> RepoResult<Option<Category>>;
    /// Posts filed under the category survive with a null reference.
    async fn delete_category(&self, id: i64) -> RepoResult<bool>;

    // --- Locations (admin-managed) ---
    async fn get_location(&self, id: i64) -> RepoResult<Option<Location>>;
    async fn list_locations(&self) -> RepoResult<Vec<Location>>;
    async fn create_location(&self, form: LocationForm) -> RepoResult<Location>;
    async fn update_location(&self, id: i64, form: LocationForm) -> RepoResult<Option<Location>>;
    async fn delete_location(&self, id: i64) -> RepoResult<bool>;

    // --- Posts ---
    /// Posts passing the effective-visibility rule at `now`.
    async fn published_posts(&self, filter: PostFilter, now: DateTime<Utc>) -> RepoResult<Vec<Post>>;
    /// Posts matching the filter regardless of publication state.
    async fn all_posts(&self, filter: PostFilter) -> RepoResult<Vec<Post>>;
    /// Raw lookup, no visibility check: callers apply the policy.
    async fn get_post(&self, id: i64) -> RepoResult<Option<Post>>;
    async fn create_post(&self, author_id: Uuid, form: PostForm) -> RepoResult<Post>;
    /// The author is left untouched.
    async fn update_post(&self, id: i64, form: PostForm) -> RepoResult<Option<Post>>;
    /// Cascades to the post's comments.
    async fn delete_post(&self, id: i64) -> RepoResult<bool>;

    // --- Comments ---
    async fn list_comments(&self, post_id: i64) -> RepoResult<Vec<Comment>>;
    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>>;
    async fn create_comment(
        &self,
        post_id: i64,
        author_id: Uuid,
        form: CommentForm,
    ) -> RepoResult<Comment>;
    async fn update_comment(&self, id: i64, form: CommentForm) -> RepoResult<Option<Comment>>;
    async fn delete_comment(&self, id: i64) -> RepoResult<bool>;
}

/// RepositoryState
///
/// Shared handle to the persistence layer held by `AppState`.
pub type RepositoryState = Arc<dyn Repository>;
