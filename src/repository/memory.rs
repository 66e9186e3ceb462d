use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PostFilter, RepoResult, Repository};
use crate::{
    error::RepoError,
    models::{
        Category, CategoryForm, Comment, CommentForm, Location, LocationForm, NewUser, Post,
        PostForm, ProfileForm, User,
    },
    policy,
};

/// Un-joined post row; `Post` is assembled on read.
#[derive(Debug, Clone)]
struct PostRow {
    id: i64,
    title: String,
    text: String,
    pub_date: DateTime<Utc>,
    is_published: bool,
    created_at: DateTime<Utc>,
    author_id: Uuid,
    category_id: Option<i64>,
    location_id: Option<i64>,
    image: Option<String>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: i64,
    text: String,
    post_id: i64,
    author_id: Uuid,
    is_published: bool,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    categories: BTreeMap<i64, Category>,
    locations: BTreeMap<i64, Location>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn join_post(&self, row: &PostRow) -> Option<Post> {
        let author = self.users.get(&row.author_id)?;
        let category = row.category_id.and_then(|id| self.categories.get(&id));
        let location = row.location_id.and_then(|id| self.locations.get(&id));
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.post_id == row.id)
            .count() as i64;

        Some(Post {
            id: row.id,
            title: row.title.clone(),
            text: row.text.clone(),
            pub_date: row.pub_date,
            is_published: row.is_published,
            created_at: row.created_at,
            author_id: row.author_id,
            author_username: author.username.clone(),
            category_id: category.map(|c| c.id),
            category_slug: category.map(|c| c.slug.clone()),
            category_title: category.map(|c| c.title.clone()),
            category_is_published: category.map(|c| c.is_published),
            location_id: location.map(|l| l.id),
            location_name: location.map(|l| l.name.clone()),
            location_is_published: location.map(|l| l.is_published),
            image: row.image.clone(),
            comment_count,
        })
    }

    fn join_comment(&self, row: &CommentRow) -> Comment {
        Comment {
            id: row.id,
            text: row.text.clone(),
            post_id: row.post_id,
            author_id: row.author_id,
            author_username: self
                .users
                .get(&row.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            is_published: row.is_published,
            created_at: row.created_at,
        }
    }

    /// Filtered and ordered newest `pub_date` first.
    fn posts_where(&self, keep: impl Fn(&Post) -> bool) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .values()
            .filter_map(|row| self.join_post(row))
            .filter(|post| keep(post))
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        posts
    }

    fn slug_taken(&self, slug: &str, except: Option<i64>) -> bool {
        self.categories
            .values()
            .any(|c| c.slug == slug && Some(c.id) != except)
    }
}

/// InMemoryRepository
///
/// `Repository` over process-local tables, with the same cascade and
/// set-null rules as the relational schema. Used by the test suites.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(RepoError::Conflict("users_username_key".to_string()));
        }
        let created = User {
            id: user.id,
            username: user.username,
            email: user.email,
            is_superuser: user.is_superuser,
            date_joined: Utc::now(),
            ..User::default()
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_profile(&self, id: Uuid, form: ProfileForm) -> RepoResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let username = form.username.trim().to_string();
        if tables
            .users
            .values()
            .any(|u| u.username == username && u.id != id)
        {
            return Err(RepoError::Conflict("users_username_key".to_string()));
        }
        Ok(tables.users.get_mut(&id).map(|user| {
            user.username = username;
            user.first_name = form.first_name;
            user.last_name = form.last_name;
            user.email = form.email;
            user.clone()
        }))
    }

    // --- CATEGORIES ---

    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn get_category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut categories: Vec<Category> =
            self.tables.read().await.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }

    async fn create_category(&self, form: CategoryForm) -> RepoResult<Category> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&form.slug, None) {
            return Err(RepoError::Conflict("categories_slug_key".to_string()));
        }
        let category = Category {
            id: tables.next_id(),
            title: form.title.trim().to_string(),
            description: form.description,
            slug: form.slug,
            is_published: form.is_published,
            created_at: Utc::now(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: i64, form: CategoryForm) -> RepoResult<Option<Category>> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&form.slug, Some(id)) {
            return Err(RepoError::Conflict("categories_slug_key".to_string()));
        }
        Ok(tables.categories.get_mut(&id).map(|category| {
            category.title = form.title.trim().to_string();
            category.description = form.description;
            category.slug = form.slug;
            category.is_published = form.is_published;
            category.clone()
        }))
    }

    async fn delete_category(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(true)
    }

    // --- LOCATIONS ---

    async fn get_location(&self, id: i64) -> RepoResult<Option<Location>> {
        Ok(self.tables.read().await.locations.get(&id).cloned())
    }

    async fn list_locations(&self) -> RepoResult<Vec<Location>> {
        let mut locations: Vec<Location> =
            self.tables.read().await.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn create_location(&self, form: LocationForm) -> RepoResult<Location> {
        let mut tables = self.tables.write().await;
        let location = Location {
            id: tables.next_id(),
            name: form.name.trim().to_string(),
            is_published: form.is_published,
            created_at: Utc::now(),
        };
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn update_location(&self, id: i64, form: LocationForm) -> RepoResult<Option<Location>> {
        let mut tables = self.tables.write().await;
        Ok(tables.locations.get_mut(&id).map(|location| {
            location.name = form.name.trim().to_string();
            location.is_published = form.is_published;
            location.clone()
        }))
    }

    async fn delete_location(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.locations.remove(&id).is_none() {
            return Ok(false);
        }
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(true)
    }

    // --- POSTS ---

    async fn published_posts(&self, filter: PostFilter, now: DateTime<Utc>) -> RepoResult<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts_where(|post| {
            filter.matches(post) && policy::is_publicly_visible(post, now)
        }))
    }

    async fn all_posts(&self, filter: PostFilter) -> RepoResult<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts_where(|post| filter.matches(post)))
    }

    async fn get_post(&self, id: i64) -> RepoResult<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).and_then(|row| tables.join_post(row)))
    }

    async fn create_post(&self, author_id: Uuid, form: PostForm) -> RepoResult<Post> {
        let mut tables = self.tables.write().await;
        let row = PostRow {
            id: tables.next_id(),
            title: form.title.trim().to_string(),
            text: form.text,
            pub_date: form.pub_date,
            is_published: form.is_published,
            created_at: Utc::now(),
            author_id,
            category_id: form.category_id,
            location_id: form.location_id,
            image: form.image,
        };
        let post = tables
            .join_post(&row)
            .ok_or_else(|| RepoError::Database(sqlx::Error::RowNotFound))?;
        tables.posts.insert(row.id, row);
        Ok(post)
    }

    async fn update_post(&self, id: i64, form: PostForm) -> RepoResult<Option<Post>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.posts.get_mut(&id) else {
            return Ok(None);
        };
        row.title = form.title.trim().to_string();
        row.text = form.text;
        row.pub_date = form.pub_date;
        row.is_published = form.is_published;
        row.category_id = form.category_id;
        row.location_id = form.location_id;
        row.image = form.image;
        let row = row.clone();
        Ok(tables.join_post(&row))
    }

    async fn delete_post(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&id).is_none() {
            return Ok(false);
        }
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(true)
    }

    // --- COMMENTS ---

    async fn list_comments(&self, post_id: i64) -> RepoResult<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .map(|c| tables.join_comment(c))
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables.comments.get(&id).map(|c| tables.join_comment(c)))
    }

    async fn create_comment(
        &self,
        post_id: i64,
        author_id: Uuid,
        form: CommentForm,
    ) -> RepoResult<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) || !tables.users.contains_key(&author_id) {
            return Err(RepoError::Database(sqlx::Error::RowNotFound));
        }
        let row = CommentRow {
            id: tables.next_id(),
            text: form.text,
            post_id,
            author_id,
            is_published: true,
            created_at: Utc::now(),
        };
        let comment = tables.join_comment(&row);
        tables.comments.insert(row.id, row);
        Ok(comment)
    }

    async fn update_comment(&self, id: i64, form: CommentForm) -> RepoResult<Option<Comment>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.comments.get_mut(&id) else {
            return Ok(None);
        };
        row.text = form.text;
        let row = row.clone();
        Ok(Some(tables.join_comment(&row)))
    }

    async fn delete_comment(&self, id: i64) -> RepoResult<bool> {
        Ok(self.tables.write().await.comments.remove(&id).is_some())
    }
}
