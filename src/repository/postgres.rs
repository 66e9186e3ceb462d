use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use uuid::Uuid;

use super::{PostFilter, RepoResult, Repository};
use crate::models::{
    Category, CategoryForm, Comment, CommentForm, Location, LocationForm, NewUser, Post, PostForm,
    ProfileForm, User,
};

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL through a shared `PgPool`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, is_superuser, date_joined";
const CATEGORY_COLUMNS: &str = "id, title, description, slug, is_published, created_at";
const LOCATION_COLUMNS: &str = "id, name, is_published, created_at";

/// The joined post projection, read from `source` (the table itself or a
/// CTE holding freshly written rows).
fn post_select(source: &str) -> String {
    format!(
        r#"
        SELECT
            p.id, p.title, p.text, p.pub_date, p.is_published, p.created_at,
            p.author_id, u.username AS author_username,
            p.category_id, c.slug AS category_slug, c.title AS category_title,
            c.is_published AS category_is_published,
            p.location_id, l.name AS location_name, l.is_published AS location_is_published,
            p.image,
            (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
        FROM {source} p
        JOIN users u ON u.id = p.author_id
        LEFT JOIN categories c ON c.id = p.category_id
        LEFT JOIN locations l ON l.id = p.location_id
        "#
    )
}

const COMMENT_SELECT: &str = r#"
    SELECT cm.id, cm.text, cm.post_id, cm.author_id, u.username AS author_username,
           cm.is_published, cm.created_at
    FROM comments cm
    JOIN users u ON u.id = cm.author_id
"#;

fn push_post_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: PostFilter) {
    if let Some(category_id) = filter.category_id {
        builder.push(" AND p.category_id = ");
        builder.push_bind(category_id);
    }
    if let Some(author_id) = filter.author_id {
        builder.push(" AND p.author_id = ");
        builder.push_bind(author_id);
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let query = format!(
            "INSERT INTO users (id, username, email, is_superuser) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(user.username)
            .bind(user.email)
            .bind(user.is_superuser)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_profile(&self, id: Uuid, form: ProfileForm) -> RepoResult<Option<User>> {
        let query = format!(
            "UPDATE users SET username = $2, first_name = $3, last_name = $4, email = $5 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(form.username.trim())
            .bind(form.first_name)
            .bind(form.last_name)
            .bind(form.email)
            .fetch_optional(&self.pool)
            .await?)
    }

    // --- CATEGORIES ---

    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>> {
        let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        Ok(sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1");
        Ok(sqlx::query_as::<_, Category>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY title ASC");
        Ok(sqlx::query_as::<_, Category>(&query)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_category(&self, form: CategoryForm) -> RepoResult<Category> {
        let query = format!(
            "INSERT INTO categories (title, description, slug, is_published) \
             VALUES ($1, $2, $3, $4) RETURNING {CATEGORY_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Category>(&query)
            .bind(form.title.trim())
            .bind(form.description)
            .bind(form.slug)
            .bind(form.is_published)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_category(&self, id: i64, form: CategoryForm) -> RepoResult<Option<Category>> {
        let query = format!(
            "UPDATE categories SET title = $2, description = $3, slug = $4, is_published = $5 \
             WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(form.title.trim())
            .bind(form.description)
            .bind(form.slug)
            .bind(form.is_published)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// `posts.category_id` is `ON DELETE SET NULL`.
    async fn delete_category(&self, id: i64) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- LOCATIONS ---

    async fn get_location(&self, id: i64) -> RepoResult<Option<Location>> {
        let query = format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1");
        Ok(sqlx::query_as::<_, Location>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_locations(&self) -> RepoResult<Vec<Location>> {
        let query = format!("SELECT {LOCATION_COLUMNS} FROM locations ORDER BY name ASC");
        Ok(sqlx::query_as::<_, Location>(&query)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_location(&self, form: LocationForm) -> RepoResult<Location> {
        let query = format!(
            "INSERT INTO locations (name, is_published) VALUES ($1, $2) RETURNING {LOCATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Location>(&query)
            .bind(form.name.trim())
            .bind(form.is_published)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_location(&self, id: i64, form: LocationForm) -> RepoResult<Option<Location>> {
        let query = format!(
            "UPDATE locations SET name = $2, is_published = $3 WHERE id = $1 \
             RETURNING {LOCATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Location>(&query)
            .bind(id)
            .bind(form.name.trim())
            .bind(form.is_published)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_location(&self, id: i64) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- POSTS ---

    /// published_posts
    ///
    /// The SQL rendition of effective visibility. Must stay in step with
    /// `policy::is_publicly_visible`.
    async fn published_posts(&self, filter: PostFilter, now: DateTime<Utc>) -> RepoResult<Vec<Post>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(post_select("posts"));
        builder.push(" WHERE p.is_published = true AND p.pub_date <= ");
        builder.push_bind(now);
        builder.push(" AND (p.category_id IS NULL OR c.is_published = true)");
        push_post_filter(&mut builder, filter);
        builder.push(" ORDER BY p.pub_date DESC, p.id DESC");

        Ok(builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn all_posts(&self, filter: PostFilter) -> RepoResult<Vec<Post>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(post_select("posts"));
        builder.push(" WHERE true");
        push_post_filter(&mut builder, filter);
        builder.push(" ORDER BY p.pub_date DESC, p.id DESC");

        Ok(builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_post(&self, id: i64) -> RepoResult<Option<Post>> {
        let query = format!("{} WHERE p.id = $1", post_select("posts"));
        Ok(sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// create_post
    ///
    /// Inserts and re-reads the joined projection in one statement (CTE).
    async fn create_post(&self, author_id: Uuid, form: PostForm) -> RepoResult<Post> {
        let query = format!(
            r#"
            WITH inserted AS (
                INSERT INTO posts (title, text, pub_date, is_published, author_id, category_id, location_id, image)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            )
            {}
            "#,
            post_select("inserted")
        );
        Ok(sqlx::query_as::<_, Post>(&query)
            .bind(form.title.trim())
            .bind(form.text)
            .bind(form.pub_date)
            .bind(form.is_published)
            .bind(author_id)
            .bind(form.category_id)
            .bind(form.location_id)
            .bind(form.image)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_post(&self, id: i64, form: PostForm) -> RepoResult<Option<Post>> {
        let query = format!(
            r#"
            WITH updated AS (
                UPDATE posts
                SET title = $2, text = $3, pub_date = $4, is_published = $5,
                    category_id = $6, location_id = $7, image = $8
                WHERE id = $1
                RETURNING *
            )
            {}
            "#,
            post_select("updated")
        );
        Ok(sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .bind(form.title.trim())
            .bind(form.text)
            .bind(form.pub_date)
            .bind(form.is_published)
            .bind(form.category_id)
            .bind(form.location_id)
            .bind(form.image)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// `comments.post_id` is `ON DELETE CASCADE`.
    async fn delete_post(&self, id: i64) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- COMMENTS ---

    async fn list_comments(&self, post_id: i64) -> RepoResult<Vec<Comment>> {
        let query = format!("{COMMENT_SELECT} WHERE cm.post_id = $1 ORDER BY cm.created_at ASC, cm.id ASC");
        Ok(sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        let query = format!("{COMMENT_SELECT} WHERE cm.id = $1");
        Ok(sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_comment(
        &self,
        post_id: i64,
        author_id: Uuid,
        form: CommentForm,
    ) -> RepoResult<Comment> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (post_id, author_id, text) VALUES ($1, $2, $3)
                RETURNING id, text, post_id, author_id, is_published, created_at
            )
            SELECT i.id, i.text, i.post_id, i.author_id, u.username AS author_username,
                   i.is_published, i.created_at
            FROM inserted i JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(form.text)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_comment(&self, id: i64, form: CommentForm) -> RepoResult<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            WITH updated AS (
                UPDATE comments SET text = $2 WHERE id = $1
                RETURNING id, text, post_id, author_id, is_published, created_at
            )
            SELECT up.id, up.text, up.post_id, up.author_id, u.username AS author_username,
                   up.is_published, up.created_at
            FROM updated up JOIN users u ON u.id = up.author_id
            "#,
        )
        .bind(id)
        .bind(form.text)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_comment(&self, id: i64) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
