use blogicum::{
    RepoError,
    models::{CategoryForm, CommentForm, NewUser, PostForm, User},
    repository::{PostFilter, PostgresRepository, Repository},
};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// --- Test Context and Setup ---

/// Holds the pool; every test writes rows with fresh ids/slugs so runs never collide.
struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

async fn create_test_user(repo: &PostgresRepository) -> User {
    let username = unique("user");
    repo.create_user(NewUser {
        id: Uuid::new_v4(),
        email: format!("{}@test.com", username),
        username,
        is_superuser: false,
    })
    .await
    .expect("Failed to create test user")
}

fn form(title: &str, hours_offset: i64, is_published: bool, category_id: Option<i64>) -> PostForm {
    PostForm {
        title: title.to_string(),
        text: "Integration body".to_string(),
        pub_date: Utc::now() + Duration::hours(hours_offset),
        is_published,
        category_id,
        ..PostForm::default()
    }
}

// --- Tests ---

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_published_posts_visibility_filter() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo).await;

    let hidden_category = repo
        .create_category(CategoryForm {
            title: "Hidden".to_string(),
            description: String::new(),
            slug: unique("hidden"),
            is_published: false,
        })
        .await
        .unwrap();

    let visible = repo.create_post(author.id, form("visible", -1, true, None)).await.unwrap();
    let draft = repo.create_post(author.id, form("draft", -1, false, None)).await.unwrap();
    let future = repo.create_post(author.id, form("future", 2, true, None)).await.unwrap();
    let filed = repo
        .create_post(author.id, form("filed", -1, true, Some(hidden_category.id)))
        .await
        .unwrap();

    let published: Vec<i64> = repo
        .published_posts(PostFilter::by_author(author.id), Utc::now())
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(published, vec![visible.id]);

    let all = repo.all_posts(PostFilter::by_author(author.id)).await.unwrap();
    let all_ids: Vec<i64> = all.iter().map(|p| p.id).collect();
    for id in [visible.id, draft.id, future.id, filed.id] {
        assert!(all_ids.contains(&id));
    }
    // Newest pub_date first.
    assert_eq!(all_ids[0], future.id);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_post_joins_and_comment_count() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo).await;
    let reader = create_test_user(&repo).await;

    let post = repo.create_post(author.id, form("joined", -1, true, None)).await.unwrap();
    assert_eq!(post.author_username, author.username);
    assert_eq!(post.comment_count, 0);
    assert_eq!(post.category_is_published, None);

    let comment = repo
        .create_comment(post.id, reader.id, CommentForm { text: "hello".to_string() })
        .await
        .unwrap();
    assert_eq!(comment.author_username, reader.username);

    let post = repo.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(post.comment_count, 1);

    let updated = repo
        .update_comment(comment.id, CommentForm { text: "edited".to_string() })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.text, "edited");
    assert_eq!(updated.author_username, reader.username);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_delete_post_cascades_comments() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo).await;

    let post = repo.create_post(author.id, form("gone", -1, true, None)).await.unwrap();
    let comment = repo
        .create_comment(post.id, author.id, CommentForm { text: "bye".to_string() })
        .await
        .unwrap();

    assert!(repo.delete_post(post.id).await.unwrap());
    assert!(repo.get_post(post.id).await.unwrap().is_none());
    assert!(repo.get_comment(comment.id).await.unwrap().is_none());
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_delete_category_nulls_post_reference() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo).await;

    let category = repo
        .create_category(CategoryForm {
            title: "Temp".to_string(),
            description: String::new(),
            slug: unique("temp"),
            is_published: true,
        })
        .await
        .unwrap();
    let post = repo
        .create_post(author.id, form("kept", -1, true, Some(category.id)))
        .await
        .unwrap();
    assert_eq!(post.category_slug.as_deref(), Some(category.slug.as_str()));

    assert!(repo.delete_category(category.id).await.unwrap());
    let post = repo.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(post.category_id, None);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_unique_constraints_map_to_conflict() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let first = create_test_user(&repo).await;

    let duplicate = repo
        .create_user(NewUser {
            id: Uuid::new_v4(),
            username: first.username.clone(),
            email: String::new(),
            is_superuser: false,
        })
        .await;
    assert!(matches!(duplicate, Err(RepoError::Conflict(ref c)) if c == "users_username_key"));

    let slug = unique("dup");
    let category = |slug: &str| CategoryForm {
        title: "Dup".to_string(),
        description: String::new(),
        slug: slug.to_string(),
        is_published: true,
    };
    repo.create_category(category(&slug)).await.unwrap();
    let again = repo.create_category(category(&slug)).await;
    assert!(matches!(again, Err(RepoError::Conflict(ref c)) if c == "categories_slug_key"));
}
