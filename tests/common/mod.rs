#![allow(dead_code)]

use blogicum::{
    AppState,
    auth::{AuthUser, Viewer},
    config::AppConfig,
    models::{Category, CategoryForm, NewUser, Post, PostForm, User},
    repository::{InMemoryRepository, Repository, RepositoryState},
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub const ALICE_ID: Uuid = Uuid::from_u128(1);
pub const BOB_ID: Uuid = Uuid::from_u128(2);
pub const ADMIN_ID: Uuid = Uuid::from_u128(3);

/// Three accounts: two ordinary authors and a superuser.
pub struct Fixture {
    pub repo: Arc<InMemoryRepository>,
    pub alice: User,
    pub bob: User,
    pub admin: User,
}

impl Fixture {
    pub async fn new() -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let alice = seed_user(&repo, ALICE_ID, "alice", false).await;
        let bob = seed_user(&repo, BOB_ID, "bob", false).await;
        let admin = seed_user(&repo, ADMIN_ID, "admin", true).await;
        Self {
            repo,
            alice,
            bob,
            admin,
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            repo: self.repo.clone() as RepositoryState,
            config: AppConfig::default(),
        }
    }

    pub async fn category(&self, slug: &str, is_published: bool) -> Category {
        self.repo
            .create_category(CategoryForm {
                title: format!("Category {slug}"),
                description: "About things".to_string(),
                slug: slug.to_string(),
                is_published,
            })
            .await
            .expect("create category")
    }

    pub async fn post(&self, author: &User, form: PostForm) -> Post {
        self.repo
            .create_post(author.id, form)
            .await
            .expect("create post")
    }

    pub async fn refetch(&self, post_id: i64) -> Option<Post> {
        self.repo.get_post(post_id).await.expect("get post")
    }
}

pub async fn seed_user(repo: &InMemoryRepository, id: Uuid, username: &str, is_superuser: bool) -> User {
    repo.create_user(NewUser {
        id,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        is_superuser,
    })
    .await
    .expect("seed user")
}

pub fn auth(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        username: user.username.clone(),
        is_superuser: user.is_superuser,
    }
}

pub fn viewer(user: &User) -> Viewer {
    Viewer::User(auth(user))
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours)
}

pub fn hours_ahead(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}

/// A post that is publicly visible unless the caller changes something.
pub fn published_form(title: &str) -> PostForm {
    PostForm {
        title: title.to_string(),
        text: format!("Body of {title}"),
        pub_date: hours_ago(1),
        is_published: true,
        ..PostForm::default()
    }
}

pub fn draft_form(title: &str) -> PostForm {
    PostForm {
        is_published: false,
        ..published_form(title)
    }
}
