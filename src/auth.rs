use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::AppError,
    repository::RepositoryState,
};

/// Claims
///
/// Payload expected inside the bearer JWT. Tokens are minted by the login
/// service; this crate only validates them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's UUID, used to re-read the `users` row.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Using it as a handler
/// argument makes the route require login.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub is_superuser: bool,
}

/// Viewer
///
/// Whoever is looking at a page. Public routes take a `Viewer` so the
/// visibility rules can tell owners and superusers apart from everyone else.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(AuthUser),
}

impl Viewer {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Viewer::User(_))
    }
}

impl From<AuthUser> for Viewer {
    fn from(user: AuthUser) -> Self {
        Viewer::User(user)
    }
}

/// Builds `login_url?next=<path>` for the redirect sent to anonymous callers.
pub fn login_redirect(login_url: &str, next: &str) -> String {
    let next: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{}?next={}", login_url, next)
}

/// resolve_user
///
/// Shared resolution used by both extractors:
/// 1. `Env::Local` only: the `x-user-id` development bypass.
/// 2. `Authorization: Bearer <jwt>` decoding with expiry validation.
/// 3. A `users` lookup, so deleted accounts and changed flags take effect immediately.
async fn resolve_user(parts: &Parts, repo: &RepositoryState, config: &AppConfig) -> Option<AuthUser> {
    if config.env == Env::Local {
        let bypass = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|id| Uuid::parse_str(id).ok());
        if let Some(user_id) = bypass {
            if let Some(user) = lookup(repo, user_id).await {
                return Some(user);
            }
        }
    }

    let token = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))?;

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => data,
        Err(e) => {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                other => tracing::debug!("rejected token: {:?}", other),
            }
            return None;
        }
    };

    lookup(repo, token_data.claims.sub).await
}

async fn lookup(repo: &RepositoryState, user_id: Uuid) -> Option<AuthUser> {
    match repo.get_user(user_id).await {
        Ok(Some(user)) => Some(AuthUser {
            id: user.id,
            username: user.username,
            is_superuser: user.is_superuser,
        }),
        Ok(None) => None,
        Err(e) => {
            tracing::error!("user lookup failed: {:?}", e);
            None
        }
    }
}

/// Rejects with `AppError::Unauthenticated`, which redirects to the login
/// page and remembers the requested path in `next`.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        match resolve_user(parts, &repo, &config).await {
            Some(user) => Ok(user),
            None => {
                // Nested routers see a stripped URI; `OriginalUri` keeps the full one.
                let uri = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map(|original| &original.0)
                    .unwrap_or(&parts.uri);
                let next = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
                Err(AppError::Unauthenticated {
                    location: login_redirect(&config.login_url, next),
                })
            }
        }
    }
}

/// Never rejects: anything short of a valid identity is `Viewer::Anonymous`.
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        Ok(resolve_user(parts, &repo, &config)
            .await
            .map_or(Viewer::Anonymous, Viewer::User))
    }
}
