use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::routes::post_detail_url;

/// RepoError
///
/// Failures raised by the persistence layer. Each repository call is a single
/// unit of work, so these surface straight to the calling handler.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A unique constraint rejected the write (username, category slug).
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return RepoError::Conflict(constraint);
            }
        }
        RepoError::Database(err)
    }
}

/// AppError
///
/// The failure taxonomy seen at the boundary of every request handler.
/// `NotFound` never distinguishes "absent" from "hidden".
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Page not found")]
    NotFound,

    #[error("Permission denied")]
    PermissionDenied,

    /// Soft-fail path for edit/delete of a post or comment: the viewer is sent
    /// back to the parent post instead of seeing an error page.
    #[error("Redirect to post {post_id}")]
    RedirectOnDenial { post_id: i64 },

    /// `location` is the fully built login URL, including `next`.
    #[error("Authentication required")]
    Unauthenticated { location: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repository(RepoError),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(what) => AppError::Conflict(what),
            other => AppError::Repository(other),
        }
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::RedirectOnDenial { post_id } => {
                return Redirect::to(&post_detail_url(post_id)).into_response();
            }
            AppError::Unauthenticated { location } => {
                return Redirect::to(&location).into_response();
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Page not found".to_string()),
            AppError::PermissionDenied => (StatusCode::FORBIDDEN, "Permission denied".to_string()),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Conflict(what) => (StatusCode::CONFLICT, format!("Already exists: {what}")),
            AppError::Repository(ref e) => {
                tracing::error!("repository failure: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
