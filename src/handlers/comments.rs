use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use chrono::{DateTime, Utc};

use crate::{
    AppState,
    auth::{AuthUser, Viewer},
    error::AppError,
    extract::FormBody,
    models::{Comment, CommentForm},
    policy,
    repository::Repository,
    routes::post_detail_url,
};

/// create_comment
///
/// Adds a comment as `user`. A post the viewer may not comment on is
/// reported exactly like a post that does not exist.
///
/// `now` only decides whether the post is open for comments; the comment's
/// `created_at` is stamped by the store.
pub async fn create_comment(
    repo: &dyn Repository,
    user: &AuthUser,
    post_id: i64,
    form: CommentForm,
    now: DateTime<Utc>,
) -> Result<Comment, AppError> {
    let post = repo.get_post(post_id).await?.ok_or(AppError::NotFound)?;
    let viewer = Viewer::from(user.clone());
    if !policy::can_comment(&viewer, &post, now) {
        tracing::debug!(post_id, "comment on hidden post masked as not found");
        return Err(AppError::NotFound);
    }
    form.validate()?;

    Ok(repo.create_comment(post.id, user.id, form).await?)
}

/// Comment lookup scoped to its post, followed by the author-or-superuser check.
async fn load_comment_for_mutation(
    repo: &dyn Repository,
    user: &AuthUser,
    post_id: i64,
    comment_id: i64,
) -> Result<Comment, AppError> {
    let comment = repo
        .get_comment(comment_id)
        .await?
        .filter(|comment| comment.post_id == post_id)
        .ok_or(AppError::NotFound)?;

    let viewer = Viewer::from(user.clone());
    policy::authorize_mutation(&viewer, &comment, Some(post_id))
        .into_result()
        .inspect_err(|_| {
            tracing::info!(post_id, comment_id, user_id = %user.id, "comment mutation denied, redirecting to detail");
        })?;
    Ok(comment)
}

/// add_comment
///
/// [Authenticated Route] Posts a comment and returns to the post.
#[utoipa::path(
    post,
    path = "/posts/{post_id}/comment/",
    params(("post_id" = i64, Path, description = "Post ID")),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Comment added, redirect to detail"),
        (status = 404, description = "Absent or not open to this viewer"),
        (status = 422, description = "Empty comment")
    )
)]
pub async fn add_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    FormBody(form): FormBody<CommentForm>,
) -> Result<Redirect, AppError> {
    let comment = create_comment(state.repo.as_ref(), &user, post_id, form, Utc::now()).await?;
    Ok(Redirect::to(&post_detail_url(comment.post_id)))
}

/// edit_comment_form
#[utoipa::path(
    get,
    path = "/posts/{post_id}/edit_comment/{comment_id}/",
    params(
        ("post_id" = i64, Path, description = "Post ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Comment being edited", body = Comment),
        (status = 303, description = "Not allowed, redirect to detail"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn edit_comment_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Json<Comment>, AppError> {
    let comment = load_comment_for_mutation(state.repo.as_ref(), &user, post_id, comment_id).await?;
    Ok(Json(comment))
}

/// edit_comment
///
/// [Authenticated Route] Rewrites a comment's text.
#[utoipa::path(
    post,
    path = "/posts/{post_id}/edit_comment/{comment_id}/",
    params(
        ("post_id" = i64, Path, description = "Post ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated (or not allowed): redirect to detail"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Empty comment")
    )
)]
pub async fn edit_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    FormBody(form): FormBody<CommentForm>,
) -> Result<Redirect, AppError> {
    let comment = load_comment_for_mutation(state.repo.as_ref(), &user, post_id, comment_id).await?;
    form.validate()?;

    let updated = state
        .repo
        .update_comment(comment.id, form)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Redirect::to(&post_detail_url(updated.post_id)))
}

/// delete_comment_confirm
#[utoipa::path(
    get,
    path = "/posts/{post_id}/delete_comment/{comment_id}/",
    params(
        ("post_id" = i64, Path, description = "Post ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Comment to delete", body = Comment),
        (status = 303, description = "Not allowed, redirect to detail"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment_confirm(
    user: AuthUser,
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Json<Comment>, AppError> {
    let comment = load_comment_for_mutation(state.repo.as_ref(), &user, post_id, comment_id).await?;
    Ok(Json(comment))
}

/// delete_comment
///
/// [Authenticated Route] Removes a comment and returns to its post.
#[utoipa::path(
    post,
    path = "/posts/{post_id}/delete_comment/{comment_id}/",
    params(
        ("post_id" = i64, Path, description = "Post ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 303, description = "Deleted (or not allowed): redirect to detail"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Redirect, AppError> {
    let comment = load_comment_for_mutation(state.repo.as_ref(), &user, post_id, comment_id).await?;
    if !state.repo.delete_comment(comment.id).await? {
        return Err(AppError::NotFound);
    }
    Ok(Redirect::to(&post_detail_url(comment.post_id)))
}
