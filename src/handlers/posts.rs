use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use chrono::Utc;

use crate::{
    AppState,
    auth::{AuthUser, Viewer},
    error::AppError,
    extract::FormBody,
    models::{Post, PostDetail, PostForm},
    policy,
    repository::{PostFilter, Repository},
    routes::{post_detail_url, profile_url},
};

/// load_post_for_mutation
///
/// The shared edit/delete state machine once the caller is authenticated:
/// missing post is NotFound, a non-author non-superuser is sent back to the
/// post's detail page, anyone else gets the post.
async fn load_post_for_mutation(
    repo: &dyn Repository,
    user: &AuthUser,
    post_id: i64,
) -> Result<Post, AppError> {
    let post = repo.get_post(post_id).await?.ok_or(AppError::NotFound)?;
    let viewer = Viewer::from(user.clone());
    policy::authorize_mutation(&viewer, &post, Some(post.id))
        .into_result()
        .inspect_err(|_| {
            tracing::info!(post_id, user_id = %user.id, "post mutation denied, redirecting to detail");
        })?;
    Ok(post)
}

/// Referenced category and location must exist (published or not).
async fn check_references(repo: &dyn Repository, form: &PostForm) -> Result<(), AppError> {
    if let Some(category_id) = form.category_id {
        if repo.get_category(category_id).await?.is_none() {
            return Err(AppError::validation("selected category does not exist"));
        }
    }
    if let Some(location_id) = form.location_id {
        if repo.get_location(location_id).await?.is_none() {
            return Err(AppError::validation("selected location does not exist"));
        }
    }
    Ok(())
}

/// index
///
/// [Public Route] The front page: every publicly visible post, newest first.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Published posts", body = [Post]))
)]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Post>>, AppError> {
    let posts = state
        .repo
        .published_posts(PostFilter::default(), Utc::now())
        .await?;
    Ok(Json(posts))
}

/// post_detail
///
/// [Public Route] A post with its comments. Hidden posts are reported as
/// missing unless the viewer is the author or a superuser.
#[utoipa::path(
    get,
    path = "/posts/{post_id}/",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = PostDetail),
        (status = 404, description = "Absent or hidden")
    )
)]
pub async fn post_detail(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<PostDetail>, AppError> {
    let now = Utc::now();
    let post = state
        .repo
        .get_post(post_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !policy::can_view_post(&viewer, &post, now) {
        tracing::debug!(post_id, "hidden post masked as not found");
        return Err(AppError::NotFound);
    }

    let comments = state.repo.list_comments(post.id).await?;
    Ok(Json(PostDetail {
        can_edit: policy::can_modify(&viewer, &post),
        can_comment: policy::can_comment(&viewer, &post, now),
        post,
        comments,
    }))
}

/// create_post_form
///
/// [Authenticated Route] Initial values for the create form.
#[utoipa::path(
    get,
    path = "/posts/create/",
    responses((status = 200, description = "Blank form", body = PostForm))
)]
pub async fn create_post_form(_user: AuthUser) -> Json<PostForm> {
    Json(PostForm::initial(Utc::now()))
}

/// create_post
///
/// [Authenticated Route] The caller becomes the author. Redirects to the
/// caller's profile.
#[utoipa::path(
    post,
    path = "/posts/create/",
    request_body(content = PostForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created, redirect to own profile"),
        (status = 422, description = "Invalid form")
    )
)]
pub async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    FormBody(form): FormBody<PostForm>,
) -> Result<Redirect, AppError> {
    form.validate()?;
    check_references(state.repo.as_ref(), &form).await?;

    let post = state.repo.create_post(user.id, form).await?;
    tracing::info!(post_id = post.id, author = %user.username, "post created");
    Ok(Redirect::to(&profile_url(&user.username)))
}

/// edit_post_form
///
/// [Authenticated Route] Current values of a post, for its author or a superuser.
#[utoipa::path(
    get,
    path = "/posts/{post_id}/edit/",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Edit form", body = PostForm),
        (status = 303, description = "Not allowed, redirect to detail"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn edit_post_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<PostForm>, AppError> {
    let post = load_post_for_mutation(state.repo.as_ref(), &user, post_id).await?;
    Ok(Json(PostForm::from(&post)))
}

/// edit_post
///
/// [Authenticated Route] Replaces a post's fields. The author never changes,
/// even when a superuser edits.
#[utoipa::path(
    post,
    path = "/posts/{post_id}/edit/",
    params(("post_id" = i64, Path, description = "Post ID")),
    request_body(content = PostForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated (or not allowed): redirect to detail"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid form")
    )
)]
pub async fn edit_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    FormBody(form): FormBody<PostForm>,
) -> Result<Redirect, AppError> {
    let post = load_post_for_mutation(state.repo.as_ref(), &user, post_id).await?;
    form.validate()?;
    check_references(state.repo.as_ref(), &form).await?;

    state
        .repo
        .update_post(post.id, form)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Redirect::to(&post_detail_url(post.id)))
}

/// delete_post_confirm
///
/// [Authenticated Route] Confirmation page for deleting a post.
#[utoipa::path(
    get,
    path = "/posts/{post_id}/delete/",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post to delete", body = Post),
        (status = 303, description = "Not allowed, redirect to detail"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post_confirm(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<Post>, AppError> {
    let post = load_post_for_mutation(state.repo.as_ref(), &user, post_id).await?;
    Ok(Json(post))
}

/// delete_post
///
/// [Authenticated Route] Deletes a post and its comments, then redirects to
/// the caller's profile.
#[utoipa::path(
    post,
    path = "/posts/{post_id}/delete/",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 303, description = "Deleted: redirect to own profile; not allowed: redirect to detail"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let post = load_post_for_mutation(state.repo.as_ref(), &user, post_id).await?;
    if !state.repo.delete_post(post.id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(post_id = post.id, by = %user.username, "post deleted");
    Ok(Redirect::to(&profile_url(&user.username)))
}
