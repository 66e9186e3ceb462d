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
    listing,
    models::{ProfileForm, ProfilePage, UserProfile},
    routes::profile_url,
};

/// profile
///
/// [Public Route] A user's page. The owner also sees drafts and scheduled posts.
#[utoipa::path(
    get,
    path = "/profile/{username}/",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Profile and posts", body = ProfilePage),
        (status = 404, description = "No such user")
    )
)]
pub async fn profile(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ProfilePage>, AppError> {
    let (owner, posts) =
        listing::list_for_profile(state.repo.as_ref(), &viewer, &username, Utc::now()).await?;
    Ok(Json(ProfilePage {
        profile: UserProfile::from(owner),
        posts,
    }))
}

/// edit_profile_form
///
/// [Authenticated Route] The caller's current profile fields.
#[utoipa::path(
    get,
    path = "/profile/edit/",
    responses((status = 200, description = "Profile form", body = ProfileForm))
)]
pub async fn edit_profile_form(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileForm>, AppError> {
    let account = state
        .repo
        .get_user(user.id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(ProfileForm::from(&account)))
}

/// edit_profile
///
/// [Authenticated Route] Updates the caller's own profile. The redirect uses
/// the username as saved, which may just have changed.
#[utoipa::path(
    post,
    path = "/profile/edit/",
    request_body(content = ProfileForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Saved, redirect to own profile"),
        (status = 409, description = "Username taken"),
        (status = 422, description = "Invalid form")
    )
)]
pub async fn edit_profile(
    user: AuthUser,
    State(state): State<AppState>,
    FormBody(form): FormBody<ProfileForm>,
) -> Result<Redirect, AppError> {
    form.validate()?;
    let updated = state
        .repo
        .update_profile(user.id, form)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Redirect::to(&profile_url(&updated.username)))
}
