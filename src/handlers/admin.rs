use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::AppError,
    extract::JsonBody,
    models::{Category, CategoryForm, Location, LocationForm},
};

/// Admin routes have no parent post to fall back to: denial is fatal.
fn require_superuser(user: &AuthUser) -> Result<(), AppError> {
    if user.is_superuser {
        Ok(())
    } else {
        tracing::info!(user_id = %user.id, "admin access denied");
        Err(AppError::PermissionDenied)
    }
}

// --- Categories ---

/// list_categories
///
/// [Admin Route] Every category, published or not.
#[utoipa::path(
    get,
    path = "/admin/categories",
    responses(
        (status = 200, description = "All categories", body = [Category]),
        (status = 403, description = "Not a superuser")
    )
)]
pub async fn list_categories(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    require_superuser(&user)?;
    Ok(Json(state.repo.list_categories().await?))
}

/// create_category
#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CategoryForm,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 403, description = "Not a superuser"),
        (status = 409, description = "Slug taken")
    )
)]
pub async fn create_category(
    user: AuthUser,
    State(state): State<AppState>,
    JsonBody(form): JsonBody<CategoryForm>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    require_superuser(&user)?;
    form.validate()?;
    let category = state.repo.create_category(form).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// update_category
///
/// [Admin Route] Replaces a category; toggling `is_published` here hides or
/// reveals every post filed under it.
#[utoipa::path(
    put,
    path = "/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    request_body = CategoryForm,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 403, description = "Not a superuser"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(form): JsonBody<CategoryForm>,
) -> Result<Json<Category>, AppError> {
    require_superuser(&user)?;
    form.validate()?;
    state
        .repo
        .update_category(id, form)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

/// delete_category
///
/// [Admin Route] Posts filed under the category survive, uncategorised.
#[utoipa::path(
    delete,
    path = "/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not a superuser"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_superuser(&user)?;
    if state.repo.delete_category(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

// --- Locations ---

#[utoipa::path(
    get,
    path = "/admin/locations",
    responses(
        (status = 200, description = "All locations", body = [Location]),
        (status = 403, description = "Not a superuser")
    )
)]
pub async fn list_locations(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Location>>, AppError> {
    require_superuser(&user)?;
    Ok(Json(state.repo.list_locations().await?))
}

#[utoipa::path(
    post,
    path = "/admin/locations",
    request_body = LocationForm,
    responses(
        (status = 201, description = "Created", body = Location),
        (status = 403, description = "Not a superuser")
    )
)]
pub async fn create_location(
    user: AuthUser,
    State(state): State<AppState>,
    JsonBody(form): JsonBody<LocationForm>,
) -> Result<(StatusCode, Json<Location>), AppError> {
    require_superuser(&user)?;
    form.validate()?;
    let location = state.repo.create_location(form).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

#[utoipa::path(
    put,
    path = "/admin/locations/{id}",
    params(("id" = i64, Path, description = "Location ID")),
    request_body = LocationForm,
    responses(
        (status = 200, description = "Updated", body = Location),
        (status = 403, description = "Not a superuser"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_location(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(form): JsonBody<LocationForm>,
) -> Result<Json<Location>, AppError> {
    require_superuser(&user)?;
    form.validate()?;
    state
        .repo
        .update_location(id, form)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

#[utoipa::path(
    delete,
    path = "/admin/locations/{id}",
    params(("id" = i64, Path, description = "Location ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not a superuser"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_location(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_superuser(&user)?;
    if state.repo.delete_location(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
