use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;

use crate::{AppState, error::AppError, listing, models::CategoryPage};

/// category_posts
///
/// [Public Route] Publicly visible posts of a published category.
#[utoipa::path(
    get,
    path = "/category/{slug}/",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category and its posts", body = CategoryPage),
        (status = 404, description = "Absent or unpublished category")
    )
)]
pub async fn category_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryPage>, AppError> {
    let (category, posts) = listing::list_for_category(state.repo.as_ref(), &slug, Utc::now()).await?;
    Ok(Json(CategoryPage { category, posts }))
}
