use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, IngredientDto};

#[derive(Deserialize)]
pub struct IngredientFilterQuery {
    /// Case-insensitive name prefix.
    pub name: Option<String>,
}

/// GET /ingredients
/// Catalog listing; deliberately unpaginated.
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IngredientFilterQuery>,
) -> Result<Json<ApiResponse<Vec<IngredientDto>>>, ApiError> {
    let models = state
        .store()
        .list_ingredients(params.name.as_deref())
        .await?;

    let dtos = models.into_iter().map(IngredientDto::from).collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /ingredients/{id}
pub async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<IngredientDto>>, ApiError> {
    let model = state
        .store()
        .get_ingredient(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient", id))?;

    Ok(Json(ApiResponse::success(IngredientDto::from(model))))
}
