use axum::{
    extract::{Path, State},
    response::Redirect,
};
use std::sync::Arc;

use super::AppState;

/// GET /s/{short_id}
/// Short ids are hex-encoded recipe ids (decimal digit strings parse too).
/// Anything that does not resolve to an existing recipe redirects to the
/// site root, never a 404.
pub async fn resolve_short_link(
    State(state): State<Arc<AppState>>,
    Path(short_id): Path<String>,
) -> Redirect {
    let Ok(recipe_id) = i32::from_str_radix(&short_id, 16) else {
        return Redirect::to("/");
    };

    match state.store().get_recipe_model(recipe_id).await {
        Ok(Some(recipe)) => Redirect::to(&format!("/recipes/{}", recipe.id)),
        _ => Redirect::to("/"),
    }
}
