use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{CurrentUser, MaybeUser};
use super::pagination::{PageQuery, total_pages};
use super::validation::{validate_amount, validate_cooking_time, validate_recipe_name};
use super::{
    ApiError, ApiResponse, AppState, IngredientAmountPayload, Paginated, RecipeDto,
    RecipeMinifiedDto, RecipePayload, ShortLinkDto, UserDto,
};
use crate::db::{InsertOutcome, RecipePageFilter};
use crate::models::recipe::{NewRecipe, NewRecipeIngredient, RecipeUpdate};
use crate::models::user::User;
use crate::services::image::RECIPE_IMAGE_DIR;
use crate::services::render_shopping_list;

#[derive(Deserialize)]
pub struct RecipeListQuery {
    pub author: Option<i32>,
    pub is_favorited: Option<u8>,
    pub is_in_shopping_cart: Option<u8>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// GET /recipes
/// The membership filters apply only for authenticated callers; anonymous
/// requests get the unfiltered set, not an error.
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Query(params): Query<RecipeListQuery>,
) -> Result<Json<ApiResponse<Paginated<RecipeDto>>>, ApiError> {
    let pagination = state.config().read().await.pagination.clone();
    let (page, per_page) = PageQuery {
        page: params.page,
        limit: params.limit,
    }
    .resolve(&pagination);

    let mut id_in: Option<Vec<i32>> = None;
    if let Some(user) = &viewer {
        if params.is_favorited == Some(1) {
            id_in = Some(state.store().favorited_recipe_ids_for(user.id).await?);
        }
        if params.is_in_shopping_cart == Some(1) {
            let cart = state.store().cart_recipe_ids_for(user.id).await?;
            id_in = Some(match id_in {
                Some(favorited) => favorited.into_iter().filter(|id| cart.contains(id)).collect(),
                None => cart,
            });
        }
    }

    let filter = RecipePageFilter {
        author_id: params.author,
        id_in,
        page,
        per_page,
    };

    let (count, rows) = state.store().page_recipes(&filter).await?;

    let recipe_ids: Vec<i32> = rows.iter().map(|(r, _)| r.id).collect();
    let author_ids: Vec<i32> = rows.iter().map(|(_, a)| a.id).collect();

    let mut amounts = state.store().recipe_ingredient_amounts(&recipe_ids).await?;

    let (favorited, in_cart, subscribed) = match &viewer {
        Some(user) => (
            state.store().favorited_among(user.id, &recipe_ids).await?,
            state.store().in_cart_among(user.id, &recipe_ids).await?,
            state.store().subscribed_among(user.id, &author_ids).await?,
        ),
        None => (HashSet::new(), HashSet::new(), HashSet::new()),
    };

    let mut results = Vec::with_capacity(rows.len());
    for (recipe, author) in rows {
        let author = User::from(author);
        let author_dto = UserDto::from_user(&author, subscribed.contains(&author.id));
        let ingredients = amounts.remove(&recipe.id).unwrap_or_default();

        results.push(RecipeDto::from_model(
            &recipe,
            &ingredients,
            author_dto,
            favorited.contains(&recipe.id),
            in_cart.contains(&recipe.id),
        ));
    }

    Ok(Json(ApiResponse::success(Paginated {
        count,
        total_pages: total_pages(count, per_page),
        results,
    })))
}

/// GET /recipes/{id}
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let dto = recipe_detail(&state, viewer.as_ref(), id).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// POST /recipes
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<RecipePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload
        .name
        .as_deref()
        .ok_or_else(|| ApiError::validation("Name is required"))?;
    validate_recipe_name(name)?;

    let text = payload
        .text
        .as_deref()
        .ok_or_else(|| ApiError::validation("Description is required"))?;

    let cooking_time = payload
        .cooking_time
        .ok_or_else(|| ApiError::validation("Cooking time is required"))?;
    validate_cooking_time(cooking_time)?;

    let ingredients = parse_ingredients(payload.ingredients.as_deref())?;
    ensure_ingredients_exist(&state, &ingredients).await?;

    // An image must be supplied on create.
    let image_uri = payload
        .image
        .as_deref()
        .ok_or_else(|| ApiError::validation("Image is required"))?;
    let decoded =
        crate::services::decode_data_uri(image_uri).map_err(|e| ApiError::validation(e.to_string()))?;
    let image = state
        .image_service
        .save(RECIPE_IMAGE_DIR, &decoded)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store recipe image: {e}")))?;

    let id = state
        .store()
        .create_recipe(NewRecipe {
            author_id: user.id,
            name: name.to_string(),
            image,
            text: text.to_string(),
            cooking_time,
            ingredients,
        })
        .await?;

    tracing::info!("Recipe {} created by {}", id, user.username);

    let dto = recipe_detail(&state, Some(&user), id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
}

/// PATCH|PUT /recipes/{id}
/// `ingredients` stays required input here even though the storage-level
/// update treats it as optional; omitting it is a caller mistake. Omitting
/// `image` keeps the stored image.
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let model = state
        .store()
        .get_recipe_model(id)
        .await?
        .ok_or_else(|| ApiError::recipe_not_found(id))?;

    if model.author_id != user.id {
        return Err(ApiError::permission_denied(
            "Only the author can modify a recipe",
        ));
    }

    let ingredients = parse_ingredients(payload.ingredients.as_deref())?;
    ensure_ingredients_exist(&state, &ingredients).await?;

    let name = match payload.name.as_deref() {
        Some(name) => Some(validate_recipe_name(name)?.to_string()),
        None => None,
    };
    let cooking_time = match payload.cooking_time {
        Some(minutes) => Some(validate_cooking_time(minutes)?),
        None => None,
    };

    let image = match payload.image.as_deref() {
        Some(uri) => {
            let decoded = crate::services::decode_data_uri(uri)
                .map_err(|e| ApiError::validation(e.to_string()))?;
            let relative = state
                .image_service
                .save(RECIPE_IMAGE_DIR, &decoded)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to store recipe image: {e}")))?;
            Some(relative)
        }
        None => None,
    };

    let updated = state
        .store()
        .update_recipe(
            id,
            RecipeUpdate {
                name,
                image,
                text: payload.text,
                cooking_time,
                ingredients: Some(ingredients),
            },
        )
        .await?;
    if !updated {
        return Err(ApiError::recipe_not_found(id));
    }

    let dto = recipe_detail(&state, Some(&user), id).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// DELETE /recipes/{id}
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let model = state
        .store()
        .get_recipe_model(id)
        .await?
        .ok_or_else(|| ApiError::recipe_not_found(id))?;

    if model.author_id != user.id {
        return Err(ApiError::permission_denied(
            "Only the author can delete a recipe",
        ));
    }

    state.store().delete_recipe(id).await?;

    tracing::info!("Recipe {} deleted by {}", id, user.username);

    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/{id}/favorite
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let model = state
        .store()
        .get_recipe_model(id)
        .await?
        .ok_or_else(|| ApiError::recipe_not_found(id))?;

    match state.store().add_favorite(user.id, model.id).await? {
        InsertOutcome::Duplicate => Err(ApiError::already_exists(
            "Recipe is already in favorites",
        )),
        InsertOutcome::Inserted => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(RecipeMinifiedDto::from(&model))),
        )),
    }
}

/// DELETE /recipes/{id}/favorite
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.store().remove_favorite(user.id, id).await?;
    if !removed {
        return Err(ApiError::NotFound("Recipe is not in favorites".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/{id}/shopping_cart
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let model = state
        .store()
        .get_recipe_model(id)
        .await?
        .ok_or_else(|| ApiError::recipe_not_found(id))?;

    match state.store().add_cart_recipe(user.id, model.id).await? {
        InsertOutcome::Duplicate => Err(ApiError::already_exists(
            "Recipe is already in the shopping cart",
        )),
        InsertOutcome::Inserted => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(RecipeMinifiedDto::from(&model))),
        )),
    }
}

/// DELETE /recipes/{id}/shopping_cart
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.store().remove_cart_recipe(user.id, id).await?;
    if !removed {
        return Err(ApiError::NotFound(
            "Recipe is not in the shopping cart".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /recipes/download_shopping_cart
/// Aggregated totals across the caller's cart as a text attachment.
pub async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let recipe_ids = state.store().cart_recipe_ids_for(user.id).await?;
    let items = state.store().aggregate_cart_ingredients(&recipe_ids).await?;
    let recipes = state.store().cart_recipe_briefs(&recipe_ids).await?;

    let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let content = render_shopping_list(&date, &items, &recipes);

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=shopping_cart.txt",
        ),
    ];

    Ok((headers, content))
}

/// GET /recipes/{id}/get-link
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<ShortLinkDto>>, ApiError> {
    let model = state
        .store()
        .get_recipe_model(id)
        .await?
        .ok_or_else(|| ApiError::recipe_not_found(id))?;

    let base = match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{host}"),
        None => state.config().read().await.server.public_url.clone(),
    };

    let short_link = format!("{base}/s/{:x}", model.id);

    Ok(Json(ApiResponse::success(ShortLinkDto { short_link })))
}

/// Full read model of one recipe, annotated for the viewer.
async fn recipe_detail(
    state: &Arc<AppState>,
    viewer: Option<&User>,
    id: i32,
) -> Result<RecipeDto, ApiError> {
    let recipe = state
        .store()
        .get_recipe(id)
        .await?
        .ok_or_else(|| ApiError::recipe_not_found(id))?;

    let author = state
        .store()
        .get_user(recipe.author_id)
        .await?
        .ok_or_else(|| ApiError::internal(format!("Author missing for recipe {id}")))?;

    let (is_subscribed, is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            state.store().is_subscribed(viewer.id, author.id).await?,
            !state
                .store()
                .favorited_among(viewer.id, &[recipe.id])
                .await?
                .is_empty(),
            !state
                .store()
                .in_cart_among(viewer.id, &[recipe.id])
                .await?
                .is_empty(),
        ),
        None => (false, false, false),
    };

    Ok(RecipeDto::from_recipe(
        &recipe,
        UserDto::from_user(&author, is_subscribed),
        is_favorited,
        is_in_shopping_cart,
    ))
}

/// Shared ingredient-list validation: the field is required, non-empty,
/// duplicate-free, and every amount is positive.
fn parse_ingredients(
    payload: Option<&[IngredientAmountPayload]>,
) -> Result<Vec<NewRecipeIngredient>, ApiError> {
    let items = payload.ok_or_else(|| ApiError::validation("Ingredients are required"))?;

    if items.is_empty() {
        return Err(ApiError::validation(
            "A recipe needs at least one ingredient",
        ));
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id) {
            return Err(ApiError::validation(format!(
                "Duplicate ingredient in recipe: {}",
                item.id
            )));
        }
        validate_amount(item.amount)?;
        out.push(NewRecipeIngredient {
            ingredient_id: item.id,
            amount: item.amount,
        });
    }

    Ok(out)
}

async fn ensure_ingredients_exist(
    state: &Arc<AppState>,
    ingredients: &[NewRecipeIngredient],
) -> Result<(), ApiError> {
    let ids: Vec<i32> = ingredients.iter().map(|i| i.ingredient_id).collect();
    let existing: HashSet<i32> = state
        .store()
        .existing_ingredient_ids(&ids)
        .await?
        .into_iter()
        .collect();

    for id in &ids {
        if !existing.contains(id) {
            return Err(ApiError::validation(format!("Unknown ingredient: {id}")));
        }
    }

    Ok(())
}
