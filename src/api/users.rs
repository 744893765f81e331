use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{CurrentUser, MaybeUser};
use super::pagination::{PageQuery, total_pages};
use super::validation::{validate_email, validate_password, validate_username};
use super::{
    ApiError, ApiResponse, AppState, AvatarRequest, AvatarResponse, Paginated, RecipeMinifiedDto,
    SetPasswordRequest, SignupRequest, UserDto, UserWithRecipesDto, media_url,
};
use crate::db::InsertOutcome;
use crate::models::user::{NewUser, User};
use crate::services::image::AVATAR_DIR;

#[derive(Deserialize)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Deserialize)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<u64>,
}

#[derive(Deserialize)]
pub struct SubscriptionListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub recipes_limit: Option<u64>,
}

/// POST /users
/// Signup. Duplicate email/username surfaces as a validation error, also
/// when a concurrent signup wins the unique-constraint race.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email(&payload.email)?;
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    if state.store().email_taken(&payload.email).await? {
        return Err(ApiError::validation(
            "A user with this email already exists",
        ));
    }
    if state.store().username_taken(&payload.username).await? {
        return Err(ApiError::validation(
            "A user with this username already exists",
        ));
    }

    let security = state.config().read().await.security.clone();
    let password = payload.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || {
        crate::db::repositories::user::hash_password(&password, Some(&security))
    })
    .await
    .map_err(|e| ApiError::internal(format!("Password hashing task panicked: {e}")))?
    .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))?;

    let user = state
        .store()
        .create_user(NewUser {
            email: payload.email,
            username: payload.username,
            first_name: payload.first_name,
            last_name: payload.last_name,
            password_hash,
        })
        .await?
        .ok_or_else(|| ApiError::validation("A user with this email or username already exists"))?;

    tracing::info!("User registered: {}", user.username);

    let dto = UserDto::from_user(&user, false);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Query(params): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Paginated<UserDto>>>, ApiError> {
    let pagination = state.config().read().await.pagination.clone();
    let (page, per_page) = PageQuery {
        page: params.page,
        limit: params.limit,
    }
    .resolve(&pagination);

    let (count, users) = state.store().page_users(page, per_page).await?;

    let subscribed = match &viewer {
        Some(viewer) => {
            let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
            state.store().subscribed_among(viewer.id, &ids).await?
        }
        None => std::collections::HashSet::new(),
    };

    let results = users
        .iter()
        .map(|u| UserDto::from_user(u, subscribed.contains(&u.id)))
        .collect();

    Ok(Json(ApiResponse::success(Paginated {
        count,
        total_pages: total_pages(count, per_page),
        results,
    })))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .store()
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(id))?;

    let is_subscribed = match &viewer {
        Some(viewer) => state.store().is_subscribed(viewer.id, user.id).await?,
        None => false,
    };

    Ok(Json(ApiResponse::success(UserDto::from_user(
        &user,
        is_subscribed,
    ))))
}

/// GET /users/me
pub async fn me(
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    Ok(Json(ApiResponse::success(UserDto::from_user(&user, false))))
}

/// POST /users/set_password
pub async fn set_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&payload.new_password)?;

    if payload.current_password == payload.new_password {
        return Err(ApiError::validation(
            "New password must be different from current password",
        ));
    }

    let verified = state
        .store()
        .verify_user_password(&user.email, &payload.current_password)
        .await?;
    if verified.is_none() {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    let security = state.config().read().await.security.clone();
    state
        .store()
        .set_user_password(user.id, &payload.new_password, &security)
        .await?;

    tracing::info!("Password changed for user: {}", user.username);

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /users/me/avatar
/// Accepts a data-URI image, validates it decodes, persists it under a
/// generated filename.
pub async fn put_avatar(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<AvatarRequest>,
) -> Result<Json<ApiResponse<AvatarResponse>>, ApiError> {
    let decoded = crate::services::decode_data_uri(&payload.avatar)
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let relative = state
        .image_service
        .save(AVATAR_DIR, &decoded)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store avatar: {e}")))?;

    let previous = state
        .store()
        .set_user_avatar(user.id, Some(relative.clone()))
        .await?;

    if let Some(previous) = previous {
        let _ = state.image_service.remove(&previous).await;
    }

    Ok(Json(ApiResponse::success(AvatarResponse {
        avatar: media_url(&relative),
    })))
}

/// DELETE /users/me/avatar
pub async fn delete_avatar(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let previous = state.store().set_user_avatar(user.id, None).await?;

    if let Some(previous) = previous {
        let _ = state.image_service.remove(&previous).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /users/{id}/subscribe
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(author_id): Path<i32>,
    Query(params): Query<RecipesLimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let author = state
        .store()
        .get_user(author_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(author_id))?;

    if user.id == author.id {
        return Err(ApiError::SelfReference(
            "Cannot subscribe to yourself".to_string(),
        ));
    }

    match state.store().subscribe(user.id, author.id).await? {
        InsertOutcome::Duplicate => Err(ApiError::already_exists(
            "Already subscribed to this author",
        )),
        InsertOutcome::Inserted => {
            let dto =
                build_user_with_recipes(&state, &author, true, params.recipes_limit).await?;
            Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
        }
    }
}

/// DELETE /users/{id}/subscribe
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(author_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let author = state
        .store()
        .get_user(author_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(author_id))?;

    let removed = state.store().unsubscribe(user.id, author.id).await?;
    if !removed {
        return Err(ApiError::NotFound(
            "Not subscribed to this author".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/subscriptions
/// Authors the caller follows, annotated with their recipes.
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<SubscriptionListQuery>,
) -> Result<Json<ApiResponse<Paginated<UserWithRecipesDto>>>, ApiError> {
    let pagination = state.config().read().await.pagination.clone();
    let (page, per_page) = PageQuery {
        page: params.page,
        limit: params.limit,
    }
    .resolve(&pagination);

    let (count, authors) = state
        .store()
        .page_subscribed_authors(user.id, page, per_page)
        .await?;

    let mut results = Vec::with_capacity(authors.len());
    for author in &authors {
        results.push(build_user_with_recipes(&state, author, true, params.recipes_limit).await?);
    }

    Ok(Json(ApiResponse::success(Paginated {
        count,
        total_pages: total_pages(count, per_page),
        results,
    })))
}

/// Annotate an author with their newest recipes (optionally truncated) and
/// total recipe count.
async fn build_user_with_recipes(
    state: &Arc<AppState>,
    author: &User,
    is_subscribed: bool,
    recipes_limit: Option<u64>,
) -> Result<UserWithRecipesDto, ApiError> {
    let models = state
        .store()
        .recent_recipes_for_author(author.id, recipes_limit)
        .await?;

    let counts = state.store().recipe_counts_by_authors(&[author.id]).await?;
    let recipes_count = counts.get(&author.id).copied().unwrap_or(0);

    Ok(UserWithRecipesDto {
        user: UserDto::from_user(author, is_subscribed),
        recipes: models.iter().map(RecipeMinifiedDto::from).collect(),
        recipes_count,
    })
}
