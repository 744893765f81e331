use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, request::Parts},
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::models::user::User;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

/// The authenticated principal, inserted by the `identify` middleware.
#[derive(Clone)]
pub struct AuthUser(pub User);

/// The raw token key a request authenticated with; kept around so logout can
/// revoke exactly the presented token.
#[derive(Clone)]
pub struct AuthTokenKey(pub String);

// ============================================================================
// Middleware & extractors
// ============================================================================

/// Resolves the request's token (if any) to a user and stores it in request
/// extensions. Never rejects: read endpoints serve anonymous callers, and
/// handlers that need a principal use the `CurrentUser` extractor.
pub async fn identify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(key) = extract_token(&headers)
        && let Ok(Some(user)) = state.store().user_by_token(&key).await
    {
        tracing::Span::current().record("user_id", user.id);
        request.extensions_mut().insert(AuthUser(user));
        request.extensions_mut().insert(AuthTokenKey(key));
    }

    Ok(next.run(request).await)
}

/// Extract the token key from `Authorization: Token <key>` or
/// `Authorization: Bearer <key>`.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    auth_str
        .strip_prefix("Token ")
        .or_else(|| auth_str.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Required principal: rejects with 401 when the request is anonymous.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .map(|AuthUser(user)| Self(user.clone()))
            .ok_or_else(|| {
                ApiError::unauthorized("Authentication credentials were not provided")
            })
    }
}

/// Optional principal: anonymous callers get `None`, never an error.
pub struct MaybeUser(pub Option<User>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<AuthUser>()
                .map(|AuthUser(user)| user.clone()),
        ))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/token/login
/// Exchange email + password for an auth token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .store()
        .verify_user_password(&payload.email, &payload.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let auth_token = state.store().create_auth_token(user.id).await?;

    tracing::info!("Issued auth token for user: {}", user.username);

    Ok(Json(ApiResponse::success(TokenResponse { auth_token })))
}

/// POST /auth/token/logout
/// Revoke the token this request authenticated with.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    parts: axum::Extension<AuthTokenKey>,
) -> Result<impl IntoResponse, ApiError> {
    let axum::Extension(AuthTokenKey(key)) = parts;
    state.store().delete_auth_token(&key).await?;

    Ok(StatusCode::NO_CONTENT)
}
