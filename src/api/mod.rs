use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::ImageService;
use crate::state::SharedState;

pub mod auth;
mod error;
mod ingredients;
mod pagination;
mod recipes;
mod shortlink;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub image_service: Arc<ImageService>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

pub async fn create_app_state(shared: Arc<SharedState>) -> anyhow::Result<Arc<AppState>> {
    let media_path = shared.config.read().await.general.media_path.clone();
    let image_service = Arc::new(ImageService::new(media_path));

    Ok(Arc::new(AppState {
        shared,
        image_service,
    }))
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (media_path, cors_origins) = {
        let config = state.config().read().await;
        (
            config.general.media_path.clone(),
            config.server.cors_allowed_origins.clone(),
        )
    };

    let api_router = Router::new()
        .route("/users", get(users::list_users).post(users::signup))
        .route("/users/me", get(users::me))
        .route(
            "/users/me/avatar",
            put(users::put_avatar).delete(users::delete_avatar),
        )
        .route("/users/set_password", post(users::set_password))
        .route("/users/subscriptions", get(users::list_subscriptions))
        .route("/users/{id}", get(users::get_user))
        .route(
            "/users/{id}/subscribe",
            post(users::subscribe).delete(users::unsubscribe),
        )
        .route("/ingredients", get(ingredients::list_ingredients))
        .route("/ingredients/{id}", get(ingredients::get_ingredient))
        .route(
            "/recipes",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipes/download_shopping_cart",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/recipes/{id}",
            get(recipes::get_recipe)
                .patch(recipes::update_recipe)
                .put(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route("/recipes/{id}/get-link", get(recipes::get_link))
        .route(
            "/recipes/{id}/favorite",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/recipes/{id}/shopping_cart",
            post(recipes::add_to_cart).delete(recipes::remove_from_cart),
        )
        .route("/auth/token/login", post(auth::login))
        .route("/auth/token/logout", post(auth::logout))
        .layer(middleware::from_fn_with_state(state.clone(), auth::identify))
        .with_state(state.clone());

    let shortlink_router = Router::new()
        .route("/s/{short_id}", get(shortlink::resolve_short_link))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .merge(shortlink_router)
        .nest_service("/media", tower_http::services::ServeDir::new(media_path))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
