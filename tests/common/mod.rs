#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use ladle::api::AppState;
use ladle::config::Config;
use std::sync::Arc;
use tower::ServiceExt;

/// Build the app over an in-memory database and a throwaway media dir.
/// Returns the state too so tests can seed reference data through the store.
pub async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.media_path = std::env::temp_dir()
        .join(format!("ladle-test-media-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .to_string();

    let state = ladle::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    let app = ladle::api::router(state.clone()).await;

    (app, state)
}

/// A 1x1 PNG wrapped in a data URI; valid input for every image endpoint.
pub fn png_data_uri() -> String {
    let mut buf = Vec::new();
    let img = image::RgbaImage::new(1, 1);
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(&buf))
}

pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Token {token}"));
    }

    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<axum::body::Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<axum::body::Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<axum::body::Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Sign up a user and return their auth token.
pub async fn register_and_login(app: &Router, email: &str, username: &str) -> String {
    let response = send(
        app,
        request(
            "POST",
            "/api/users",
            None,
            Some(serde_json::json!({
                "email": email,
                "username": username,
                "first_name": "Test",
                "last_name": "User",
                "password": "correct horse battery staple",
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        app,
        request(
            "POST",
            "/api/auth/token/login",
            None,
            Some(serde_json::json!({
                "email": email,
                "password": "correct horse battery staple",
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    json["data"]["auth_token"].as_str().unwrap().to_string()
}

/// Insert a catalog ingredient directly through the store.
pub async fn seed_ingredient(state: &Arc<AppState>, name: &str, unit: &str) -> i32 {
    let (model, _) = state
        .store()
        .get_or_create_ingredient(name, unit)
        .await
        .expect("Failed to seed ingredient");
    model.id
}

/// Create a recipe over the API and return its id.
pub async fn create_recipe(
    app: &Router,
    token: &str,
    name: &str,
    ingredients: &[(i32, i32)],
    cooking_time: i32,
) -> i32 {
    let ingredients: Vec<serde_json::Value> = ingredients
        .iter()
        .map(|(id, amount)| serde_json::json!({"id": id, "amount": amount}))
        .collect();

    let response = send(
        app,
        request(
            "POST",
            "/api/recipes",
            Some(token),
            Some(serde_json::json!({
                "name": name,
                "text": format!("How to cook {name}"),
                "cooking_time": cooking_time,
                "image": png_data_uri(),
                "ingredients": ingredients,
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    i32::try_from(json["data"]["id"].as_i64().unwrap()).unwrap()
}
