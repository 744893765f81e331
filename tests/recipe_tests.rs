mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_recipe, png_data_uri, register_and_login, request, send, seed_ingredient,
    spawn_app,
};
use serde_json::json;

#[tokio::test]
async fn test_recipe_round_trip() {
    let (app, state) = spawn_app().await;

    let token = register_and_login(&app, "cook@example.com", "cook").await;
    let salt = seed_ingredient(&state, "Salt", "g").await;
    let flour = seed_ingredient(&state, "Flour", "g").await;

    let id = create_recipe(&app, &token, "Bread", &[(salt, 5), (flour, 200)], 90).await;

    let response = send(&app, request("GET", &format!("/api/recipes/{id}"), None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["name"], "Bread");
    assert_eq!(data["cooking_time"], 90);
    assert_eq!(data["author"]["username"], "cook");
    assert!(data["image"].as_str().unwrap().starts_with("/media/recipes/images/"));

    let ingredients = data["ingredients"].as_array().unwrap();
    assert_eq!(ingredients.len(), 2);

    let salt_row = ingredients
        .iter()
        .find(|i| i["name"] == "Salt")
        .expect("salt row present");
    assert_eq!(salt_row["id"].as_i64().unwrap(), i64::from(salt));
    assert_eq!(salt_row["measurement_unit"], "g");
    assert_eq!(salt_row["amount"], 5);

    let flour_row = ingredients
        .iter()
        .find(|i| i["name"] == "Flour")
        .expect("flour row present");
    assert_eq!(flour_row["amount"], 200);
}

#[tokio::test]
async fn test_recipe_create_requires_authentication() {
    let (app, _state) = spawn_app().await;

    let response = send(
        &app,
        request(
            "POST",
            "/api/recipes",
            None,
            Some(json!({
                "name": "Sneaky",
                "text": "no auth",
                "cooking_time": 5,
                "image": png_data_uri(),
                "ingredients": [{"id": 1, "amount": 1}],
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_recipe_create_validation() {
    let (app, state) = spawn_app().await;

    let token = register_and_login(&app, "strict@example.com", "strict").await;
    let salt = seed_ingredient(&state, "Salt", "g").await;

    let base = |overrides: serde_json::Value| {
        let mut payload = json!({
            "name": "Test dish",
            "text": "Some steps",
            "cooking_time": 10,
            "image": png_data_uri(),
            "ingredients": [{"id": salt, "amount": 5}],
        });
        payload
            .as_object_mut()
            .unwrap()
            .extend(overrides.as_object().unwrap().clone());
        payload
    };

    // Missing ingredients field
    let mut payload = base(json!({}));
    payload.as_object_mut().unwrap().remove("ingredients");
    let response = send(&app, request("POST", "/api/recipes", Some(&token), Some(payload))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Empty ingredient list
    let response = send(
        &app,
        request("POST", "/api/recipes", Some(&token), Some(base(json!({"ingredients": []})))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Duplicate ingredient ids
    let response = send(
        &app,
        request(
            "POST",
            "/api/recipes",
            Some(&token),
            Some(base(json!({"ingredients": [
                {"id": salt, "amount": 5},
                {"id": salt, "amount": 10},
            ]}))),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Non-positive amount
    let response = send(
        &app,
        request(
            "POST",
            "/api/recipes",
            Some(&token),
            Some(base(json!({"ingredients": [{"id": salt, "amount": 0}]}))),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown ingredient id
    let response = send(
        &app,
        request(
            "POST",
            "/api/recipes",
            Some(&token),
            Some(base(json!({"ingredients": [{"id": 99_999, "amount": 5}]}))),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Non-positive cooking time
    let response = send(
        &app,
        request("POST", "/api/recipes", Some(&token), Some(base(json!({"cooking_time": 0})))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing image
    let mut payload = base(json!({}));
    payload.as_object_mut().unwrap().remove("image");
    let response = send(&app, request("POST", "/api/recipes", Some(&token), Some(payload))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing slipped through
    let response = send(&app, request("GET", "/api/recipes", None, None)).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["count"], 0);
}

#[tokio::test]
async fn test_recipe_update_semantics() {
    let (app, state) = spawn_app().await;

    let token = register_and_login(&app, "owner@example.com", "owner").await;
    let salt = seed_ingredient(&state, "Salt", "g").await;
    let pepper = seed_ingredient(&state, "Pepper", "g").await;

    let id = create_recipe(&app, &token, "Soup", &[(salt, 5)], 30).await;

    let response = send(&app, request("GET", &format!("/api/recipes/{id}"), None, None)).await;
    let original_image = body_json(response).await["data"]["image"]
        .as_str()
        .unwrap()
        .to_string();

    // Omitting the ingredients field is rejected even on partial update.
    let response = send(
        &app,
        request(
            "PATCH",
            &format!("/api/recipes/{id}"),
            Some(&token),
            Some(json!({"name": "Renamed soup"})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Omitting the image leaves the stored image untouched.
    let response = send(
        &app,
        request(
            "PATCH",
            &format!("/api/recipes/{id}"),
            Some(&token),
            Some(json!({
                "name": "Pepper soup",
                "ingredients": [{"id": pepper, "amount": 3}],
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Pepper soup");
    assert_eq!(json["data"]["image"].as_str().unwrap(), original_image);

    let ingredients = json["data"]["ingredients"].as_array().unwrap();
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0]["name"], "Pepper");
    assert_eq!(ingredients[0]["amount"], 3);
}

#[tokio::test]
async fn test_recipe_mutation_is_author_only() {
    let (app, state) = spawn_app().await;

    let author_token = register_and_login(&app, "author@example.com", "author").await;
    let other_token = register_and_login(&app, "other@example.com", "other").await;
    let salt = seed_ingredient(&state, "Salt", "g").await;

    let id = create_recipe(&app, &author_token, "Mine", &[(salt, 1)], 10).await;

    let response = send(
        &app,
        request(
            "PATCH",
            &format!("/api/recipes/{id}"),
            Some(&other_token),
            Some(json!({
                "name": "Stolen",
                "ingredients": [{"id": salt, "amount": 2}],
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        request("DELETE", &format!("/api/recipes/{id}"), Some(&other_token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        request("DELETE", &format!("/api/recipes/{id}"), Some(&author_token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, request("GET", &format!("/api/recipes/{id}"), None, None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recipe_list_filters() {
    let (app, state) = spawn_app().await;

    let anna = register_and_login(&app, "anna@example.com", "anna").await;
    let boris = register_and_login(&app, "boris@example.com", "boris").await;
    let salt = seed_ingredient(&state, "Salt", "g").await;

    let borscht = create_recipe(&app, &anna, "Borscht", &[(salt, 5)], 60).await;
    let _bread = create_recipe(&app, &boris, "Bread", &[(salt, 3)], 90).await;

    // By author
    let response = send(&app, request("GET", "/api/recipes?author=1", None, None)).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["count"], 1);
    assert_eq!(json["data"]["results"][0]["author"]["username"], "anna");

    // Favorited filter for an authenticated caller
    let response = send(
        &app,
        request("POST", &format!("/api/recipes/{borscht}/favorite"), Some(&boris), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &app,
        request("GET", "/api/recipes?is_favorited=1", Some(&boris), None),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["count"], 1);
    assert_eq!(json["data"]["results"][0]["name"], "Borscht");
    assert_eq!(json["data"]["results"][0]["is_favorited"], true);

    // The same filter is a no-op for anonymous callers, not an error.
    let response = send(&app, request("GET", "/api/recipes?is_favorited=1", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let filtered = body_json(response).await;

    let response = send(&app, request("GET", "/api/recipes", None, None)).await;
    let unfiltered = body_json(response).await;

    assert_eq!(filtered["data"]["count"], unfiltered["data"]["count"]);
    assert_eq!(filtered["data"]["count"], 2);

    // Zero means no-op too.
    let response = send(
        &app,
        request("GET", "/api/recipes?is_favorited=0", Some(&boris), None),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["count"], 2);
}

#[tokio::test]
async fn test_recipe_list_pagination() {
    let (app, state) = spawn_app().await;

    let token = register_and_login(&app, "pager@example.com", "pager").await;
    let salt = seed_ingredient(&state, "Salt", "g").await;

    for n in 0..3 {
        let _ = create_recipe(&app, &token, &format!("Dish {n}"), &[(salt, 1)], 10).await;
    }

    let response = send(&app, request("GET", "/api/recipes?limit=2", None, None)).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["count"], 3);
    assert_eq!(json["data"]["total_pages"], 2);
    assert_eq!(json["data"]["results"].as_array().unwrap().len(), 2);

    // Newest first
    assert_eq!(json["data"]["results"][0]["name"], "Dish 2");

    let response = send(&app, request("GET", "/api/recipes?limit=2&page=2", None, None)).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["results"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["results"][0]["name"], "Dish 0");
}

#[tokio::test]
async fn test_short_link_round_trip() {
    let (app, state) = spawn_app().await;

    let token = register_and_login(&app, "linker@example.com", "linker").await;
    let salt = seed_ingredient(&state, "Salt", "g").await;
    let id = create_recipe(&app, &token, "Linked dish", &[(salt, 1)], 10).await;

    let response = send(
        &app,
        request("GET", &format!("/api/recipes/{id}/get-link"), None, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let link = json["data"]["short-link"].as_str().unwrap();
    let short_id = link.rsplit('/').next().unwrap();
    assert_eq!(i32::from_str_radix(short_id, 16).unwrap(), id);

    let response = send(&app, request("GET", &format!("/s/{short_id}"), None, None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()["location"],
        format!("/recipes/{id}").as_str()
    );
}

#[tokio::test]
async fn test_short_link_unknown_id_redirects_to_root() {
    let (app, _state) = spawn_app().await;

    // Well-formed id with no matching recipe
    let response = send(&app, request("GET", "/s/5f5e0ff", None, None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/");

    // Unparsable id
    let response = send(&app, request("GET", "/s/not-a-number", None, None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/");
}
