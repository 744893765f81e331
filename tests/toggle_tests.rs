mod common;

use axum::http::StatusCode;
use common::{
    body_json, body_text, create_recipe, register_and_login, request, send, seed_ingredient,
    spawn_app,
};
use ladle::cli::{IngredientSeed, load_ingredients};

#[tokio::test]
async fn test_favorite_toggle() {
    let (app, state) = spawn_app().await;

    let author = register_and_login(&app, "author@example.com", "author").await;
    let fan = register_and_login(&app, "fan@example.com", "fan").await;
    let salt = seed_ingredient(&state, "Salt", "g").await;
    let id = create_recipe(&app, &author, "Stew", &[(salt, 5)], 45).await;

    // First add: 201 with the minimal projection
    let response = send(
        &app,
        request("POST", &format!("/api/recipes/{id}/favorite"), Some(&fan), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let data = json["data"].as_object().unwrap();
    assert_eq!(data["id"].as_i64().unwrap(), i64::from(id));
    assert_eq!(data["name"], "Stew");
    assert_eq!(data["cooking_time"], 45);
    assert!(data["image"].as_str().unwrap().starts_with("/media/"));
    assert_eq!(data.len(), 4, "minimal projection only");

    // Second add: rejected as already present
    let response = send(
        &app,
        request("POST", &format!("/api/recipes/{id}/favorite"), Some(&fan), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("already"));

    // Remove: 204, then removing again is NotFound
    let response = send(
        &app,
        request("DELETE", &format!("/api/recipes/{id}/favorite"), Some(&fan), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        request("DELETE", &format!("/api/recipes/{id}/favorite"), Some(&fan), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favorite_requires_authentication() {
    let (app, state) = spawn_app().await;

    let author = register_and_login(&app, "author@example.com", "author").await;
    let salt = seed_ingredient(&state, "Salt", "g").await;
    let id = create_recipe(&app, &author, "Stew", &[(salt, 5)], 45).await;

    let response = send(
        &app,
        request("POST", &format!("/api/recipes/{id}/favorite"), None, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cart_toggle_unknown_recipe() {
    let (app, _state) = spawn_app().await;

    let token = register_and_login(&app, "empty@example.com", "empty").await;

    let response = send(
        &app,
        request("POST", "/api/recipes/12345/shopping_cart", Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        request("DELETE", "/api/recipes/12345/shopping_cart", Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_shopping_list_aggregation() {
    let (app, state) = spawn_app().await;

    let token = register_and_login(&app, "shopper@example.com", "shopper").await;
    let salt = seed_ingredient(&state, "Salt", "g").await;
    let water = seed_ingredient(&state, "Water", "ml").await;

    // Two cart recipes both using Salt (g): totals must merge to one line.
    let soup = create_recipe(&app, &token, "Soup", &[(salt, 5), (water, 500)], 30).await;
    let brine = create_recipe(&app, &token, "Brine", &[(salt, 10)], 10).await;

    for id in [soup, brine] {
        let response = send(
            &app,
            request("POST", &format!("/api/recipes/{id}/shopping_cart"), Some(&token), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send(
        &app,
        request("GET", "/api/recipes/download_shopping_cart", Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=shopping_cart.txt"
    );

    let text = body_text(response).await;

    assert!(text.starts_with("Shopping list ("));
    assert_eq!(text.matches("Salt (g)").count(), 1, "summed, not repeated");
    assert!(text.contains("Salt (g) — 15"));
    assert!(text.contains("Water (ml) — 500"));

    // Name-ascending numbering: Salt before Water.
    let salt_pos = text.find("Salt (g)").unwrap();
    let water_pos = text.find("Water (ml)").unwrap();
    assert!(salt_pos < water_pos);

    // Contributing recipes with their author.
    assert!(text.contains("Brine — shopper"));
    assert!(text.contains("Soup — shopper"));
}

#[tokio::test]
async fn test_shopping_list_counts_each_cart_recipe_once() {
    let (app, state) = spawn_app().await;

    let token = register_and_login(&app, "once@example.com", "once").await;
    let salt = seed_ingredient(&state, "Salt", "g").await;
    let id = create_recipe(&app, &token, "Solo", &[(salt, 7)], 5).await;

    let response = send(
        &app,
        request("POST", &format!("/api/recipes/{id}/shopping_cart"), Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // A duplicate add is rejected, so the total stays at one contribution.
    let response = send(
        &app,
        request("POST", &format!("/api/recipes/{id}/shopping_cart"), Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        request("GET", "/api/recipes/download_shopping_cart", Some(&token), None),
    )
    .await;
    let text = body_text(response).await;
    assert!(text.contains("Salt (g) — 7"));
}

#[tokio::test]
async fn test_self_subscription_rejected() {
    let (app, _state) = spawn_app().await;

    let token = register_and_login(&app, "narcissus@example.com", "narcissus").await;

    let response = send(&app, request("GET", "/api/users/me", Some(&token), None)).await;
    let me = body_json(response).await;
    let my_id = me["data"]["id"].as_i64().unwrap();

    let response = send(
        &app,
        request("POST", &format!("/api/users/{my_id}/subscribe"), Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Still rejected no matter how often it is attempted.
    let response = send(
        &app,
        request("POST", &format!("/api/users/{my_id}/subscribe"), Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let (app, state) = spawn_app().await;

    let author = register_and_login(&app, "writer@example.com", "writer").await;
    let reader = register_and_login(&app, "reader@example.com", "reader").await;
    let salt = seed_ingredient(&state, "Salt", "g").await;

    let _ = create_recipe(&app, &author, "First dish", &[(salt, 1)], 10).await;
    let _ = create_recipe(&app, &author, "Second dish", &[(salt, 2)], 20).await;

    let response = send(&app, request("GET", "/api/users/me", Some(&author), None)).await;
    let author_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    // Subscribe: 201 with the author annotated with recipes
    let response = send(
        &app,
        request(
            "POST",
            &format!("/api/users/{author_id}/subscribe?recipes_limit=1"),
            Some(&reader),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["username"], "writer");
    assert_eq!(json["data"]["is_subscribed"], true);
    assert_eq!(json["data"]["recipes_count"], 2);
    assert_eq!(json["data"]["recipes"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["recipes"][0]["name"], "Second dish");

    // Duplicate edge
    let response = send(
        &app,
        request("POST", &format!("/api/users/{author_id}/subscribe"), Some(&reader), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Listing
    let response = send(
        &app,
        request("GET", "/api/users/subscriptions?recipes_limit=5", Some(&reader), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["count"], 1);
    assert_eq!(json["data"]["results"][0]["username"], "writer");
    assert_eq!(json["data"]["results"][0]["recipes"].as_array().unwrap().len(), 2);

    // Unsubscribe, then the edge is gone
    let response = send(
        &app,
        request("DELETE", &format!("/api/users/{author_id}/subscribe"), Some(&reader), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        request("DELETE", &format!("/api/users/{author_id}/subscribe"), Some(&reader), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Unknown author
    let response = send(
        &app,
        request("POST", "/api/users/41414/subscribe", Some(&reader), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ingredient_catalog_listing() {
    let (app, state) = spawn_app().await;

    let _ = seed_ingredient(&state, "Basil", "g").await;
    let _ = seed_ingredient(&state, "Bay leaf", "pcs").await;
    let _ = seed_ingredient(&state, "Salt", "g").await;

    let response = send(&app, request("GET", "/api/ingredients", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Basil", "Bay leaf", "Salt"]);

    // Prefix filter
    let response = send(&app, request("GET", "/api/ingredients?name=ba", None, None)).await;
    let json = body_json(response).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Basil", "Bay leaf"]);

    // Unknown id is a 404
    let response = send(&app, request("GET", "/api/ingredients/999", None, None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ingredient_seeding_is_idempotent() {
    let (_app, state) = spawn_app().await;

    let rows = vec![
        IngredientSeed {
            name: "Salt".to_string(),
            measurement_unit: "g".to_string(),
        },
        IngredientSeed {
            name: "Salt".to_string(),
            measurement_unit: "kg".to_string(),
        },
        IngredientSeed {
            name: "Water".to_string(),
            measurement_unit: "ml".to_string(),
        },
    ];

    let added = load_ingredients(state.store(), &rows).await.unwrap();
    assert_eq!(added, 3);

    // Second run with the same data adds nothing.
    let added = load_ingredients(state.store(), &rows).await.unwrap();
    assert_eq!(added, 0);

    let all = state.store().list_ingredients(None).await.unwrap();
    assert_eq!(all.len(), 3);
}
