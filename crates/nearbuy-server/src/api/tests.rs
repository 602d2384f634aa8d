use super::*;
use crate::auth::TokenService;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use serde_json::{json, Value};
use tower::ServiceExt;

const CATALOG: &str = r#"
categories:
  - name: Electronics
products:
  - name: Wireless Earbuds
    category: Electronics
    images: ["https://cdn.example.com/earbuds.jpg"]
  - name: Desk Lamp
    category: Electronics
shops:
  - name: Connaught Gadgets
    owner:
      name: Ravi Sharma
      email: ravi@example.com
    address:
      city: New Delhi
      latitude: 28.6315
      longitude: 77.2167
    timings:
      - day: Monday
        open: "09:30"
        close: "21:00"
    stock:
      - product: Wireless Earbuds
        price: "1499.00"
        stock: 12
      - product: Desk Lamp
        price: "899.00"
        stock: 0
  - name: Karol Bagh Electronics
    owner:
      name: Meena Gupta
    address:
      city: New Delhi
      latitude: 28.6519
      longitude: 77.1909
    stock:
      - product: Wireless Earbuds
        price: "1399.00"
        stock: 2
  - name: Bandra Digital
    owner:
      name: Priya Patel
    address:
      city: Mumbai
      latitude: 19.0596
      longitude: 72.8295
    stock:
      - product: Wireless Earbuds
        price: "1299.00"
        stock: 5
  - name: Pune Corner Store
    owner:
      name: Anil Joshi
    address:
      city: Pune
"#;

fn test_state(pool: sqlx::PgPool) -> AppState {
    AppState {
        pool,
        auth: AuthState::new(TokenService::new("test-secret", 3600)),
    }
}

fn test_app(pool: sqlx::PgPool) -> Router {
    build_app(test_state(pool), RateLimitState::per_minute(1_000))
}

async fn seed(pool: &sqlx::PgPool) {
    let catalog = nearbuy_core::parse_catalog(CATALOG).expect("catalog");
    nearbuy_db::seed_catalog(pool, &catalog)
        .await
        .expect("seed catalog");
}

async fn id_of(pool: &sqlx::PgPool, sql: &str, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("lookup id")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json parse")
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn get_with_request_id(uri: &str, request_id: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-request-id", request_id)
        .body(Body::empty())
        .expect("request")
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn register(pool: &sqlx::PgPool, email: &str) -> String {
    let (status, json) = send(
        test_app(pool.clone()),
        post_json(
            "/api/v1/auth/register",
            &json!({"name": "Asha", "email": email, "password": "long-enough-pw"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"]["token"]
        .as_str()
        .expect("token")
        .to_string()
}

// -------------------------------------------------------------------------
// Envelope and error mapping (no DB)
// -------------------------------------------------------------------------

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 200);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn api_error_codes_map_to_statuses() {
    for (code, status) in [
        ("not_found", StatusCode::NOT_FOUND),
        ("unauthorized", StatusCode::UNAUTHORIZED),
        ("validation_error", StatusCode::BAD_REQUEST),
        ("bad_request", StatusCode::BAD_REQUEST),
        ("conflict", StatusCode::CONFLICT),
        ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ] {
        let response = ApiError::new("req-1", code, "message").into_response();
        assert_eq!(response.status(), status, "{code}");
    }
}

// -------------------------------------------------------------------------
// Health and middleware
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn health_reports_ok_and_echoes_request_id(pool: sqlx::PgPool) {
    let response = test_app(pool)
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-health-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-request-id").map(|v| v.as_bytes()),
        Some(b"req-health-1".as_slice())
    );
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json: Value = serde_json::from_slice(&body).expect("json parse");
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["meta"]["request_id"], "req-health-1");
}

#[sqlx::test(migrations = "../../migrations")]
async fn rate_limit_rejects_requests_over_budget(pool: sqlx::PgPool) {
    let app = build_app(test_state(pool), RateLimitState::per_minute(1));

    let (first, _) = send(app.clone(), get("/api/v1/categories")).await;
    let (second, json) = send(
        app,
        get_with_request_id("/api/v1/categories", "req-limited-1"),
    )
    .await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");
    assert_eq!(json["error"]["message"], "rate limit exceeded");
    assert_eq!(json["meta"]["request_id"], "req-limited-1");
    assert!(json["meta"]["timestamp"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn protected_routes_require_a_token(pool: sqlx::PgPool) {
    let (status, json) = send(
        test_app(pool.clone()),
        get_with_request_id("/api/v1/users/me", "req-anon-1"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");
    assert_eq!(json["meta"]["request_id"], "req-anon-1");
    assert!(json["meta"]["timestamp"].is_string());

    let (status, _) = send(
        test_app(pool),
        get_with_token("/api/v1/users/me", "not-a-jwt"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// -------------------------------------------------------------------------
// Accounts
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn register_then_login_then_fetch_profile(pool: sqlx::PgPool) {
    register(&pool, "asha@example.com").await;

    let (status, json) = send(
        test_app(pool.clone()),
        post_json(
            "/api/v1/auth/login",
            &json!({"email": "ASHA@example.com", "password": "long-enough-pw"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    let token = json["data"]["token"].as_str().expect("token").to_string();

    let (status, me) = send(test_app(pool), get_with_token("/api/v1/users/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["email"], "asha@example.com");
    assert!(me["data"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_registration_is_a_conflict(pool: sqlx::PgPool) {
    register(&pool, "asha@example.com").await;

    let (status, json) = send(
        test_app(pool),
        post_json(
            "/api/v1/auth/register",
            &json!({"email": "asha@example.com", "password": "another-password"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "conflict");
}

#[sqlx::test(migrations = "../../migrations")]
async fn login_with_wrong_password_is_unauthorized(pool: sqlx::PgPool) {
    register(&pool, "asha@example.com").await;

    for body in [
        json!({"email": "asha@example.com", "password": "wrong-password"}),
        json!({"email": "nobody@example.com", "password": "long-enough-pw"}),
    ] {
        let (status, json) = send(
            test_app(pool.clone()),
            post_json("/api/v1/auth/login", &body, None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "invalid credentials");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn register_rejects_short_password(pool: sqlx::PgPool) {
    let (status, json) = send(
        test_app(pool),
        post_json(
            "/api/v1/auth/register",
            &json!({"email": "asha@example.com", "password": "short"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

// -------------------------------------------------------------------------
// Products
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn search_without_origin_is_paginated_and_unranked(pool: sqlx::PgPool) {
    seed(&pool).await;

    let (status, json) = send(
        test_app(pool),
        get("/api/v1/products/search?q=earbuds&per_page=2"),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");

    let page = &json["data"];
    assert_eq!(page["total"], 3);
    assert_eq!(page["pages"], 2);
    assert_eq!(page["has_next"], true);
    let items = page["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    assert!(items[0]["distance_km"].is_null());
    // Cheapest first within a product.
    assert_eq!(items[0]["shop_name"], "Bandra Digital");
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_with_origin_ranks_within_radius(pool: sqlx::PgPool) {
    seed(&pool).await;

    let (status, json) = send(
        test_app(pool),
        get("/api/v1/products/search?q=earbuds&lat=28.6139&lng=77.2090&radius=10"),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");

    let items = json["data"]["items"].as_array().expect("items");
    let names: Vec<&str> = items
        .iter()
        .map(|i| i["shop_name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Connaught Gadgets", "Karol Bagh Electronics"]);

    let distances: Vec<f64> = items
        .iter()
        .map(|i| i["distance_km"].as_f64().expect("distance"))
        .collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    assert!(distances.iter().all(|d| *d <= 10.0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_rejects_invalid_location(pool: sqlx::PgPool) {
    for uri in [
        "/api/v1/products/search?lat=28.6",
        "/api/v1/products/search?lat=95&lng=77.2",
        "/api/v1/products/search?lat=28.6&lng=77.2&radius=-1",
        "/api/v1/products/search?per_page=500",
    ] {
        let (status, json) = send(test_app(pool.clone()), get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["error"]["code"], "validation_error", "{uri}");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn authenticated_search_is_recorded_in_history(pool: sqlx::PgPool) {
    seed(&pool).await;
    let token = register(&pool, "asha@example.com").await;

    let (status, _) = send(
        test_app(pool.clone()),
        get_with_token("/api/v1/products/search?q=lamp", &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(test_app(pool.clone()), get("/api/v1/products/search?q=anon")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(
        test_app(pool),
        get_with_token("/api/v1/users/me/history", &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let history = json["data"].as_array().expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["search_item"], "lamp");
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_detail_sorts_availability_by_distance(pool: sqlx::PgPool) {
    seed(&pool).await;
    let id = id_of(
        &pool,
        "SELECT id FROM products WHERE product_name = $1",
        "Wireless Earbuds",
    )
    .await;

    let (status, json) = send(
        test_app(pool),
        get(&format!("/api/v1/products/{id}?lat=19.0760&lng=72.8777")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");

    let data = &json["data"];
    assert_eq!(data["images"].as_array().map(Vec::len), Some(1));
    assert_eq!(data["rating"]["count"], 0);
    let availability = data["availability"].as_array().expect("availability");
    assert_eq!(availability.len(), 3);
    assert_eq!(availability[0]["shop_name"], "Bandra Digital");
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_detail_is_404_when_missing_or_out_of_stock(pool: sqlx::PgPool) {
    seed(&pool).await;
    let lamp = id_of(
        &pool,
        "SELECT id FROM products WHERE product_name = $1",
        "Desk Lamp",
    )
    .await;

    let (status, _) = send(test_app(pool.clone()), get("/api/v1/products/999999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(test_app(pool), get(&format!("/api/v1/products/{lamp}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

// -------------------------------------------------------------------------
// Shops and categories
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn nearby_shops_rank_mapped_shops_and_list_all_without_origin(pool: sqlx::PgPool) {
    seed(&pool).await;

    let (status, json) = send(
        test_app(pool.clone()),
        get("/api/v1/shops/nearby?lat=28.6315&lng=77.2167&radius=5"),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    let items = json["data"]["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["shop_name"], "Connaught Gadgets");
    assert_eq!(items[0]["distance_km"], 0.0);

    let (status, json) = send(
        test_app(pool.clone()),
        get("/api/v1/shops/nearby?lat=28.6315&lng=77.2167&radius=20000"),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["total"], 3);

    let (status, json) = send(test_app(pool), get("/api/v1/shops/nearby")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 4);
    let items = json["data"]["items"].as_array().expect("items");
    let unmapped = items
        .iter()
        .find(|item| item["shop_name"] == "Pune Corner Store")
        .expect("unmapped shop listed");
    assert!(unmapped["latitude"].is_null());
    assert!(unmapped["distance_km"].is_null());
    assert_eq!(unmapped["products_in_stock"], 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn shop_detail_lists_week_and_stock(pool: sqlx::PgPool) {
    seed(&pool).await;
    let id = id_of(
        &pool,
        "SELECT id FROM shops WHERE shop_name = $1",
        "Connaught Gadgets",
    )
    .await;

    let (status, json) = send(test_app(pool.clone()), get(&format!("/api/v1/shops/{id}"))).await;
    assert_eq!(status, StatusCode::OK, "{json}");

    let data = &json["data"];
    assert_eq!(data["owner"]["name"], "Ravi Sharma");
    let week = data["weekly_hours"].as_array().expect("weekly hours");
    assert_eq!(week.len(), 7);
    assert_eq!(week[0]["day"], "Monday");
    assert_eq!(week[0]["hours"], "09:30 - 21:00");
    assert_eq!(week[1]["hours"], "Closed");
    assert_eq!(data["products"].as_array().map(Vec::len), Some(1));

    let (status, _) = send(test_app(pool), get("/api/v1/shops/999999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../migrations")]
async fn categories_are_listed(pool: sqlx::PgPool) {
    seed(&pool).await;

    let (status, json) = send(test_app(pool), get("/api/v1/categories")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["name"], "Electronics");
}

// -------------------------------------------------------------------------
// Reviews
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn review_is_created_and_rolls_up(pool: sqlx::PgPool) {
    seed(&pool).await;
    let token = register(&pool, "asha@example.com").await;
    let id = id_of(
        &pool,
        "SELECT id FROM products WHERE product_name = $1",
        "Wireless Earbuds",
    )
    .await;

    let (status, json) = send(
        test_app(pool.clone()),
        post_json(
            "/api/v1/reviews",
            &json!({"product_id": id, "rating": 4.5, "review_text": "Solid bass"}),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert_eq!(json["data"]["user_name"], "Asha");

    let (_, detail) = send(test_app(pool), get(&format!("/api/v1/products/{id}"))).await;
    assert_eq!(detail["data"]["rating"]["count"], 1);
    assert_eq!(detail["data"]["reviews"][0]["review_text"], "Solid bass");
}

#[sqlx::test(migrations = "../../migrations")]
async fn review_validation_and_unknown_product(pool: sqlx::PgPool) {
    let token = register(&pool, "asha@example.com").await;

    let (status, json) = send(
        test_app(pool.clone()),
        post_json(
            "/api/v1/reviews",
            &json!({"product_id": 1, "rating": 6}),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");

    let (status, json) = send(
        test_app(pool),
        post_json(
            "/api/v1/reviews",
            &json!({"product_id": 424242, "rating": 3}),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}
