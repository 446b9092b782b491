use axum::{
    Json, Router,
    body::Body,
    extract::Path,
    http::{Request, StatusCode, header},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

use common::cache::KeyValueStore;

use super::create_router;
use crate::{
    backend::BackendClient,
    cart::CartStore,
    middleware::REFRESHED_TOKEN_HEADER,
    settings::{CartBackend, StorefrontConfig},
    state::AppState,
    test_support::{TOKEN_SECRET, signed_token, spawn_upstream, token_for},
};

fn kettle() -> Value {
    json!({"id": 1, "productName": "Kettle", "price": 40, "quantity": 3, "available": true})
}

/// Fake shop backend with one discounted product and one address for user 7
fn shop(deals_up: bool) -> Router {
    Router::new()
        .route("/api/products", get(|| async { Json(json!([kettle()])) }))
        .route(
            "/api/product/:id",
            get(|Path(id): Path<i64>| async move {
                if id == 1 {
                    Ok(Json(kettle()))
                } else {
                    Err(StatusCode::NOT_FOUND)
                }
            }),
        )
        .route(
            "/api/deals",
            get(move || async move {
                if !deals_up {
                    return Err(StatusCode::INTERNAL_SERVER_ERROR);
                }
                Ok(Json(json!([{
                    "id": 4,
                    "title": "Kitchen week",
                    "discountPercentage": 25,
                    "startDate": "2000-01-01",
                    "endDate": "2999-12-31",
                    "products": [{"id": 1}]
                }])))
            }),
        )
        .route(
            "/api/address/user/:id",
            get(|| async {
                Json(json!([{"id": 3, "street": "1 Main St", "city": "Pune", "state": "MH",
                             "zipCode": "411001", "country": "India", "type": "SHIPPING"}]))
            }),
        )
        .route(
            "/api/orders",
            post(|Json(order): Json<Value>| async move {
                Json(json!({
                    "id": 99,
                    "userId": order["userId"],
                    "status": "PENDING",
                    "totalAmount": order["totalAmount"],
                    "items": order["items"],
                }))
            }),
        )
        .route(
            "/api/orders/:id",
            get(|Path(id): Path<i64>| async move {
                let owner = if id == 6 { 8 } else { 7 };
                Json(json!({"id": id, "userId": owner, "status": "DELIVERED"}))
            }),
        )
        .route(
            "/api/users/refresh-token",
            post(|| async { Json(json!({ "token": token_for(7, "USER", 3600) })) }),
        )
}

async fn app() -> Router {
    app_with(shop(true)).await
}

async fn app_with(upstream: Router) -> Router {
    let base = spawn_upstream(upstream).await;
    let config = StorefrontConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        api_url: Some(base.clone()),
        request_timeout_secs: 5,
        utc_offset_minutes: 0,
        deal_refresh_schedule: "0 */5 * * * *".to_string(),
        renew_threshold_secs: 300,
        cart_backend: CartBackend::Memory,
        jwt_secret: TOKEN_SECRET.to_string(),
        jwt_secret_base64: false,
    };
    let backend = BackendClient::new(base, Duration::from_secs(5)).unwrap();
    let carts = CartStore::new(KeyValueStore::memory(), None);
    create_router(AppState::new(config, backend, carts).unwrap())
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health_reports_cart_store() {
    let app = app().await;
    let (status, body) = call(&app, request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cartStore"], "memory");
    assert_eq!(body["cartStoreStatus"], "ok");
}

#[tokio::test]
async fn test_cart_requires_login() {
    let app = app().await;
    let (status, body) = call(&app, request("GET", "/api/cart", None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "AUTH");
    assert_eq!(body["redirect"], "/login");
}

#[tokio::test]
async fn test_admin_routes_reject_customers() {
    let app = app().await;
    let token = token_for(7, "USER", 3600);
    let (status, body) = call(&app, request("GET", "/api/admin/users", Some(&token), None)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "AUTH");
    assert!(body["redirect"].is_null());
}

#[tokio::test]
async fn test_add_to_cart_applies_active_deal() {
    let app = app().await;
    let token = token_for(7, "USER", 3600);

    let add = json!({"productId": 1, "quantity": 2});
    let (status, body) = call(&app, request("POST", "/api/cart/items", Some(&token), Some(add))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["totals"]["totalPrice"].as_f64(), Some(60.0));
    assert_eq!(body["totals"]["totalSavings"].as_f64(), Some(20.0));
    assert_eq!(body["totals"]["originalTotal"].as_f64(), Some(80.0));
    assert_eq!(body["checkout"]["shipping"].as_f64(), Some(100.0));
    assert_eq!(body["checkout"]["total"].as_f64(), Some(166.0));

    // Stock is 3
    let more = json!({"productId": 1, "quantity": 2});
    let (status, body) = call(&app, request("POST", "/api/cart/items", Some(&token), Some(more))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "CONFLICT");
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let app = app().await;
    let token = token_for(7, "USER", 3600);

    let add = json!({"productId": 1, "quantity": 1});
    let (status, _) = call(&app, request("POST", "/api/cart/items", Some(&token), Some(add))).await;
    assert_eq!(status, StatusCode::OK);

    let checkout = json!({"addressId": 3});
    let (status, body) = call(
        &app,
        request("POST", "/api/checkout", Some(&token), Some(checkout.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 99);
    assert_eq!(body["totalAmount"].as_f64(), Some(30.0));

    let (_, cart) = call(&app, request("GET", "/api/cart", Some(&token), None)).await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    let (status, body) = call(&app, request("POST", "/api/checkout", Some(&token), Some(checkout))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Your cart is empty");
}

#[tokio::test]
async fn test_checkout_rejects_unknown_address() {
    let app = app().await;
    let token = token_for(7, "USER", 3600);

    let add = json!({"productId": 1, "quantity": 1});
    call(&app, request("POST", "/api/cart/items", Some(&token), Some(add))).await;

    let checkout = json!({"addressId": 42});
    let (status, _) = call(&app, request("POST", "/api/checkout", Some(&token), Some(checkout))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Cart survives a failed checkout
    let (_, cart) = call(&app, request("GET", "/api/cart", Some(&token), None)).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delivered_order_cannot_be_cancelled() {
    let app = app().await;
    let token = token_for(7, "USER", 3600);

    let (status, body) = call(&app, request("POST", "/api/orders/5/cancel", Some(&token), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "CONFLICT");

    let (status, body) = call(&app, request("GET", "/api/orders/6", Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NOT_FOUND");
    assert_eq!(body["redirect"], "/orders");
}

#[tokio::test]
async fn test_token_near_expiry_is_renewed_in_header() {
    let app = app().await;
    let token = token_for(7, "USER", 60);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/cart", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let renewed = response.headers().get(REFRESHED_TOKEN_HEADER).unwrap();
    assert_ne!(renewed.to_str().unwrap(), token);
}

#[tokio::test]
async fn test_product_listing_is_priced() {
    let app = app().await;
    let (status, body) = call(&app, request("GET", "/api/products?q=kettle", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["pricing"]["unitPrice"].as_f64(), Some(30.0));
}

#[tokio::test]
async fn test_token_signed_with_another_key_is_rejected() {
    let app = app().await;
    let owner = token_for(7, "USER", 3600);
    let add = json!({"productId": 1, "quantity": 2});
    call(&app, request("POST", "/api/cart/items", Some(&owner), Some(add))).await;

    let forged = signed_token(7, "USER", 3600, "attacker-key");
    let (status, body) = call(&app, request("GET", "/api/cart", Some(&forged), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["redirect"], "/login");

    let (status, _) = call(&app, request("DELETE", "/api/cart", Some(&forged), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, cart) = call(&app, request("GET", "/api/cart", Some(&owner), None)).await;
    assert_eq!(cart["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_add_to_cart_survives_deal_outage() {
    let app = app_with(shop(false)).await;
    let token = token_for(7, "USER", 3600);

    let add = json!({"productId": 1, "quantity": 1});
    let (status, body) = call(&app, request("POST", "/api/cart/items", Some(&token), Some(add))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totals"]["totalPrice"].as_f64(), Some(40.0));
    assert_eq!(body["totals"]["totalSavings"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_express_checkout_summary_matches_choice() {
    let app = app().await;
    let token = token_for(7, "USER", 3600);

    let add = json!({"productId": 1, "quantity": 1});
    call(&app, request("POST", "/api/cart/items", Some(&token), Some(add))).await;

    let checkout = json!({"addressId": 3, "shippingMethod": "express"});
    let (status, body) = call(&app, request("POST", "/api/checkout", Some(&token), Some(checkout))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["summary"]["shippingMethod"], "express");
    assert_eq!(body["summary"]["shipping"].as_f64(), Some(200.0));
}

#[tokio::test]
async fn test_product_page_far_past_the_end() {
    let app = app().await;
    let uri = format!("/api/products?page={}", usize::MAX);
    let (status, body) = call(&app, request("GET", &uri, None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["items"].as_array().unwrap().is_empty());
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_missing_product_points_back_to_list() {
    let app = app().await;
    let (status, body) = call(&app, request("GET", "/api/products/42", None, None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["redirect"], "/products");
}
