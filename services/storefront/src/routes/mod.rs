//! Storefront service routes

use axum::{
    Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
};
use serde_json::json;

use crate::{
    middleware::{admin_middleware, auth_middleware, not_found_redirect},
    state::AppState,
};

mod account;
mod admin;
mod cart;
mod catalog;
mod orders;

/// Create the router for the storefront service
pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/admin/products", post(admin::create_product))
        .route(
            "/api/admin/products/:id",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route("/api/admin/deals", post(admin::create_deal))
        .route(
            "/api/admin/deals/:id",
            put(admin::update_deal).delete(admin::delete_deal),
        )
        .route("/api/admin/deals/:id/status", patch(admin::set_deal_status))
        .route("/api/admin/orders", get(admin::list_orders))
        .route("/api/admin/orders/:id/status", patch(admin::update_order_status))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id", delete(admin::delete_user))
        .route("/api/admin/users/:id/role", put(admin::update_role))
        .route("/api/admin/analytics", get(admin::analytics))
        .route("/api/admin/shipping/config", put(admin::update_shipping_config))
        .route_layer(middleware::from_fn(admin_middleware));

    let protected_routes = Router::new()
        .route("/api/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/api/cart/items", post(cart::add_item))
        .route(
            "/api/cart/items/:product_id",
            put(cart::set_quantity).delete(cart::remove_item),
        )
        .route("/api/cart/items/:product_id/increment", post(cart::increment))
        .route("/api/cart/items/:product_id/decrement", post(cart::decrement))
        .route("/api/checkout", post(orders::checkout))
        .route("/api/orders", get(orders::list_orders))
        .route("/api/orders/status-counts", get(orders::status_counts))
        .route(
            "/api/orders/:id",
            get(orders::get_order).delete(orders::delete_order),
        )
        .route("/api/orders/:id/cancel", post(orders::cancel_order))
        .route(
            "/api/addresses",
            get(account::list_addresses).post(account::create_address),
        )
        .route(
            "/api/addresses/:id",
            put(account::update_address).delete(account::delete_address),
        )
        .route("/api/profile", get(account::profile))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/products", get(catalog::list_products))
        .route("/api/products/categories", get(catalog::list_categories))
        .route("/api/products/:id", get(catalog::get_product))
        .route("/api/deals", get(catalog::list_deals))
        .route("/api/deals/active", get(catalog::active_deals))
        .route("/api/deals/:id", get(catalog::get_deal))
        .route("/api/deals/:id/products", get(catalog::deal_products))
        .route("/api/shipping/config", get(catalog::shipping_config))
        .route("/api/auth/login", post(account::login))
        .route("/api/auth/register", post(account::register))
        .route("/api/auth/refresh", post(account::refresh))
        .merge(protected_routes)
        .layer(middleware::from_fn(not_found_redirect))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let cart_store = match state.carts.health_check().await {
        Ok(true) => "ok",
        Ok(false) | Err(_) => "unavailable",
    };

    Json(json!({
        "status": "ok",
        "service": "storefront",
        "cartStore": state.carts.backend_name(),
        "cartStoreStatus": cart_store,
    }))
}

#[cfg(test)]
mod tests;
