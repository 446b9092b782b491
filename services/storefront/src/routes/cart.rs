//! Cart endpoints for the signed-in user

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::{info, warn};

use common::{Cart, QuantityChange, pricing};

use crate::{
    error::ApiResult,
    middleware::CurrentUser,
    models::{AddToCartRequest, CartQuery, CartView, SetQuantityRequest},
    state::AppState,
};

/// Render the cart with deals re-checked against the current list
async fn render(state: &AppState, mut cart: Cart, query: &CartQuery) -> Json<CartView> {
    let clock = state.clock();
    match state.deals.current().await {
        Ok(deals) => cart.attach_deals(&deals, &clock),
        Err(e) => warn!("Pricing cart with stored deals: {}", e),
    }
    let policy = state.shipping_policy().await;
    Json(CartView::new(&cart, &clock, &policy, query.shipping_method))
}

pub async fn get_cart(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<CartQuery>,
) -> ApiResult<impl IntoResponse> {
    let cart = state.carts.load(&user.owner()).await?;
    Ok(render(&state, cart, &query).await)
}

pub async fn add_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<AddToCartRequest>,
) -> ApiResult<impl IntoResponse> {
    let (product, deals) = tokio::join!(
        state.backend.get_product(payload.product_id),
        state.deals.current()
    );
    let product = product?;
    let deal = match deals {
        Ok(deals) => pricing::best_deal_for(product.id, &deals, &state.clock()).cloned(),
        Err(e) => {
            warn!(product_id = product.id, "Adding to cart without deals: {}", e);
            None
        }
    };

    let mut cart = state.carts.load(&user.owner()).await?;
    let quantity = cart.add(product, payload.quantity, deal)?;
    state.carts.save(&user.owner(), &cart).await?;

    info!(user_id = user.id, product_id = payload.product_id, quantity, "Added to cart");
    Ok(render(&state, cart, &CartQuery::default()).await)
}

pub async fn increment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let mut cart = state.carts.load(&user.owner()).await?;
    cart.increment(product_id)?;
    state.carts.save(&user.owner(), &cart).await?;

    Ok(render(&state, cart, &CartQuery::default()).await)
}

pub async fn decrement(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let mut cart = state.carts.load(&user.owner()).await?;
    if cart.decrement(product_id)? == QuantityChange::Removed {
        info!(user_id = user.id, product_id, "Removed from cart");
    }
    state.carts.save(&user.owner(), &cart).await?;

    Ok(render(&state, cart, &CartQuery::default()).await)
}

pub async fn set_quantity(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<i64>,
    Json(payload): Json<SetQuantityRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut cart = state.carts.load(&user.owner()).await?;
    cart.set_quantity(product_id, payload.quantity)?;
    state.carts.save(&user.owner(), &cart).await?;

    Ok(render(&state, cart, &CartQuery::default()).await)
}

pub async fn remove_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let mut cart = state.carts.load(&user.owner()).await?;
    if cart.remove(product_id) {
        state.carts.save(&user.owner(), &cart).await?;
        info!(user_id = user.id, product_id, "Removed from cart");
    }

    Ok(render(&state, cart, &CartQuery::default()).await)
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    state.carts.clear(&user.owner()).await?;
    info!(user_id = user.id, "Cart cleared");

    Ok(render(&state, Cart::new(), &CartQuery::default()).await)
}
