//! Checkout and order history

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use common::{
    models::{NewOrder, NewOrderItem, Order, OrderStatus},
    pricing,
};

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{self, CheckoutRequest, OrderFilter, OrderView},
    state::AppState,
};

/// Place an order for the cart contents
///
/// Products are re-read from the catalog so that stock and prices are current;
/// the cart is cleared only once the backend accepted the order.
pub async fn checkout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CheckoutRequest>,
) -> ApiResult<impl IntoResponse> {
    let submission = state.forms.begin(user.owner(), "checkout")?;

    let mut cart = state.carts.load(&user.owner()).await?;
    if cart.is_empty() {
        return Err(ApiError::BadRequest("Your cart is empty".to_string()));
    }

    let address_id = payload
        .address_id
        .ok_or_else(|| ApiError::BadRequest("Please select a shipping address".to_string()))?;
    let addresses = state.backend.user_addresses(&user.token, user.id).await?;
    if !addresses.iter().any(|a| a.id == Some(address_id)) {
        return Err(ApiError::BadRequest("Selected address was not found".to_string()));
    }

    let (products, deals) = tokio::join!(state.backend.list_products(), state.deals.current());
    let clock = state.clock();
    cart.refresh_products(&products?);
    cart.attach_deals(&deals?, &clock);

    let mut items = Vec::with_capacity(cart.lines().len());
    for line in cart.lines() {
        let Some(product) = line.product.as_ref() else {
            return Err(ApiError::Conflict(
                "An item in your cart is no longer available".to_string(),
            ));
        };
        if !product.in_stock() || line.quantity > product.stock_quantity {
            warn!(
                user_id = user.id,
                product_id = product.id,
                wanted = line.quantity,
                available = product.stock_quantity,
                "Checkout blocked by stock"
            );
            return Err(ApiError::Conflict(format!(
                "Only {} unit(s) of {} left in stock",
                product.stock_quantity.max(0),
                product.product_name
            )));
        }

        let quote = pricing::quote(product.price, line.deal_info.as_ref(), &clock);
        items.push(NewOrderItem {
            product_id: product.id,
            quantity: line.quantity,
            price: pricing::round_money(quote.unit_price),
            original_price: quote.list_price,
        });
    }

    let totals = cart.totals(&clock);
    let order = NewOrder {
        user_id: user.id,
        items,
        total_amount: pricing::round_money(totals.total_price),
        status: OrderStatus::Pending,
        address_id,
        payment_method: payload.payment_method,
    };

    let created = state.backend.create_order(&user.token, &order).await?;
    state.carts.clear(&user.owner()).await?;
    submission.succeed();

    info!(
        user_id = user.id,
        user = %user.user_name,
        order_id = created.id,
        total = %order.total_amount,
        shipping = ?payload.shipping_method,
        "Order placed"
    );

    let policy = state.shipping_policy().await;
    let view = OrderView::with_method(created, &policy, payload.shipping_method);
    Ok((StatusCode::CREATED, Json(view)))
}

/// Current user's orders, newest first
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<OrderFilter>,
) -> ApiResult<impl IntoResponse> {
    let status = filter.status().map_err(ApiError::BadRequest)?;
    let (orders, policy) = tokio::join!(
        state.backend.user_orders(&user.token, user.id),
        state.shipping_policy()
    );

    let orders = orders?
        .into_iter()
        .filter(|o| status.is_none_or(|s| o.status == s))
        .collect();
    Ok(Json(models::order_views(orders, &policy)))
}

pub async fn status_counts(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    let orders = state.backend.user_orders(&user.token, user.id).await?;
    Ok(Json(models::status_counts(&orders)))
}

/// Load an order the caller may see; other users' orders look missing
async fn owned_order(state: &AppState, user: &CurrentUser, id: i64) -> ApiResult<Order> {
    let order = state.backend.get_order(&user.token, id).await?;
    if !user.is_admin() && order.user_id.is_some_and(|owner| owner != user.id) {
        warn!(user_id = user.id, order_id = id, "Order requested by non-owner");
        return Err(ApiError::NotFound("Order not found".to_string()));
    }
    Ok(order)
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let order = owned_order(&state, &user, id).await?;
    let policy = state.shipping_policy().await;
    Ok(Json(OrderView::new(order, &policy)))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let submission = state.forms.begin(user.owner(), "cancel-order")?;

    let order = owned_order(&state, &user, id).await?;
    if !order.status.can_cancel() {
        return Err(ApiError::Conflict(format!(
            "A {} order cannot be cancelled",
            order.status.as_str().to_lowercase()
        )));
    }

    let cancelled = state.backend.cancel_order(&user.token, id).await?;
    submission.succeed();
    info!(user_id = user.id, order_id = id, "Order cancelled");

    let policy = state.shipping_policy().await;
    Ok(Json(OrderView::new(cancelled, &policy)))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    owned_order(&state, &user, id).await?;
    state.backend.delete_order(&user.token, id).await?;
    info!(user_id = user.id, order_id = id, "Order deleted");

    Ok(StatusCode::NO_CONTENT)
}
