//! Back-office endpoints; every route here sits behind the admin guard

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use tracing::info;

use common::{
    models::{DealInput, OrderStatus, ProductInput, RoleUpdate, ShippingConfig, StatusUpdate},
    validation,
};

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{self, DealStatusQuery, OrderFilter, OrderView},
    state::AppState,
};

// Products

pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<ProductInput>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_product(&input)?;
    let submission = state.forms.begin(user.owner(), "product")?;

    let product = state.backend.create_product(&user.token, &input).await?;
    submission.succeed();
    info!(admin = user.id, product_id = product.id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(input): Json<ProductInput>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_product(&input)?;
    let submission = state.forms.begin(user.owner(), "product")?;

    let product = state.backend.update_product(&user.token, id, &input).await?;
    submission.succeed();
    info!(admin = user.id, product_id = id, "Product updated");

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    state.backend.delete_product(&user.token, id).await?;
    info!(admin = user.id, product_id = id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Deals

pub async fn create_deal(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<DealInput>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_deal(&input)?;
    let submission = state.forms.begin(user.owner(), "deal")?;

    let deal = state.backend.create_deal(&user.token, &input).await?;
    submission.succeed();
    state.deals.refresh_after_write().await;
    info!(admin = user.id, deal_id = deal.id, "Deal created");

    Ok((StatusCode::CREATED, Json(deal)))
}

pub async fn update_deal(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(input): Json<DealInput>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_deal(&input)?;
    let submission = state.forms.begin(user.owner(), "deal")?;

    let deal = state.backend.update_deal(&user.token, id, &input).await?;
    submission.succeed();
    state.deals.refresh_after_write().await;
    info!(admin = user.id, deal_id = id, "Deal updated");

    Ok(Json(deal))
}

pub async fn delete_deal(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    state.backend.delete_deal(&user.token, id).await?;
    state.deals.refresh_after_write().await;
    info!(admin = user.id, deal_id = id, "Deal deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_deal_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Query(query): Query<DealStatusQuery>,
) -> ApiResult<impl IntoResponse> {
    let deal = state
        .backend
        .set_deal_status(&user.token, id, query.is_active)
        .await?;
    state.deals.refresh_after_write().await;
    info!(admin = user.id, deal_id = id, active = query.is_active, "Deal status changed");

    Ok(Json(deal))
}

// Orders

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<OrderFilter>,
) -> ApiResult<impl IntoResponse> {
    let status = filter.status().map_err(ApiError::BadRequest)?;
    let (orders, policy) = tokio::join!(state.backend.all_orders(&user.token), state.shipping_policy());

    let orders = orders?
        .into_iter()
        .filter(|o| status.is_none_or(|s| o.status == s))
        .collect();
    Ok(Json(models::order_views(orders, &policy)))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<impl IntoResponse> {
    let status: OrderStatus = update.status.parse().map_err(ApiError::BadRequest)?;

    let order = state
        .backend
        .update_order_status(&user.token, id, &StatusUpdate { status: status.to_string() })
        .await?;
    info!(admin = user.id, order_id = id, %status, "Order status changed");

    let policy = state.shipping_policy().await;
    Ok(Json(OrderView::new(order, &policy)))
}

// Users

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.backend.list_users(&user.token).await?))
}

pub async fn update_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<RoleUpdate>,
) -> ApiResult<impl IntoResponse> {
    let role = validation::validate_role(&update.role)?;
    if id == user.id {
        return Err(ApiError::BadRequest("You cannot change your own role".to_string()));
    }

    let updated = state
        .backend
        .update_role(&user.token, id, &RoleUpdate { role: role.to_string() })
        .await?;
    info!(admin = user.id, user_id = id, %role, "User role changed");

    Ok(Json(updated))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if id == user.id {
        return Err(ApiError::BadRequest("You cannot delete your own account".to_string()));
    }

    state.backend.delete_user(&user.token, id).await?;
    info!(admin = user.id, user_id = id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Analytics and shipping

/// Backend report with product names filled in and categories recounted
pub async fn analytics(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    let (report, products) = tokio::join!(
        state.backend.analytics(&user.token),
        state.backend.list_products()
    );

    let mut report = report?;
    report.enrich(&products?);
    Ok(Json(report))
}

pub async fn update_shipping_config(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(config): Json<ShippingConfig>,
) -> ApiResult<impl IntoResponse> {
    let negative = [
        config.standard_shipping_fee,
        config.express_shipping_fee,
        config.free_shipping_threshold,
    ]
    .into_iter()
    .flatten()
    .any(|amount| amount < Decimal::ZERO);
    if negative {
        return Err(ApiError::BadRequest("Shipping amounts must not be negative".to_string()));
    }

    let submission = state.forms.begin(user.owner(), "shipping")?;
    let updated = state.backend.update_shipping_config(&user.token, &config).await?;
    submission.succeed();
    info!(admin = user.id, "Shipping configuration updated");

    Ok(Json(updated))
}
