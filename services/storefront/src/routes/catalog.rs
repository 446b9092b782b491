//! Public catalog, deal and shipping endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    catalog::{self, ProductQuery, ProductView},
    error::ApiResult,
    models::ShippingView,
    state::AppState,
};

/// Priced, filtered and paged product listing
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<impl IntoResponse> {
    let (products, deals) = tokio::join!(state.backend.list_products(), state.deals.current());
    let clock = state.clock();

    let views = catalog::price_products(products?, &deals?, &clock);
    Ok(Json(catalog::search(views, &query)))
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let products = state.backend.list_products().await?;
    Ok(Json(catalog::categories(&products)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let (product, deals) = tokio::join!(state.backend.get_product(id), state.deals.current());
    Ok(Json(ProductView::new(product?, &deals?, &state.clock())))
}

pub async fn list_deals(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let deals = state.deals.current().await?;
    Ok(Json(catalog::deal_views(deals, &state.clock())))
}

/// Deals live right now, soonest ending first
pub async fn active_deals(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let clock = state.clock();
    let mut views: Vec<_> = catalog::deal_views(state.deals.current().await?, &clock)
        .into_iter()
        .filter(|view| view.currently_active)
        .collect();
    views.sort_by_key(|view| view.seconds_remaining);
    Ok(Json(views))
}

pub async fn get_deal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let deal = state.backend.get_deal(id).await?;
    Ok(Json(catalog::DealView::new(deal, &state.clock())))
}

/// Products of one deal, priced against the full deal list
pub async fn deal_products(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let (deal, products, deals) = tokio::join!(
        state.backend.get_deal(id),
        state.backend.list_products(),
        state.deals.current()
    );
    let deal = deal?;

    let covered = products?
        .into_iter()
        .filter(|p| deal.covers(p.id))
        .collect();
    Ok(Json(catalog::price_products(covered, &deals?, &state.clock())))
}

pub async fn shipping_config(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let config = state.backend.shipping_config().await.unwrap_or_default();
    let policy = common::pricing::ShippingPolicy::default().merged_with(&config);

    Ok(Json(ShippingView {
        policy,
        standard_delivery_days: config.standard_delivery_days,
        express_delivery_days: config.express_delivery_days,
    }))
}
