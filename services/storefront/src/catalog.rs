//! Priced catalog views, search and paging

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use common::{
    DealClock,
    models::{Deal, Product},
    pricing::{self, PriceQuote},
};

/// Deal shown next to a discounted price
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealBadge {
    pub id: i64,
    pub title: String,
    pub discount_percentage: Decimal,
    pub seconds_remaining: Option<i64>,
}

impl DealBadge {
    fn new(deal: &Deal, clock: &DealClock) -> Self {
        Self {
            id: deal.id,
            title: deal.title.clone(),
            discount_percentage: pricing::clamp_discount(deal.discount_percentage),
            seconds_remaining: clock.seconds_remaining(deal),
        }
    }
}

/// Product with its effective price
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub pricing: PriceQuote,
    pub deal: Option<DealBadge>,
}

impl ProductView {
    pub fn new(product: Product, deals: &[Deal], clock: &DealClock) -> Self {
        let deal = pricing::best_deal_for(product.id, deals, clock);
        let quote = pricing::quote(product.price, deal, clock);
        Self {
            pricing: PriceQuote {
                list_price: pricing::round_money(quote.list_price),
                unit_price: pricing::round_money(quote.unit_price),
                savings: pricing::round_money(quote.savings),
                discount_percentage: quote.discount_percentage,
            },
            deal: deal.map(|d| DealBadge::new(d, clock)),
            product,
        }
    }
}

/// Reconcile products with deals by product id
pub fn price_products(products: Vec<Product>, deals: &[Deal], clock: &DealClock) -> Vec<ProductView> {
    products
        .into_iter()
        .map(|product| ProductView::new(product, deals, clock))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Backend order
    #[default]
    Featured,
    /// No sales ranking is available, so this keeps backend order too
    Popular,
    PriceAsc,
    PriceDesc,
    Newest,
}

/// Catalog search parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort_by: SortBy,
    pub page: Option<usize>,
    pub limit: Option<usize>,
    /// Only products that can be added to a cart
    #[serde(default)]
    pub in_stock: bool,
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slice `items` to the requested page; pages start at 1
    pub fn paginate(items: Vec<T>, page: Option<usize>, limit: Option<usize>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(12).clamp(1, 100);
        let total = items.len();

        let items = items
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();

        Self {
            items,
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// Filter, sort and page priced products
pub fn search(views: Vec<ProductView>, query: &ProductQuery) -> Page<ProductView> {
    let needle = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());

    let mut views: Vec<ProductView> = views
        .into_iter()
        .filter(|v| needle.is_none_or(|n| v.product.matches(n)))
        .filter(|v| {
            category.is_none_or(|c| {
                v.product
                    .category
                    .as_deref()
                    .is_some_and(|pc| pc.eq_ignore_ascii_case(c))
            })
        })
        .filter(|v| query.min_price.is_none_or(|min| v.pricing.unit_price >= min))
        .filter(|v| query.max_price.is_none_or(|max| v.pricing.unit_price <= max))
        .filter(|v| !query.in_stock || v.product.in_stock())
        .collect();

    match query.sort_by {
        SortBy::Featured | SortBy::Popular => {}
        SortBy::PriceAsc => views.sort_by(|a, b| a.pricing.unit_price.cmp(&b.pricing.unit_price)),
        SortBy::PriceDesc => views.sort_by(|a, b| b.pricing.unit_price.cmp(&a.pricing.unit_price)),
        SortBy::Newest => views.sort_by(|a, b| newest_first(&a.product, &b.product)),
    }

    Page::paginate(views, query.page, query.limit)
}

fn newest_first(a: &Product, b: &Product) -> Ordering {
    match (a.release_date.as_deref(), b.release_date.as_deref()) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Distinct categories in catalog order
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for category in products.iter().filter_map(|p| p.category.as_ref()) {
        if !seen.iter().any(|c| c.eq_ignore_ascii_case(category)) {
            seen.push(category.clone());
        }
    }
    seen
}

/// Deal with its state at the current instant
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealView {
    #[serde(flatten)]
    pub deal: Deal,
    pub currently_active: bool,
    pub seconds_remaining: Option<i64>,
}

impl DealView {
    pub fn new(deal: Deal, clock: &DealClock) -> Self {
        Self {
            currently_active: clock.is_active(&deal),
            seconds_remaining: clock.seconds_remaining(&deal),
            deal,
        }
    }
}

pub fn deal_views(deals: Vec<Deal>, clock: &DealClock) -> Vec<DealView> {
    deals.into_iter().map(|d| DealView::new(d, clock)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn clock() -> DealClock {
        DealClock::at(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap())
    }

    fn products() -> Vec<Product> {
        serde_json::from_str(
            r#"[{"id":1,"productName":"Trail Shoe","brand":"Peak","category":"Footwear","price":120,"quantity":4,"releaseDate":"2024-01-10"},
                {"id":2,"productName":"Kettle","brand":"Acme","category":"Kitchen","price":40,"quantity":0,"releaseDate":"2024-05-01"},
                {"id":3,"productName":"Road Shoe","brand":"Peak","category":"footwear","price":90,"quantity":2}]"#,
        )
        .unwrap()
    }

    fn deals() -> Vec<Deal> {
        serde_json::from_str(
            r#"[{"id":9,"title":"Shoe week","discountPercentage":50,"endDate":"2024-06-15","endTime":"13:00",
                 "active":true,"products":[{"id":1}]}]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_price_products_applies_best_deal() {
        let views = price_products(products(), &deals(), &clock());

        assert_eq!(views[0].pricing.unit_price, Decimal::from(60));
        assert_eq!(views[0].deal.as_ref().and_then(|d| d.seconds_remaining), Some(3600));
        assert_eq!(views[1].pricing.unit_price, Decimal::from(40));
        assert!(views[1].deal.is_none());
    }

    #[test]
    fn test_search_filters_on_effective_price() {
        let views = price_products(products(), &deals(), &clock());
        let query = ProductQuery {
            q: Some("shoe".into()),
            max_price: Some(Decimal::from(80)),
            ..Default::default()
        };

        let page = search(views, &query);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].product.id, 1);
    }

    #[test]
    fn test_search_category_sort_and_stock() {
        let views = price_products(products(), &[], &clock());
        let query = ProductQuery {
            category: Some("FOOTWEAR".into()),
            sort_by: SortBy::PriceAsc,
            ..Default::default()
        };
        let ids: Vec<i64> = search(views.clone(), &query).items.iter().map(|v| v.product.id).collect();
        assert_eq!(ids, vec![3, 1]);

        let query = ProductQuery {
            sort_by: SortBy::Newest,
            in_stock: true,
            ..Default::default()
        };
        let ids: Vec<i64> = search(views, &query).items.iter().map(|v| v.product.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_paginate() {
        let page = Page::paginate((1..=25).collect::<Vec<_>>(), Some(3), Some(10));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total_pages, 3);

        let page = Page::paginate(vec![1, 2], Some(0), None);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 2);
    }

    #[test]
    fn test_paginate_far_past_the_end() {
        let page = Page::paginate((1..=25).collect::<Vec<_>>(), Some(usize::MAX), Some(100));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_categories_are_distinct() {
        assert_eq!(categories(&products()), vec!["Footwear", "Kitchen"]);
    }

    #[test]
    fn test_deal_view_state() {
        let view = DealView::new(deals().remove(0), &clock());
        assert!(view.currently_active);
        assert_eq!(view.seconds_remaining, Some(3600));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["currentlyActive"], true);
        assert_eq!(json["title"], "Shoe week");
    }
}
