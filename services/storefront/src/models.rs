//! Request payloads and response views of the storefront API

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use common::{
    Cart, DealClock,
    models::{Order, OrderStatus},
    pricing::{self, CartTotals, OrderSummary, OrderTotals, ShippingMethod, ShippingPolicy},
};

use crate::catalog::DealBadge;

fn default_quantity() -> i64 {
    1
}

fn default_payment_method() -> String {
    "cod".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuery {
    #[serde(default)]
    pub shipping_method: ShippingMethod,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub address_id: Option<i64>,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub shipping_method: ShippingMethod,
}

/// Cart line as displayed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub stock_quantity: i64,
    pub list_price: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub savings: Decimal,
    pub deal: Option<DealBadge>,
}

/// Cart with its totals and a checkout preview
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub totals: CartTotals,
    /// Shipping, tax and grand total if checked out now
    pub checkout: OrderTotals,
}

impl CartView {
    pub fn new(cart: &Cart, clock: &DealClock, policy: &ShippingPolicy, method: ShippingMethod) -> Self {
        let items = cart
            .lines()
            .iter()
            .map(|line| {
                let product = line.product.as_ref();
                let list = product.map(|p| p.price).unwrap_or_default();
                let deal = line.deal_info.as_ref().filter(|d| clock.is_active(d));
                let quote = pricing::quote(list, deal, clock);
                let qty = Decimal::from(line.quantity.max(0));
                let counted = product.is_some();

                CartLineView {
                    product_id: line.product_id(),
                    product_name: product.map(|p| p.product_name.clone()),
                    quantity: line.quantity,
                    stock_quantity: product.map(|p| p.stock_quantity).unwrap_or(0),
                    list_price: pricing::round_money(quote.list_price),
                    unit_price: pricing::round_money(quote.unit_price),
                    line_total: if counted {
                        pricing::round_money(quote.unit_price * qty)
                    } else {
                        Decimal::ZERO
                    },
                    savings: if counted {
                        pricing::round_money(quote.savings * qty)
                    } else {
                        Decimal::ZERO
                    },
                    deal: deal.map(|d| DealBadge {
                        id: d.id,
                        title: d.title.clone(),
                        discount_percentage: pricing::clamp_discount(d.discount_percentage),
                        seconds_remaining: clock.seconds_remaining(d),
                    }),
                }
            })
            .collect();

        let totals = cart.totals(clock);
        let checkout = pricing::order_totals(totals.total_price, policy, method).rounded();

        Self {
            items,
            totals: CartTotals {
                total_price: pricing::round_money(totals.total_price),
                total_savings: pricing::round_money(totals.total_savings),
                original_total: pricing::round_money(totals.original_total),
                item_count: totals.item_count,
            },
            checkout,
        }
    }
}

/// Order plus its computed summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub summary: OrderSummary,
    pub cancellable: bool,
}

impl OrderView {
    /// Placed orders do not record their shipping method; history uses standard
    pub fn new(order: Order, policy: &ShippingPolicy) -> Self {
        Self::with_method(order, policy, ShippingMethod::Standard)
    }

    pub fn with_method(order: Order, policy: &ShippingPolicy, method: ShippingMethod) -> Self {
        Self {
            summary: pricing::order_summary(&order, policy, method),
            cancellable: order.status.can_cancel(),
            order,
        }
    }
}

/// Orders newest first, wrapped in views
pub fn order_views(mut orders: Vec<Order>, policy: &ShippingPolicy) -> Vec<OrderView> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    orders
        .into_iter()
        .map(|order| OrderView::new(order, policy))
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
}

impl OrderFilter {
    pub fn status(&self) -> Result<Option<OrderStatus>, String> {
        self.status
            .as_deref()
            .filter(|s| !s.trim().is_empty() && !s.eq_ignore_ascii_case("all"))
            .map(str::parse)
            .transpose()
    }
}

/// Number of orders per status, every status present
#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: usize,
}

pub fn status_counts(orders: &[Order]) -> Vec<StatusCount> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: orders.iter().filter(|o| o.status == status).count(),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealStatusQuery {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// Effective shipping rules
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingView {
    pub policy: ShippingPolicy,
    pub standard_delivery_days: Option<i32>,
    pub express_delivery_days: Option<i32>,
}
