//! Deal model and related payloads

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::Product;

/// Time-boxed percentage discount applied to a set of products
///
/// Dates and times are kept as the raw strings the backend sends
/// (`YYYY-MM-DD` and `HH:MM[:SS]`); interpretation lives in
/// [`crate::pricing::DealClock`] so a malformed value only makes the deal
/// inactive instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    /// Admin on/off switch; `None` when the payload does not carry it
    #[serde(default, alias = "isActive")]
    pub active: Option<bool>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Deal {
    /// Whether the deal lists the given product
    pub fn covers(&self, product_id: i64) -> bool {
        self.products.iter().any(|p| p.id == product_id)
    }
}

/// Product reference used in deal writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductId {
    pub id: i64,
}

/// Admin deal form payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    #[serde(default = "default_active", alias = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub products: Vec<ProductId>,
}

fn default_active() -> bool {
    true
}
