//! Product model and related payloads

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_available() -> bool {
    true
}

/// Catalog product as served by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: i64,
    #[serde(default, alias = "name")]
    pub product_name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, rename = "desc", alias = "description")]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    /// Units in stock
    #[serde(default, rename = "quantity", alias = "stockQuantity")]
    pub stock_quantity: i64,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

impl Product {
    /// Whether at least one unit can be put in a cart
    pub fn in_stock(&self) -> bool {
        self.available && self.stock_quantity > 0
    }

    /// Lowercased haystack used by catalog search
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [
            Some(self.product_name.as_str()),
            self.brand.as_deref(),
            self.category.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Product image reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub image_name: Option<String>,
    #[serde(default)]
    pub image_type: Option<String>,
    #[serde(default)]
    pub image_data: Option<String>,
}

/// Admin product form payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub product_name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, rename = "desc")]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(rename = "quantity", alias = "stockQuantity")]
    pub stock_quantity: i64,
    pub price: Decimal,
}
