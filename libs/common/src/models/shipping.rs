//! Shipping configuration managed from the admin back-office

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Shipping fees and free-shipping rule; every field may be unset upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingConfig {
    #[serde(default)]
    pub standard_shipping_fee: Option<Decimal>,
    #[serde(default)]
    pub express_shipping_fee: Option<Decimal>,
    #[serde(default)]
    pub free_shipping_threshold: Option<Decimal>,
    #[serde(default)]
    pub standard_delivery_days: Option<i32>,
    #[serde(default)]
    pub express_delivery_days: Option<i32>,
    #[serde(default)]
    pub free_shipping_enabled: Option<bool>,
}
