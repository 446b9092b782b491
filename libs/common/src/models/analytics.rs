//! Admin analytics dashboard payload

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::product::Product;

/// Best-selling product row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: i64,
    #[serde(default, alias = "sales")]
    pub total_quantity: i64,
    #[serde(default, alias = "revenue")]
    pub total_revenue: Decimal,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Chart series keyed by label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryData {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
}

/// Analytics report; sections the storefront does not touch pass through untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    #[serde(default)]
    pub top_products: Vec<TopProduct>,
    #[serde(default)]
    pub category_data: CategoryData,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AnalyticsReport {
    /// Attach catalog details to top products and recount categories from the catalog
    pub fn enrich(&mut self, products: &[Product]) {
        for top in &mut self.top_products {
            match products.iter().find(|p| p.id == top.product_id) {
                Some(product) => {
                    top.name = Some(product.product_name.clone());
                    top.category = Some(product.category.clone().unwrap_or_else(|| "N/A".into()));
                    top.image = product.images.first().and_then(|i| i.image_data.clone());
                }
                None => {
                    top.name = Some("Product Not Found".to_string());
                    top.category = Some("N/A".to_string());
                }
            }
        }

        if !products.is_empty() {
            let mut counts: BTreeMap<String, u64> = BTreeMap::new();
            for product in products {
                let category = product
                    .category
                    .clone()
                    .unwrap_or_else(|| "Uncategorized".to_string());
                *counts.entry(category).or_default() += 1;
            }

            self.category_data = CategoryData {
                labels: counts.keys().cloned().collect(),
                values: counts.values().map(|c| serde_json::Value::from(*c)).collect(),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Product> {
        serde_json::from_str(
            r#"[{"id":1,"productName":"Kettle","category":"Kitchen"},
                {"id":2,"productName":"Pan","category":"Kitchen"},
                {"id":3,"productName":"Shoe","category":"Footwear"}]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_enrich_names_top_products() {
        let mut report: AnalyticsReport = serde_json::from_str(
            r#"{"stats":{"totalOrders":4},
                "topProducts":[{"productId":2,"totalQuantity":5,"totalRevenue":250.0},
                               {"productId":99,"totalQuantity":1,"totalRevenue":10.0}]}"#,
        )
        .unwrap();

        report.enrich(&catalog());

        assert_eq!(report.top_products[0].name.as_deref(), Some("Pan"));
        assert_eq!(report.top_products[0].category.as_deref(), Some("Kitchen"));
        assert_eq!(
            report.top_products[1].name.as_deref(),
            Some("Product Not Found")
        );
        assert!(report.extra.contains_key("stats"));
    }

    #[test]
    fn test_enrich_recounts_categories() {
        let mut report = AnalyticsReport::default();
        report.enrich(&catalog());

        assert_eq!(report.category_data.labels, vec!["Footwear", "Kitchen"]);
        assert_eq!(
            report.category_data.values,
            vec![serde_json::json!(1), serde_json::json!(2)]
        );
    }
}
