//! Address model and related payloads

use serde::{Deserialize, Serialize};

/// Address usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    #[default]
    Shipping,
    Billing,
}

/// Address owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, rename = "type")]
    pub address_type: AddressType,
}

/// Address form payload
///
/// The form exposes a "use as shipping address" toggle instead of the type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    #[serde(default = "default_shipping")]
    pub shipping: bool,
}

fn default_shipping() -> bool {
    true
}

impl From<AddressInput> for Address {
    fn from(input: AddressInput) -> Self {
        Self {
            id: None,
            name: input.name,
            phone: input.phone,
            street: input.street.trim().to_string(),
            city: input.city.trim().to_string(),
            state: input.state.trim().to_string(),
            zip_code: input.zip_code.trim().to_string(),
            country: input.country.trim().to_string(),
            address_type: if input.shipping {
                AddressType::Shipping
            } else {
                AddressType::Billing
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_infers_address_type() {
        let input: AddressInput = serde_json::from_str(
            r#"{"street":" 1 Main St ","city":"Pune","state":"MH","zipCode":"411001",
                "country":"IN","shipping":false}"#,
        )
        .unwrap();

        let address = Address::from(input);
        assert_eq!(address.address_type, AddressType::Billing);
        assert_eq!(address.street, "1 Main St");

        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json["type"], "BILLING");
        assert_eq!(json["zipCode"], "411001");
    }
}
