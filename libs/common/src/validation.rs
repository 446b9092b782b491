//! Form input validation
//!
//! Each validator returns the first failing field; the storefront reports it
//! back to the form unchanged.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

use crate::error::{ValidationError, ValidationResult};
use crate::models::{AddressInput, Credentials, DealInput, ProductInput, Registration, Role};

const PASSWORD_SPECIALS: &str = "@$!%*?&";

fn required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(())
}

/// Validate username
pub fn validate_username(username: &str) -> ValidationResult {
    required("userName", username)?;

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]{3,20}$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err(ValidationError::new(
            "userName",
            "must be 3-20 letters, numbers or underscores",
        ));
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> ValidationResult {
    required("email", email)?;

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to compile email regex"));

    if !regex.is_match(email) {
        return Err(ValidationError::new("email", "is not a valid email address"));
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> ValidationResult {
    required("password", password)?;

    if password.chars().count() < 8 {
        return Err(ValidationError::new("password", "must be at least 8 characters long"));
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if PASSWORD_SPECIALS.contains(c) {
            has_special = true;
        } else {
            return Err(ValidationError::new(
                "password",
                format!("may only contain letters, digits and {}", PASSWORD_SPECIALS),
            ));
        }
    }

    if !has_upper {
        return Err(ValidationError::new("password", "must contain an uppercase letter"));
    }

    if !has_lower {
        return Err(ValidationError::new("password", "must contain a lowercase letter"));
    }

    if !has_digit {
        return Err(ValidationError::new("password", "must contain a digit"));
    }

    if !has_special {
        return Err(ValidationError::new(
            "password",
            format!("must contain one of {}", PASSWORD_SPECIALS),
        ));
    }

    Ok(())
}

/// Validate phone number
pub fn validate_phone(phone: &str) -> ValidationResult {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[\d\s\-()]+$").expect("Failed to compile phone regex"));

    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !regex.is_match(phone.trim()) || digits < 7 {
        return Err(ValidationError::new("phone", "is not a valid phone number"));
    }

    Ok(())
}

pub fn validate_registration(form: &Registration) -> ValidationResult {
    validate_username(&form.user_name)?;
    validate_email(&form.email)?;
    validate_password(&form.password)?;
    required("firstName", &form.first_name)?;
    required("lastName", &form.last_name)?;
    if let Some(phone) = form.phone_number.as_deref().filter(|p| !p.trim().is_empty()) {
        validate_phone(phone)?;
    }
    Ok(())
}

/// Login needs a password plus a user name or an email
pub fn validate_credentials(form: &Credentials) -> ValidationResult {
    let has_identity = [form.user_name.as_deref(), form.email.as_deref()]
        .into_iter()
        .flatten()
        .any(|value| !value.trim().is_empty());
    if !has_identity {
        return Err(ValidationError::new("userName", "is required"));
    }
    required("password", &form.password)
}

pub fn validate_product(form: &ProductInput) -> ValidationResult {
    required("productName", &form.product_name)?;
    if form.price < Decimal::ZERO {
        return Err(ValidationError::new("price", "must not be negative"));
    }
    if form.stock_quantity < 0 {
        return Err(ValidationError::new("quantity", "must not be negative"));
    }
    Ok(())
}

fn parse_date_time(field: &'static str, date: &str, time: &str) -> Result<NaiveDateTime, ValidationError> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::new(field, "must be a date in YYYY-MM-DD format"))?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M"))
        .map_err(|_| ValidationError::new(field, "must be a time in HH:MM format"))?;
    Ok(NaiveDateTime::new(date, time))
}

pub fn validate_deal(form: &DealInput) -> ValidationResult {
    required("title", &form.title)?;

    if form.discount_percentage < Decimal::ZERO || form.discount_percentage > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new(
            "discountPercentage",
            "must be between 0 and 100",
        ));
    }

    let start = parse_date_time("startDate", &form.start_date, &form.start_time)?;
    let end = parse_date_time("endDate", &form.end_date, &form.end_time)?;
    if start >= end {
        return Err(ValidationError::new("endDate", "must be after the start"));
    }

    if form.products.is_empty() {
        return Err(ValidationError::new("products", "select at least one product"));
    }

    Ok(())
}

pub fn validate_address(form: &AddressInput) -> ValidationResult {
    required("street", &form.street)?;
    required("city", &form.city)?;
    required("state", &form.state)?;
    required("zipCode", &form.zip_code)?;
    required("country", &form.country)?;
    if let Some(phone) = form.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        validate_phone(phone)?;
    }
    Ok(())
}

/// Parse an admin role selection
pub fn validate_role(role: &str) -> Result<Role, ValidationError> {
    role.parse::<Role>()
        .map_err(|_| ValidationError::new("role", "must be USER or ADMIN"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductId;

    fn deal_form() -> DealInput {
        DealInput {
            title: "Monsoon sale".into(),
            description: String::new(),
            discount_percentage: Decimal::from(20),
            image_url: None,
            start_date: "2024-06-01".into(),
            start_time: "09:00".into(),
            end_date: "2024-06-30".into(),
            end_time: "23:59".into(),
            is_active: true,
            products: vec![ProductId { id: 1 }],
        }
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("asha_99").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("asha@example.com").is_ok());
        assert!(validate_email("asha@example").is_err());
        assert!(validate_email("a sha@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Secret1!").is_ok());
        assert!(validate_password("secret1!").is_err());
        assert!(validate_password("SECRET1!").is_err());
        assert!(validate_password("Secret!!").is_err());
        assert!(validate_password("Secret12").is_err());
        assert!(validate_password("Sec1!").is_err());
        assert!(validate_password("Secret1#").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+91 (20) 555-0100").is_ok());
        assert!(validate_phone("phone").is_err());
        assert!(validate_phone("12").is_err());
    }

    #[test]
    fn test_validate_deal_window_and_discount() {
        assert!(validate_deal(&deal_form()).is_ok());

        let mut form = deal_form();
        form.discount_percentage = Decimal::from(120);
        assert_eq!(validate_deal(&form).unwrap_err().field, "discountPercentage");

        let mut form = deal_form();
        form.end_date = "2024-06-01".into();
        form.end_time = "09:00".into();
        assert_eq!(validate_deal(&form).unwrap_err().field, "endDate");

        let mut form = deal_form();
        form.products.clear();
        assert_eq!(validate_deal(&form).unwrap_err().field, "products");
    }

    #[test]
    fn test_validate_credentials() {
        let creds = Credentials {
            user_name: None,
            email: Some("asha@example.com".into()),
            password: "x".into(),
        };
        assert!(validate_credentials(&creds).is_ok());

        let creds = Credentials { user_name: None, email: None, password: "x".into() };
        assert!(validate_credentials(&creds).is_err());
    }

    #[test]
    fn test_validate_role() {
        assert_eq!(validate_role("ADMIN"), Ok(Role::Admin));
        assert!(validate_role("root").is_err());
    }
}
