//! Storefront configuration
//!
//! Values come from `STOREFRONT_*` environment variables, e.g.
//! `STOREFRONT_PORT=8081` or `STOREFRONT_API_URL=http://shop:8080`.

use anyhow::Result;
use chrono::{FixedOffset, Offset, Utc};
use config::{Config, Environment};
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::time::Duration;

/// Where persisted carts are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartBackend {
    Redis,
    Memory,
}

/// Storefront service settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorefrontConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the shop backend; derived from the host name when unset
    pub api_url: Option<String>,
    pub request_timeout_secs: u64,
    /// Offset applied to deal dates, in minutes east of UTC
    pub utc_offset_minutes: i32,
    /// Cron expression for the deal refresh job
    pub deal_refresh_schedule: String,
    /// Tokens expiring within this window are refreshed
    pub renew_threshold_secs: i64,
    pub cart_backend: CartBackend,
    /// HMAC secret the shop backend signs tokens with; no default
    pub jwt_secret: String,
    /// Set when `jwt_secret` is base64 encoded
    pub jwt_secret_base64: bool,
}

impl StorefrontConfig {
    /// Load settings from the environment on top of the defaults
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8081)?
            .set_default("request_timeout_secs", 10)?
            .set_default("utc_offset_minutes", 0)?
            .set_default("deal_refresh_schedule", "0 */5 * * * *")?
            .set_default("renew_threshold_secs", 300)?
            .set_default("cart_backend", "redis")?
            .set_default("jwt_secret_base64", false)?
            .add_source(Environment::with_prefix("STOREFRONT").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Explicit API URL, else the current host on port 8080
    pub fn api_base_url(&self) -> String {
        if let Some(url) = self.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.trim_end_matches('/').to_string();
        }

        match std::env::var("HOSTNAME") {
            Ok(host) if !host.is_empty() && host != "localhost" => {
                format!("http://{}:8080", host)
            }
            _ => "http://localhost:8080".to_string(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Key for checking token signatures
    pub fn token_key(&self) -> Result<DecodingKey> {
        let secret = self.jwt_secret.trim();
        if secret.is_empty() {
            anyhow::bail!("STOREFRONT_JWT_SECRET must not be empty");
        }

        if self.jwt_secret_base64 {
            Ok(DecodingKey::from_base64_secret(secret)?)
        } else {
            Ok(DecodingKey::from_secret(secret.as_bytes()))
        }
    }

    /// Store offset for deal dates; out-of-range values fall back to UTC
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or(Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "STOREFRONT_JWT_SECRET",
        "STOREFRONT_JWT_SECRET_BASE64",
        "STOREFRONT_PORT",
        "STOREFRONT_API_URL",
        "STOREFRONT_UTC_OFFSET_MINUTES",
        "STOREFRONT_CART_BACKEND",
        "HOSTNAME",
    ];

    fn clear() {
        unsafe {
            for var in VARS {
                std::env::remove_var(var);
            }
        }
    }

    /// Clean environment with only the required secret set
    fn reset() {
        clear();
        unsafe {
            std::env::set_var("STOREFRONT_JWT_SECRET", "shop-secret");
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        reset();

        let config = StorefrontConfig::from_env().unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.cart_backend, CartBackend::Redis);
        assert_eq!(config.api_base_url(), "http://localhost:8080");
        assert_eq!(config.utc_offset().local_minus_utc(), 0);
        assert!(config.token_key().is_ok());

        clear();
    }

    #[test]
    #[serial]
    fn test_jwt_secret_is_required() {
        clear();
        assert!(StorefrontConfig::from_env().is_err());

        unsafe {
            std::env::set_var("STOREFRONT_JWT_SECRET", "not base64!");
            std::env::set_var("STOREFRONT_JWT_SECRET_BASE64", "true");
        }
        let config = StorefrontConfig::from_env().unwrap();
        assert!(config.token_key().is_err());

        clear();
    }

    #[test]
    #[serial]
    fn test_custom_values() {
        reset();
        unsafe {
            std::env::set_var("STOREFRONT_PORT", "9000");
            std::env::set_var("STOREFRONT_API_URL", "http://shop.internal:8080/");
            std::env::set_var("STOREFRONT_UTC_OFFSET_MINUTES", "330");
            std::env::set_var("STOREFRONT_CART_BACKEND", "memory");
        }

        let config = StorefrontConfig::from_env().unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.api_base_url(), "http://shop.internal:8080");
        assert_eq!(config.utc_offset().local_minus_utc(), 330 * 60);
        assert_eq!(config.cart_backend, CartBackend::Memory);

        clear();
    }

    #[test]
    #[serial]
    fn test_api_url_follows_hostname() {
        reset();
        unsafe {
            std::env::set_var("HOSTNAME", "shop-frontend");
        }

        let config = StorefrontConfig::from_env().unwrap();
        assert_eq!(config.api_base_url(), "http://shop-frontend:8080");

        clear();
    }
}
