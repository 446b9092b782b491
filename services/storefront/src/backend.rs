//! Client for the shop backend REST API
//!
//! Each call forwards the caller's bearer token when one is given. Failures
//! are classified once here so handlers only see [`UpstreamError`].

use reqwest::{
    Client, Method, RequestBuilder, StatusCode,
    multipart::{Form, Part},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use common::models::{
    Address, AnalyticsReport, AuthResponse, Credentials, Deal, DealInput, NewOrder, Order,
    Product, ProductInput, Registration, RoleUpdate, ShippingConfig, StatusUpdate, User,
};

use crate::error::ApiError;

/// Failure talking to the shop backend
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Request never got an HTTP answer
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// 401 or 403
    #[error("not authorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    /// 400 with the server-supplied message
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    /// 2xx with a body that did not match the expected shape
    #[error("unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),

    /// Request body could not be built
    #[error("could not encode request: {0}")]
    Encode(String),
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Network(e) => ApiError::Network(e.to_string()),
            UpstreamError::Unauthorized => ApiError::Unauthorized,
            UpstreamError::NotFound(msg) => ApiError::NotFound(msg),
            UpstreamError::BadRequest(msg) => ApiError::BadRequest(msg),
            UpstreamError::Status { status, message } => ApiError::Upstream { status, message },
            UpstreamError::Decode(e) => {
                tracing::error!("Malformed upstream response: {}", e);
                ApiError::InternalServerError
            }
            UpstreamError::Encode(e) => {
                tracing::error!("Could not encode upstream request: {}", e);
                ApiError::InternalServerError
            }
        }
    }
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Typed access to the shop backend
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "Upstream request");
        let builder = self.http.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and classify the response status
    async fn execute(&self, builder: RequestBuilder) -> UpstreamResult<reqwest::Response> {
        let response = builder.send().await.map_err(|e| {
            warn!("Shop backend unreachable: {}", e);
            UpstreamError::Network(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = server_message(&body).unwrap_or_else(|| fallback_message(status));
        warn!(status = status.as_u16(), %message, "Shop backend rejected request");

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamError::Unauthorized,
            StatusCode::NOT_FOUND => UpstreamError::NotFound(message),
            StatusCode::BAD_REQUEST => UpstreamError::BadRequest(message),
            other => UpstreamError::Status {
                status: other.as_u16(),
                message,
            },
        })
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> UpstreamResult<T> {
        self.execute(builder)
            .await?
            .json()
            .await
            .map_err(UpstreamError::Decode)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> UpstreamResult<T> {
        self.json(self.request(Method::GET, path, token)).await
    }

    async fn send<B, T>(&self, method: Method, path: &str, token: Option<&str>, body: &B) -> UpstreamResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json(self.request(method, path, token).json(body)).await
    }

    /// Call whose response body is ignored
    async fn send_unit(&self, builder: RequestBuilder) -> UpstreamResult<()> {
        self.execute(builder).await.map(|_| ())
    }

    // Products

    pub async fn list_products(&self) -> UpstreamResult<Vec<Product>> {
        self.get("/api/products", None).await
    }

    pub async fn get_product(&self, id: i64) -> UpstreamResult<Product> {
        self.get(&format!("/api/product/{}", id), None).await
    }

    pub async fn create_product(&self, token: &str, input: &ProductInput) -> UpstreamResult<Product> {
        let form = product_form(input)?;
        self.json(self.request(Method::POST, "/api/product", Some(token)).multipart(form))
            .await
    }

    pub async fn update_product(&self, token: &str, id: i64, input: &ProductInput) -> UpstreamResult<Product> {
        let form = product_form(input)?;
        self.json(
            self.request(Method::PUT, &format!("/api/product/{}", id), Some(token))
                .multipart(form),
        )
        .await
    }

    pub async fn delete_product(&self, token: &str, id: i64) -> UpstreamResult<()> {
        self.send_unit(self.request(Method::DELETE, &format!("/api/product/{}", id), Some(token)))
            .await
    }

    // Deals

    pub async fn list_deals(&self) -> UpstreamResult<Vec<Deal>> {
        self.get("/api/deals", None).await
    }

    pub async fn get_deal(&self, id: i64) -> UpstreamResult<Deal> {
        self.get(&format!("/api/deals/{}", id), None).await
    }

    pub async fn create_deal(&self, token: &str, input: &DealInput) -> UpstreamResult<Deal> {
        self.json(
            self.request(Method::POST, "/api/deals", Some(token))
                .multipart(deal_form(input)),
        )
        .await
    }

    pub async fn update_deal(&self, token: &str, id: i64, input: &DealInput) -> UpstreamResult<Deal> {
        self.json(
            self.request(Method::PUT, &format!("/api/deals/{}", id), Some(token))
                .multipart(deal_form(input)),
        )
        .await
    }

    pub async fn delete_deal(&self, token: &str, id: i64) -> UpstreamResult<()> {
        self.send_unit(self.request(Method::DELETE, &format!("/api/deals/{}", id), Some(token)))
            .await
    }

    pub async fn set_deal_status(&self, token: &str, id: i64, active: bool) -> UpstreamResult<Deal> {
        let builder = self
            .request(Method::PATCH, &format!("/api/deals/{}/status", id), Some(token))
            .query(&[("isActive", active)]);
        self.json(builder).await
    }

    // Orders

    pub async fn all_orders(&self, token: &str) -> UpstreamResult<Vec<Order>> {
        self.get("/api/orders/all", Some(token)).await
    }

    pub async fn get_order(&self, token: &str, id: i64) -> UpstreamResult<Order> {
        self.get(&format!("/api/orders/{}", id), Some(token)).await
    }

    pub async fn user_orders(&self, token: &str, user_id: i64) -> UpstreamResult<Vec<Order>> {
        self.get(&format!("/api/orders/user/{}", user_id), Some(token))
            .await
    }

    pub async fn create_order(&self, token: &str, order: &NewOrder) -> UpstreamResult<Order> {
        self.send(Method::POST, "/api/orders", Some(token), order).await
    }

    pub async fn cancel_order(&self, token: &str, id: i64) -> UpstreamResult<Order> {
        self.json(self.request(Method::PUT, &format!("/api/orders/{}/cancel", id), Some(token)))
            .await
    }

    pub async fn update_order_status(&self, token: &str, id: i64, update: &StatusUpdate) -> UpstreamResult<Order> {
        self.send(Method::PATCH, &format!("/api/orders/{}/status", id), Some(token), update)
            .await
    }

    pub async fn delete_order(&self, token: &str, id: i64) -> UpstreamResult<()> {
        self.send_unit(self.request(Method::DELETE, &format!("/api/orders/{}", id), Some(token)))
            .await
    }

    // Addresses

    pub async fn user_addresses(&self, token: &str, user_id: i64) -> UpstreamResult<Vec<Address>> {
        self.get(&format!("/api/address/user/{}", user_id), Some(token))
            .await
    }

    pub async fn create_address(&self, token: &str, address: &Address) -> UpstreamResult<Address> {
        self.send(Method::POST, "/api/address", Some(token), address).await
    }

    pub async fn update_address(&self, token: &str, id: i64, address: &Address) -> UpstreamResult<Address> {
        self.send(Method::PUT, &format!("/api/address/{}", id), Some(token), address)
            .await
    }

    pub async fn delete_address(&self, token: &str, id: i64) -> UpstreamResult<()> {
        self.send_unit(self.request(Method::DELETE, &format!("/api/address/{}", id), Some(token)))
            .await
    }

    // Users and authentication

    pub async fn list_users(&self, token: &str) -> UpstreamResult<Vec<User>> {
        self.get("/api/users", Some(token)).await
    }

    pub async fn profile(&self, token: &str) -> UpstreamResult<User> {
        self.get("/api/users/profile", Some(token)).await
    }

    pub async fn update_role(&self, token: &str, id: i64, update: &RoleUpdate) -> UpstreamResult<User> {
        self.send(Method::PUT, &format!("/api/users/{}/role", id), Some(token), update)
            .await
    }

    pub async fn delete_user(&self, token: &str, id: i64) -> UpstreamResult<()> {
        self.send_unit(self.request(Method::DELETE, &format!("/api/users/{}", id), Some(token)))
            .await
    }

    pub async fn login(&self, credentials: &Credentials) -> UpstreamResult<AuthResponse> {
        self.send(Method::POST, "/api/users/login", None, credentials).await
    }

    pub async fn register(&self, registration: &Registration) -> UpstreamResult<AuthResponse> {
        self.send(Method::POST, "/api/users/register", None, registration)
            .await
    }

    /// Exchange a token for a fresh one
    pub async fn refresh_token(&self, token: &str) -> UpstreamResult<String> {
        #[derive(serde::Deserialize)]
        struct Refreshed {
            token: String,
        }

        let refreshed: Refreshed = self
            .send(Method::POST, "/api/users/refresh-token", None, &json!({ "token": token }))
            .await?;
        Ok(refreshed.token)
    }

    // Analytics and shipping

    pub async fn analytics(&self, token: &str) -> UpstreamResult<AnalyticsReport> {
        self.get("/api/analytics", Some(token)).await
    }

    pub async fn shipping_config(&self) -> UpstreamResult<ShippingConfig> {
        self.get("/api/shipping/config", None).await
    }

    pub async fn update_shipping_config(&self, token: &str, config: &ShippingConfig) -> UpstreamResult<ShippingConfig> {
        self.send(Method::PUT, "/api/shipping/config", Some(token), config)
            .await
    }
}

/// Product writes carry the product as a JSON part named `product`
fn product_form(input: &ProductInput) -> UpstreamResult<Form> {
    let json = serde_json::to_string(input).map_err(|e| UpstreamError::Encode(e.to_string()))?;
    let part = Part::text(json)
        .mime_str("application/json")
        .map_err(|e| UpstreamError::Encode(e.to_string()))?;
    Ok(Form::new().part("product", part))
}

/// Deal writes are plain form fields, one `productIds` entry per product
fn deal_form(input: &DealInput) -> Form {
    let form = Form::new()
        .text("title", input.title.clone())
        .text("description", input.description.clone())
        .text("discountPercentage", input.discount_percentage.to_string())
        .text("startDate", input.start_date.clone())
        .text("endDate", input.end_date.clone())
        .text("startTime", input.start_time.clone())
        .text("endTime", input.end_time.clone())
        .text("isActive", input.is_active.to_string());

    input
        .products
        .iter()
        .fold(form, |form, product| form.text("productIds", product.id.to_string()))
}

/// `message` or `error` field of a JSON error body, or a short plain-text body
fn server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => ["message", "error"]
            .into_iter()
            .find_map(|key| value.get(key).and_then(|v| v.as_str()))
            .filter(|msg| !msg.is_empty())
            .map(str::to_string),
        Err(_) if body.len() <= 200 && !body.starts_with('<') => Some(body.to_string()),
        Err(_) => None,
    }
}

fn fallback_message(status: StatusCode) -> String {
    match status {
        StatusCode::UNAUTHORIZED => "Your session has expired. Please log in again.".to_string(),
        StatusCode::FORBIDDEN => "You do not have permission to perform this action.".to_string(),
        StatusCode::NOT_FOUND => "The requested resource was not found.".to_string(),
        StatusCode::BAD_REQUEST => "Please check your input and try again.".to_string(),
        s if s.is_server_error() => "Server error. Please try again later.".to_string(),
        _ => "An unexpected error occurred.".to_string(),
    }
}
