//! Custom error types for the storefront service
//!
//! Every failure reaching a client is rendered as
//! `{ "error": <message>, "kind": <category>, "redirect": <path or null> }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::{CacheError, CartError, ValidationError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Category reported to clients so they can pick a reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    NotFound,
    Validation,
    Server,
    Network,
    Conflict,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Auth => "AUTH",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Server => "SERVER",
            ErrorKind::Network => "NETWORK",
            ErrorKind::Conflict => "CONFLICT",
        }
    }
}

/// Custom error type for the storefront service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, unreadable or expired session; the client must log in again
    #[error("Your session has expired. Please log in again.")]
    Unauthorized,

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Action clashes with current state (stock, order status, duplicate submit)
    #[error("{0}")]
    Conflict(String),

    /// Non-2xx answer from the shop backend
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Shop backend could not be reached
    #[error("Unable to reach the shop server. Please check your connection.")]
    Network(String),

    #[error("Cart storage error: {0}")]
    Cache(#[from] CacheError),

    #[error("Internal server error")]
    InternalServerError,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized | ApiError::Forbidden => ErrorKind::Auth,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::BadRequest(_) => ErrorKind::Validation,
            ApiError::Conflict(_) => ErrorKind::Conflict,
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Upstream { .. } | ApiError::Cache(_) | ApiError::InternalServerError => {
                ErrorKind::Server
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream { .. } | ApiError::Network(_) => StatusCode::BAD_GATEWAY,
            ApiError::Cache(_) | ApiError::InternalServerError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Where the client should navigate after this error
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            ApiError::Unauthorized => Some("/login"),
            _ => None,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::NotInCart(_) => ApiError::NotFound(err.to_string()),
            CartError::InvalidQuantity(_) => ApiError::BadRequest(err.to_string()),
            CartError::StockExceeded { .. } | CartError::OutOfStock(_) => {
                ApiError::Conflict(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Upstream { status: upstream, message } => {
                error!(upstream_status = upstream, "Shop backend error: {}", message)
            }
            ApiError::Network(detail) => error!("Shop backend unreachable: {}", detail),
            other if status.is_server_error() => {
                error!(kind = other.kind().as_str(), "Request failed: {:?}", other)
            }
            _ => {}
        }

        // Storage details stay in the log
        let message = match &self {
            ApiError::Cache(_) => "Unable to load your cart right now".to_string(),
            other => other.to_string(),
        };

        let mut response = error_response(status, &message, self.kind(), self.redirect());
        if matches!(self, ApiError::NotFound(_)) {
            response.extensions_mut().insert(NotFoundMessage(message));
        }
        response
    }
}

/// Carried on rendered not-found errors so an outer layer can add a redirect
#[derive(Debug, Clone)]
pub struct NotFoundMessage(pub String);

/// Not-found error sending the client back to `list`
pub fn not_found_response(message: &str, list: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, message, ErrorKind::NotFound, Some(list))
}

fn error_response(status: StatusCode, message: &str, kind: ErrorKind, redirect: Option<&str>) -> Response {
    let body = Json(json!({
        "error": message,
        "kind": kind.as_str(),
        "redirect": redirect,
    }));

    (status, body).into_response()
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
