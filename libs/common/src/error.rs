//! Custom error types for the common library
//!
//! This module defines the errors raised by cart reconciliation, input
//! validation and the key/value store that backs persisted carts.

use redis::RedisError;
use thiserror::Error;

/// Errors raised by the key/value store holding serialized carts
#[derive(Error, Debug)]
pub enum CacheError {
    /// Error occurred while opening a Redis connection
    #[error("Cache connection error: {0}")]
    Connection(#[source] RedisError),

    /// Error occurred while running a Redis command
    #[error("Cache command error: {0}")]
    Command(#[source] RedisError),

    /// Stored value could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Type alias for Result with CacheError
pub type CacheResult<T> = Result<T, CacheError>;

/// Rejected cart mutations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Requested quantity would exceed the product stock
    #[error("Only {available} unit(s) of product {product_id} in stock")]
    StockExceeded { product_id: i64, available: i64 },

    /// Product is flagged unavailable or has no stock at all
    #[error("Product {0} is out of stock")]
    OutOfStock(i64),

    /// Product is not present in the cart
    #[error("Product {0} is not in the cart")]
    NotInCart(i64),

    /// Quantity must be at least one
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),
}

/// A single failed form field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Type alias for validation results
pub type ValidationResult = Result<(), ValidationError>;
