//! Common library for the storefront
//!
//! Domain models shared with the shop backend, the pricing rules used for
//! every displayed amount, the cart aggregate, form validation and the
//! key/value store persisted carts are kept in.

pub mod cache;
pub mod cart;
pub mod error;
pub mod models;
pub mod pricing;
pub mod validation;

pub use cart::{Cart, CartLine, QuantityChange};
pub use error::{CacheError, CartError, ValidationError};
pub use pricing::DealClock;
