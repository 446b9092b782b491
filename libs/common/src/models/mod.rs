//! Storefront domain models
//!
//! Field names follow the JSON produced and accepted by the shop backend.

pub mod address;
pub mod analytics;
pub mod deal;
pub mod order;
pub mod product;
pub mod shipping;
pub mod user;

// Re-export for convenience
pub use address::{Address, AddressInput, AddressType};
pub use analytics::{AnalyticsReport, CategoryData, TopProduct};
pub use deal::{Deal, DealInput, ProductId};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, StatusUpdate};
pub use product::{Product, ProductImage, ProductInput};
pub use shipping::ShippingConfig;
pub use user::{AuthResponse, Credentials, Registration, Role, RoleUpdate, User};
