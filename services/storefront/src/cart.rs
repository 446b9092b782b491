//! Per-user cart persistence

use common::{
    Cart, CartLine,
    cache::KeyValueStore,
    error::CacheResult,
};
use tracing::debug;

/// Loads and saves carts under `cart:{owner}`
#[derive(Clone)]
pub struct CartStore {
    store: KeyValueStore,
    ttl_seconds: Option<u64>,
}

impl CartStore {
    pub fn new(store: KeyValueStore, ttl_seconds: Option<u64>) -> Self {
        Self { store, ttl_seconds }
    }

    fn key(owner: &str) -> String {
        format!("cart:{}", owner)
    }

    /// Stored cart, or an empty one
    pub async fn load(&self, owner: &str) -> CacheResult<Cart> {
        let lines: Option<Vec<CartLine>> = self.store.get_json(&Self::key(owner)).await?;
        Ok(lines.map(Cart::from_lines).unwrap_or_default())
    }

    pub async fn save(&self, owner: &str, cart: &Cart) -> CacheResult<()> {
        if cart.is_empty() {
            return self.clear(owner).await;
        }
        debug!(owner, lines = cart.lines().len(), "Saving cart");
        self.store
            .set_json(&Self::key(owner), cart, self.ttl_seconds)
            .await
    }

    pub async fn clear(&self, owner: &str) -> CacheResult<()> {
        self.store.delete(&Self::key(owner)).await
    }

    pub async fn health_check(&self) -> CacheResult<bool> {
        self.store.health_check().await
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }
}
