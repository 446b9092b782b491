//! Application state shared across handlers

use std::sync::Arc;
use tracing::warn;

use common::{DealClock, pricing::ShippingPolicy};

use crate::{
    backend::BackendClient, cart::CartStore, deal_refresher::DealCache, forms::FormGuard,
    session::SessionManager, settings::StorefrontConfig,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<StorefrontConfig>,
    pub backend: BackendClient,
    pub sessions: SessionManager,
    pub carts: CartStore,
    pub deals: DealCache,
    pub forms: FormGuard,
}

impl AppState {
    pub fn new(config: StorefrontConfig, backend: BackendClient, carts: CartStore) -> anyhow::Result<Self> {
        let sessions = SessionManager::new(
            backend.clone(),
            config.token_key()?,
            config.renew_threshold_secs,
        );

        Ok(Self {
            sessions,
            deals: DealCache::new(backend.clone()),
            forms: FormGuard::new(),
            config: Arc::new(config),
            backend,
            carts,
        })
    }

    /// Clock for pricing at the current instant
    pub fn clock(&self) -> DealClock {
        DealClock::now_with_offset(self.config.utc_offset())
    }

    /// Shipping rules from the backend, falling back to the built-in defaults
    pub async fn shipping_policy(&self) -> ShippingPolicy {
        match self.backend.shipping_config().await {
            Ok(config) => ShippingPolicy::default().merged_with(&config),
            Err(e) => {
                warn!("Using default shipping policy: {}", e);
                ShippingPolicy::default()
            }
        }
    }
}
