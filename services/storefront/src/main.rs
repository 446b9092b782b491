use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod backend;
mod cart;
mod catalog;
mod deal_refresher;
mod error;
mod forms;
mod middleware;
mod models;
mod routes;
mod session;
mod settings;
mod state;

#[cfg(test)]
mod test_support;

use common::cache::{KeyValueStore, RedisConfig, RedisPool};
use tokio::net::TcpListener;

use crate::{
    backend::BackendClient,
    cart::CartStore,
    settings::{CartBackend, StorefrontConfig},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting storefront service");

    let config = StorefrontConfig::from_env()?;

    // Cart storage
    let redis_config = RedisConfig::from_env()?;
    let store = match config.cart_backend {
        CartBackend::Redis => {
            let pool = RedisPool::new(&redis_config)?;
            match pool.health_check().await {
                Ok(true) => info!("Redis connection successful"),
                Ok(false) | Err(_) => warn!("Redis is not reachable yet; cart requests will fail until it is"),
            }
            KeyValueStore::Redis(pool)
        }
        CartBackend::Memory => {
            warn!("Carts are kept in memory and will not survive a restart");
            KeyValueStore::memory()
        }
    };
    let carts = CartStore::new(store, redis_config.cart_ttl_seconds);

    // Shop backend
    let api_url = config.api_base_url();
    let backend = BackendClient::new(&api_url, config.request_timeout())?;
    info!("Using shop backend at {}", api_url);

    let schedule = config.deal_refresh_schedule.clone();
    let bind_addr = config.bind_addr();
    let app_state = AppState::new(config, backend, carts)?;

    // Warm the deal snapshot, then keep it fresh
    if let Err(e) = app_state.deals.refresh().await {
        warn!("Initial deal refresh failed: {}", e);
    }
    let _scheduler = app_state.deals.start_refreshing(&schedule).await?;

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Storefront service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
