//! In-memory deal snapshot kept current by a cron job
//!
//! Pricing reads deals on almost every request. The snapshot is refreshed on a
//! schedule and right after admin deal writes; until the first successful
//! refresh, reads go straight to the shop backend.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use common::models::Deal;

use crate::backend::{BackendClient, UpstreamResult};

#[derive(Clone)]
pub struct DealCache {
    backend: BackendClient,
    snapshot: Arc<RwLock<Option<Vec<Deal>>>>,
}

impl DealCache {
    pub fn new(backend: BackendClient) -> Self {
        Self {
            backend,
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    /// All deals, from the snapshot when one exists
    pub async fn current(&self) -> UpstreamResult<Vec<Deal>> {
        if let Some(deals) = self.snapshot.read().await.as_ref() {
            return Ok(deals.clone());
        }
        self.refresh().await
    }

    /// Fetch deals from the backend and replace the snapshot
    pub async fn refresh(&self) -> UpstreamResult<Vec<Deal>> {
        let deals = self.backend.list_deals().await?;
        info!(count = deals.len(), "Deal snapshot refreshed");
        *self.snapshot.write().await = Some(deals.clone());
        Ok(deals)
    }

    /// Refresh after a write, logging instead of failing the write
    pub async fn refresh_after_write(&self) {
        if let Err(e) = self.refresh().await {
            error!("Failed to refresh deals after write: {}", e);
            // Next read goes to the backend
            *self.snapshot.write().await = None;
        }
    }

    /// Start the periodic refresh job
    pub async fn start_refreshing(&self, schedule: &str) -> Result<JobScheduler> {
        let cache = self.clone();

        let scheduler = JobScheduler::new().await?;

        let job = Job::new_async(schedule, move |_, _| {
            let cache = cache.clone();
            Box::pin(async move {
                if let Err(e) = cache.refresh().await {
                    error!("Scheduled deal refresh failed: {}", e);
                }
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!("Started deal refresh scheduler with schedule: {}", schedule);
        Ok(scheduler)
    }
}
