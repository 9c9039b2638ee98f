//! Process-wide cache of region-scoped clients.
//!
//! One registry is created at startup and shared by every invocation running in
//! the process. For each capability it holds at most one client per region.
//! A failed construction is not remembered: the next lookup for that region
//! tries again.

use crate::traits::{ClientError, MessageQueue, ObjectStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Builds new region-scoped clients on registry misses.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create_store(&self, region: &str) -> Result<Arc<dyn ObjectStore>, ClientError>;

    async fn create_queue(&self, region: &str) -> Result<Arc<dyn MessageQueue>, ClientError>;
}

pub struct RegionClientRegistry {
    factory: Arc<dyn ClientFactory>,
    stores: Mutex<HashMap<String, Arc<OnceCell<Arc<dyn ObjectStore>>>>>,
    queues: Mutex<HashMap<String, Arc<OnceCell<Arc<dyn MessageQueue>>>>>,
}

impl RegionClientRegistry {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            factory,
            stores: Mutex::new(HashMap::new()),
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Object store client for `region`, created on first use.
    pub async fn store_client(&self, region: &str) -> Result<Arc<dyn ObjectStore>, ClientError> {
        get_or_create(&self.stores, region, || self.factory.create_store(region)).await
    }

    /// Queue client for `region`, created on first use.
    pub async fn queue_client(&self, region: &str) -> Result<Arc<dyn MessageQueue>, ClientError> {
        get_or_create(&self.queues, region, || self.factory.create_queue(region)).await
    }

    /// Eagerly create the clients most invocations will need.
    pub async fn warm(&self, store_region: &str, queue_region: &str) -> Result<(), ClientError> {
        self.store_client(store_region).await?;
        self.queue_client(queue_region).await?;
        Ok(())
    }

    pub async fn store_clients_cached(&self) -> usize {
        count_initialized(&self.stores).await
    }

    pub async fn queue_clients_cached(&self) -> usize {
        count_initialized(&self.queues).await
    }
}

// Each region gets its own cell. The map lock is only held to find the cell, so
// building a client for one region never blocks lookups for another, while
// concurrent misses for the same region wait on that cell and share one client.
async fn get_or_create<T, F, Fut>(
    slots: &Mutex<HashMap<String, Arc<OnceCell<Arc<T>>>>>,
    region: &str,
    create: F,
) -> Result<Arc<T>, ClientError>
where
    T: ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Arc<T>, ClientError>>,
{
    let cell = {
        let mut slots = slots.lock().await;
        Arc::clone(slots.entry(region.to_string()).or_default())
    };

    let client = cell
        .get_or_try_init(|| async move {
            create().await.map_err(|e| {
                tracing::error!(error = %e, region = %region, "Client construction failed");
                e
            })
        })
        .await?;
    Ok(Arc::clone(client))
}

async fn count_initialized<T: ?Sized>(
    slots: &Mutex<HashMap<String, Arc<OnceCell<Arc<T>>>>>,
) -> usize {
    slots
        .lock()
        .await
        .values()
        .filter(|cell| cell.initialized())
        .count()
}
