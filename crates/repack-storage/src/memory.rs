//! In-memory backends.
//!
//! Used by tests. A [`MemoryClientFactory`] keeps one backing
//! store and one backing queue per region, so every client it hands out for a
//! region observes the same data.

use crate::registry::ClientFactory;
use crate::traits::{
    ClientError, MessageQueue, ObjectStore, ObjectStream, QueueError, StorageError, StorageResult,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 64 * 1024;

/// Object store holding objects in a map keyed by `(bucket, key)`.
#[derive(Debug)]
pub struct MemoryObjectStore {
    region: String,
    objects: Mutex<HashMap<(String, String), Bytes>>,
}

impl MemoryObjectStore {
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((bucket.to_string(), key.to_string()), data.into());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.object(bucket, key).is_some()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn region(&self) -> &str {
        &self.region
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectStream> {
        let data = self.object(bucket, key).ok_or_else(|| StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;

        let chunks: Vec<Result<Bytes, StorageError>> = (0..data.len())
            .step_by(CHUNK_SIZE)
            .map(|start| Ok(data.slice(start..(start + CHUNK_SIZE).min(data.len()))))
            .collect();

        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        mut body: tokio::fs::File,
        content_length: u64,
    ) -> StorageResult<()> {
        let mut data = Vec::with_capacity(content_length as usize);
        body.read_to_end(&mut data).await?;

        if data.len() as u64 != content_length {
            return Err(StorageError::UploadFailed(format!(
                "expected {} bytes, read {}",
                content_length,
                data.len()
            )));
        }

        self.insert(bucket, key, data);
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

/// Queue recording every message it receives, in order.
#[derive(Debug)]
pub struct MemoryQueue {
    region: String,
    messages: Mutex<Vec<(String, String)>>,
}

impl MemoryQueue {
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            messages: Mutex::new(Vec::new()),
        }
    }

    /// `(queue_address, body)` pairs in send order.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    fn region(&self) -> &str {
        &self.region
    }

    async fn send_message(&self, queue_address: &str, body: &str) -> Result<String, QueueError> {
        let mut messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        messages.push((queue_address.to_string(), body.to_string()));
        Ok(format!("msg-{}", messages.len()))
    }
}

/// Hands out in-memory clients and counts how many were constructed.
#[derive(Debug, Default)]
pub struct MemoryClientFactory {
    stores: Mutex<HashMap<String, Arc<MemoryObjectStore>>>,
    queues: Mutex<HashMap<String, Arc<MemoryQueue>>>,
    store_constructions: AtomicUsize,
    queue_constructions: AtomicUsize,
}

impl MemoryClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backing store for `region`, for seeding and inspection.
    pub fn store(&self, region: &str) -> Arc<MemoryObjectStore> {
        let mut stores = self.stores.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            stores
                .entry(region.to_string())
                .or_insert_with(|| Arc::new(MemoryObjectStore::new(region))),
        )
    }

    /// Backing queue for `region`.
    pub fn queue(&self, region: &str) -> Arc<MemoryQueue> {
        let mut queues = self.queues.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            queues
                .entry(region.to_string())
                .or_insert_with(|| Arc::new(MemoryQueue::new(region))),
        )
    }

    pub fn store_constructions(&self) -> usize {
        self.store_constructions.load(Ordering::SeqCst)
    }

    pub fn queue_constructions(&self) -> usize {
        self.queue_constructions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientFactory for MemoryClientFactory {
    async fn create_store(&self, region: &str) -> Result<Arc<dyn ObjectStore>, ClientError> {
        if region.is_empty() {
            return Err(ClientError::new("memory-store", region, "region is empty"));
        }
        self.store_constructions.fetch_add(1, Ordering::SeqCst);
        Ok(self.store(region))
    }

    async fn create_queue(&self, region: &str) -> Result<Arc<dyn MessageQueue>, ClientError> {
        if region.is_empty() {
            return Err(ClientError::new("memory-queue", region, "region is empty"));
        }
        self.queue_constructions.fetch_add(1, Ordering::SeqCst);
        Ok(self.queue(region))
    }
}
