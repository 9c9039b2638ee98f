//! Capability traits for the object store and the message queue.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Object store operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for object store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Body of a fetched object, yielded chunk by chunk.
pub type ObjectStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Message queue errors
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// A region-scoped client could not be built.
#[derive(Debug, Clone, Error)]
#[error("failed to create {capability} client for region '{region}': {message}")]
pub struct ClientError {
    pub capability: &'static str,
    pub region: String,
    pub message: String,
}

impl ClientError {
    pub fn new(capability: &'static str, region: &str, message: impl Into<String>) -> Self {
        Self {
            capability,
            region: region.to_string(),
            message: message.into(),
        }
    }
}

/// Object store capability, scoped to one region.
///
/// Implementations are shared between concurrent invocations and must be safe
/// for concurrent use.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Region this client talks to.
    fn region(&self) -> &str;

    /// Fetch an object as a stream of chunks.
    ///
    /// Errors that occur before the first byte (missing object, access denied)
    /// are returned directly; errors while reading the body surface as stream items.
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectStream>;

    /// Store the full contents of `body` under `bucket/key`, replacing any existing object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: tokio::fs::File,
        content_length: u64,
    ) -> StorageResult<()>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()>;
}

/// Message queue capability, scoped to one region.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    fn region(&self) -> &str;

    /// Send one message and return the id assigned by the queue.
    async fn send_message(&self, queue_address: &str, body: &str) -> Result<String, QueueError>;
}
