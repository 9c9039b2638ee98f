//! Delivery of invocation results to a message queue.

use repack_core::CompressionResult;
use repack_storage::{ClientError, QueueError, RegionClientRegistry};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to send message to {queue}: {source}")]
    Send {
        queue: String,
        #[source]
        source: QueueError,
    },
}

/// Sends a [`CompressionResult`] as one JSON message to a region-scoped queue.
#[derive(Clone)]
pub struct NotificationPublisher {
    registry: Arc<RegionClientRegistry>,
}

impl NotificationPublisher {
    pub fn new(registry: Arc<RegionClientRegistry>) -> Self {
        Self { registry }
    }

    /// Publish `result` to `queue_address`.
    ///
    /// An empty address means notifications are off: nothing is sent and
    /// `Ok(None)` is returned. Otherwise returns the queue's message id.
    pub async fn publish(
        &self,
        queue_region: &str,
        queue_address: &str,
        result: &CompressionResult,
    ) -> Result<Option<String>, PublishError> {
        if queue_address.is_empty() {
            return Ok(None);
        }

        let body = serde_json::to_string(result)?;
        let queue = self.registry.queue_client(queue_region).await?;

        let message_id = queue
            .send_message(queue_address, &body)
            .await
            .map_err(|source| PublishError::Send {
                queue: queue_address.to_string(),
                source,
            })?;

        tracing::info!(
            region = %queue_region,
            queue = %queue_address,
            message_id = %message_id,
            result = ?result.result,
            "Result notification sent"
        );

        Ok(Some(message_id))
    }
}
