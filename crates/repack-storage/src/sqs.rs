use crate::traits::{MessageQueue, QueueError};
use async_trait::async_trait;
use aws_sdk_sqs::Client;

/// SQS queue client bound to one region
#[derive(Clone)]
pub struct SqsQueue {
    client: Client,
    region: String,
}

impl SqsQueue {
    pub fn new(client: Client, region: String) -> Self {
        Self { client, region }
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    fn region(&self) -> &str {
        &self.region
    }

    async fn send_message(&self, queue_address: &str, body: &str) -> Result<String, QueueError> {
        let start = std::time::Instant::now();

        let output = self
            .client
            .send_message()
            .queue_url(queue_address)
            .message_body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    region = %self.region,
                    queue = %queue_address,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "SQS send_message failed"
                );
                QueueError::SendFailed(e.to_string())
            })?;

        let message_id = output.message_id().unwrap_or_default().to_string();

        tracing::debug!(
            region = %self.region,
            queue = %queue_address,
            message_id = %message_id,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "SQS send_message successful"
        );

        Ok(message_id)
    }
}
