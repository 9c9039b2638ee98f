//! Construction of region-scoped AWS clients.

use crate::registry::ClientFactory;
use crate::traits::{ClientError, MessageQueue, ObjectStore};
use crate::{S3ObjectStore, SqsQueue};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;

/// Builds S3 and SQS clients from the default AWS credential chain.
#[derive(Clone, Debug, Default)]
pub struct AwsClientFactory {
    // Custom endpoint for S3-compatible providers (MinIO, LocalStack, ...)
    s3_endpoint: Option<String>,
}

impl AwsClientFactory {
    pub fn new(s3_endpoint: Option<String>) -> Self {
        Self { s3_endpoint }
    }

    async fn load_config(capability: &'static str, region: &str) -> Result<SdkConfig, ClientError> {
        if region.trim().is_empty() {
            return Err(ClientError::new(capability, region, "region is empty"));
        }

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        if config.credentials_provider().is_none() {
            return Err(ClientError::new(
                capability,
                region,
                "no credentials provider could be resolved",
            ));
        }

        Ok(config)
    }
}

#[async_trait]
impl ClientFactory for AwsClientFactory {
    async fn create_store(&self, region: &str) -> Result<Arc<dyn ObjectStore>, ClientError> {
        let config = Self::load_config("s3", region).await?;

        let client = match self.s3_endpoint {
            Some(ref endpoint) => {
                // Path-style addressing is required by most S3-compatible providers
                let s3_config = aws_sdk_s3::config::Builder::from(&config)
                    .endpoint_url(endpoint)
                    .force_path_style(true)
                    .build();
                aws_sdk_s3::Client::from_conf(s3_config)
            }
            None => aws_sdk_s3::Client::new(&config),
        };

        tracing::info!(
            region = %region,
            endpoint = ?self.s3_endpoint,
            "S3 client created"
        );

        Ok(Arc::new(S3ObjectStore::new(client, region.to_string())))
    }

    async fn create_queue(&self, region: &str) -> Result<Arc<dyn MessageQueue>, ClientError> {
        let config = Self::load_config("sqs", region).await?;
        let client = aws_sdk_sqs::Client::new(&config);

        tracing::info!(region = %region, "SQS client created");

        Ok(Arc::new(SqsQueue::new(client, region.to_string())))
    }
}
