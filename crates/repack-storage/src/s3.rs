use crate::traits::{ObjectStore, ObjectStream, StorageError, StorageResult};
use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::{ByteStream, Length};
use aws_sdk_s3::Client;

/// S3 object store bound to one region
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    region: String,
}

impl S3ObjectStore {
    /// Wrap an SDK client that was configured for `region`.
    pub fn new(client: Client, region: String) -> Self {
        Self { client, region }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn region(&self) -> &str {
        &self.region
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectStream> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if let SdkError::ServiceError(service_err) = &e {
                    if let GetObjectError::NoSuchKey(_) = service_err.err() {
                        return StorageError::NotFound {
                            bucket: bucket.to_string(),
                            key: key.to_string(),
                        };
                    }
                }
                tracing::error!(
                    error = %e,
                    region = %self.region,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 get_object failed"
                );
                StorageError::DownloadFailed(e.to_string())
            })?;

        tracing::debug!(
            region = %self.region,
            bucket = %bucket,
            key = %key,
            content_length = response.content_length(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 get_object response received"
        );

        let stream = futures::stream::unfold(response.body, |mut body| async move {
            body.next().await.map(|chunk| {
                (
                    chunk.map_err(|e| StorageError::DownloadFailed(e.to_string())),
                    body,
                )
            })
        });

        Ok(Box::pin(stream))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: tokio::fs::File,
        content_length: u64,
    ) -> StorageResult<()> {
        let start = std::time::Instant::now();

        let stream = ByteStream::read_from()
            .file(body)
            .length(Length::Exact(content_length))
            .build()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(content_length as i64)
            .body(stream)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    region = %self.region,
                    bucket = %bucket,
                    key = %key,
                    size_bytes = content_length,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 put_object failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::debug!(
            region = %self.region,
            bucket = %bucket,
            key = %key,
            size_bytes = content_length,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put_object successful"
        );

        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    region = %self.region,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete_object failed"
                );
                StorageError::DeleteFailed(e.to_string())
            })?;

        tracing::debug!(
            region = %self.region,
            bucket = %bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete_object successful"
        );

        Ok(())
    }
}
