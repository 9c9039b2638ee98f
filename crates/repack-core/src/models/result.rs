use serde::{Deserialize, Serialize};

use super::{CompressionRequest, EffectiveRequest};
use crate::constants::SUCCESS_MESSAGE;

/// Outcome code of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    Succeeded,
    Failed,
}

/// Invocation output. Also the notification message body.
///
/// On success `region`/`bucket`/`key` point at the written archive; on failure
/// they point at the source object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionResult {
    pub result: ResultCode,
    pub message: String,
    pub process_id: String,
    pub region: String,
    pub bucket: String,
    pub key: String,
}

impl CompressionResult {
    pub fn succeeded(request: &EffectiveRequest) -> Self {
        Self {
            result: ResultCode::Succeeded,
            message: SUCCESS_MESSAGE.to_string(),
            process_id: request.process_id.clone(),
            region: request.target_region.clone(),
            bucket: request.target_bucket.clone(),
            key: request.target_key.clone(),
        }
    }

    /// Failure after defaults were resolved: reports the effective source coordinates.
    pub fn failed(request: &EffectiveRequest, message: impl Into<String>) -> Self {
        Self {
            result: ResultCode::Failed,
            message: non_empty(message.into()),
            process_id: request.process_id.clone(),
            region: request.origin_region.clone(),
            bucket: request.origin_bucket.clone(),
            key: request.origin_key.clone(),
        }
    }

    /// Failure before defaults could be resolved: reports the raw source coordinates.
    pub fn rejected(request: &CompressionRequest, message: impl Into<String>) -> Self {
        Self {
            result: ResultCode::Failed,
            message: non_empty(message.into()),
            process_id: request.process_id.clone(),
            region: request.origin_region.clone(),
            bucket: request.origin_bucket.clone(),
            key: request.origin_key.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == ResultCode::Succeeded
    }
}

fn non_empty(message: String) -> String {
    if message.trim().is_empty() {
        "Compression failed".to_string()
    } else {
        message
    }
}
