//! Request validation and default resolution.

use crate::constants::ARCHIVE_EXTENSION;
use crate::models::{CompressionRequest, EffectiveRequest};
use crate::paths::replace_extension;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("origin bucket and key required")]
    MissingOrigin,

    #[error("file is already compressed: {0}")]
    AlreadyArchived(String),
}

/// Check the required fields of a raw request. Performs no I/O.
pub fn validate(request: &CompressionRequest) -> Result<(), ValidationError> {
    if request.origin_bucket.is_empty() || request.origin_key.is_empty() {
        return Err(ValidationError::MissingOrigin);
    }

    if request.origin_key.ends_with(ARCHIVE_EXTENSION) {
        return Err(ValidationError::AlreadyArchived(request.origin_key.clone()));
    }

    Ok(())
}

/// Apply defaults to a request that already passed [`validate`].
///
/// - origin region → `invocation_region`
/// - target region → origin region
/// - target bucket → origin bucket
/// - target key → origin key with its extension replaced by `.7z`
/// - queue region → `invocation_region`
pub fn resolve(request: &CompressionRequest, invocation_region: &str) -> EffectiveRequest {
    let origin_region = or_default(&request.origin_region, invocation_region);
    let target_region = or_default(&request.target_region, &origin_region);
    let target_bucket = or_default(&request.target_bucket, &request.origin_bucket);
    let target_key = if request.target_key.is_empty() {
        replace_extension(&request.origin_key, ARCHIVE_EXTENSION)
    } else {
        request.target_key.clone()
    };

    EffectiveRequest {
        process_id: request.process_id.clone(),
        origin_region,
        origin_bucket: request.origin_bucket.clone(),
        origin_key: request.origin_key.clone(),
        target_region,
        target_bucket,
        target_key,
        delete_original: request.delete_original,
        queue_region: or_default(&request.queue_region, invocation_region),
        queue_address: request.queue_address.clone(),
    }
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}
