use serde::{Deserialize, Serialize};

/// Raw invocation input, exactly as delivered by the host.
///
/// Every field is optional on the wire; missing strings deserialize as empty and
/// `deleteOriginal` as `false`. Use [`crate::validate`] and [`crate::resolve`] to
/// turn it into an [`EffectiveRequest`] before doing any work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressionRequest {
    /// Opaque correlation id echoed back in the result. May be empty.
    #[serde(alias = "processUuid")]
    pub process_id: String,
    pub origin_region: String,
    pub origin_bucket: String,
    pub origin_key: String,
    pub target_region: String,
    pub target_bucket: String,
    pub target_key: String,
    pub delete_original: bool,
    pub queue_region: String,
    #[serde(alias = "queueUrl")]
    pub queue_address: String,
}

/// A validated request with every default applied.
///
/// Built once by [`crate::resolve`] and never mutated afterwards; downstream
/// stages only ever see this form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveRequest {
    pub process_id: String,
    pub origin_region: String,
    pub origin_bucket: String,
    pub origin_key: String,
    pub target_region: String,
    pub target_bucket: String,
    pub target_key: String,
    pub delete_original: bool,
    pub queue_region: String,
    /// Empty when no notification should be sent.
    pub queue_address: String,
}

impl EffectiveRequest {
    pub fn notification_enabled(&self) -> bool {
        !self.queue_address.is_empty()
    }
}
