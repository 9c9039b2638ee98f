//! Repack Storage Library
//!
//! Capability traits for the remote collaborators of the pipeline and their
//! implementations:
//!
//! - [`ObjectStore`]: get / put / delete of a single object (S3, in-memory)
//! - [`MessageQueue`]: send one message (SQS, in-memory)
//! - [`RegionClientRegistry`]: process-wide, region-keyed cache of both
//!
//! Clients are region-scoped. A client built for one region must never be used
//! for a bucket or queue in another; the registry is the only place clients are
//! created.

#[cfg(all(feature = "storage-s3", feature = "queue-sqs"))]
pub mod aws;
#[cfg(feature = "storage-memory")]
pub mod memory;
pub mod registry;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(feature = "queue-sqs")]
pub mod sqs;
pub mod traits;

// Re-export commonly used types
#[cfg(all(feature = "storage-s3", feature = "queue-sqs"))]
pub use aws::AwsClientFactory;
#[cfg(feature = "storage-memory")]
pub use memory::{MemoryClientFactory, MemoryObjectStore, MemoryQueue};
pub use registry::{ClientFactory, RegionClientRegistry};
#[cfg(feature = "storage-s3")]
pub use s3::S3ObjectStore;
#[cfg(feature = "queue-sqs")]
pub use sqs::SqsQueue;
pub use traits::{
    ClientError, MessageQueue, ObjectStore, ObjectStream, QueueError, StorageError, StorageResult,
};
