//! Repack Worker Library
//!
//! Runs one invocation of the repackaging pipeline:
//! validate → download → archive → upload → (delete source) → (notify),
//! with the invocation's scratch files removed on every exit path.

pub mod error;
pub mod notify;
pub mod pipeline;
pub mod transfer;
pub mod workspace;

pub use error::{PipelineError, PipelineFailure, PipelineStage};
pub use notify::{NotificationPublisher, PublishError};
pub use pipeline::{PipelineOrchestrator, PipelineSettings};
pub use transfer::TransferError;
pub use workspace::Workspace;
