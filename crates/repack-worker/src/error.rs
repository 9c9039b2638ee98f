//! Pipeline error taxonomy.

use repack_core::{CompressionResult, ValidationError};
use repack_processing::ArchiveError;
use repack_storage::ClientError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::notify::PublishError;
use crate::transfer::TransferError;

/// Pipeline states, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Downloading,
    Archiving,
    Uploading,
    Deleting,
    Notifying,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Downloading => "downloading",
            PipelineStage::Archiving => "archiving",
            PipelineStage::Uploading => "uploading",
            PipelineStage::Deleting => "deleting",
            PipelineStage::Notifying => "notifying",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// An error that aborts an invocation.
///
/// The display text becomes the `message` of the FAILED result, so every variant
/// names the stage it came from.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    #[error("{stage} failed: {source}")]
    ClientConstruction {
        stage: PipelineStage,
        #[source]
        source: ClientError,
    },

    #[error("download failed: failed to prepare temp directory {}: {source}", .path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download failed: {0}")]
    Download(#[source] TransferError),

    #[error("compression failed: 7za binary not found at {}", .0.display())]
    ArchiveToolMissing(PathBuf),

    #[error("compression failed: {0}")]
    ArchiveExecution(#[source] ArchiveError),

    #[error("upload failed: {0}")]
    Upload(#[source] TransferError),

    #[error("notification failed: {0}")]
    Publish(#[source] PublishError),
}

impl PipelineError {
    /// Stage the pipeline was in when this error occurred.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::InvalidRequest(_) => PipelineStage::Validating,
            PipelineError::ClientConstruction { stage, .. } => *stage,
            PipelineError::Workspace { .. } | PipelineError::Download(_) => {
                PipelineStage::Downloading
            }
            PipelineError::ArchiveToolMissing(_) | PipelineError::ArchiveExecution(_) => {
                PipelineStage::Archiving
            }
            PipelineError::Upload(_) => PipelineStage::Uploading,
            PipelineError::Publish(_) => PipelineStage::Notifying,
        }
    }
}

impl From<ArchiveError> for PipelineError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::ToolMissing(path) => PipelineError::ArchiveToolMissing(path),
            other => PipelineError::ArchiveExecution(other),
        }
    }
}

/// A failed invocation: the FAILED result to hand back plus the error behind it.
#[derive(Debug, Error)]
#[error("invocation failed while {}", .error.stage())]
pub struct PipelineFailure {
    pub result: CompressionResult,
    #[source]
    pub error: PipelineError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_missing_is_split_from_execution_errors() {
        let missing = PipelineError::from(ArchiveError::ToolMissing("/var/task/7za".into()));
        assert!(matches!(missing, PipelineError::ArchiveToolMissing(_)));
        assert_eq!(missing.stage(), PipelineStage::Archiving);
        assert!(missing.to_string().contains("/var/task/7za"));

        let failed = PipelineError::from(ArchiveError::Execution {
            status: Some(2),
            output: "ERROR: disk full".to_string(),
        });
        assert!(matches!(failed, PipelineError::ArchiveExecution(_)));
        assert!(failed.to_string().contains("disk full"));
    }

    #[test]
    fn messages_name_the_stage() {
        let err = PipelineError::ClientConstruction {
            stage: PipelineStage::Uploading,
            source: ClientError::new("s3", "eu-west-1", "region is empty"),
        };
        assert!(err.to_string().starts_with("uploading failed"));
        assert_eq!(err.stage(), PipelineStage::Uploading);

        let err = PipelineError::Workspace {
            path: "/tmp/abc".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.stage(), PipelineStage::Downloading);
        assert!(err.to_string().contains("/tmp/abc"));

        let err = PipelineError::from(ValidationError::MissingOrigin);
        assert_eq!(err.to_string(), "invalid request: origin bucket and key required");
    }
}
