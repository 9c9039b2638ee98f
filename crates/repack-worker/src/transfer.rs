//! Moving bytes between the object store and the local scratch files.

use futures::StreamExt;
use repack_storage::{ObjectStore, StorageError};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("failed to create temp file {}: {source}", .path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to get object {bucket}/{key}: {source}")]
    Fetch {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to write temp file {}: {source}", .path.display())]
    WriteLocal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open source file {}: {source}", .path.display())]
    OpenSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to get file info for {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to put object {bucket}/{key}: {source}")]
    Put {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to delete object {bucket}/{key}: {source}")]
    Delete {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },
}

/// Stream `bucket/key` into `dest`, truncating it first. Returns the bytes written.
pub async fn download(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    dest: &Path,
) -> Result<u64, TransferError> {
    let write_err = |source| TransferError::WriteLocal {
        path: dest.to_path_buf(),
        source,
    };
    let fetch_err = |source| TransferError::Fetch {
        bucket: bucket.to_string(),
        key: key.to_string(),
        source,
    };

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|source| TransferError::CreateDestination {
            path: dest.to_path_buf(),
            source,
        })?;

    let mut body = store.get_object(bucket, key).await.map_err(fetch_err)?;

    let mut bytes_written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(fetch_err)?;
        file.write_all(&chunk).await.map_err(write_err)?;
        bytes_written += chunk.len() as u64;
    }

    file.flush().await.map_err(write_err)?;

    Ok(bytes_written)
}

/// Upload the contents of `src` to `bucket/key`. Returns the file size.
pub async fn upload(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    src: &Path,
) -> Result<u64, TransferError> {
    let file = tokio::fs::File::open(src)
        .await
        .map_err(|source| TransferError::OpenSource {
            path: src.to_path_buf(),
            source,
        })?;

    let size = file
        .metadata()
        .await
        .map_err(|source| TransferError::Metadata {
            path: src.to_path_buf(),
            source,
        })?
        .len();

    store
        .put_object(bucket, key, file, size)
        .await
        .map_err(|source| TransferError::Put {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        })?;

    Ok(size)
}

/// Delete `bucket/key`.
pub async fn delete(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<(), TransferError> {
    store
        .delete_object(bucket, key)
        .await
        .map_err(|source| TransferError::Delete {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        })
}
