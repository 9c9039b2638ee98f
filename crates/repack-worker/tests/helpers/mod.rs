//! Test helpers: in-memory clients, fake archive tools and a ready-made worker.
//!
//! Run from workspace root: `cargo test -p repack-worker`.

#![allow(dead_code)]

use async_trait::async_trait;
use repack_core::{CompressionRequest, NotificationPolicy};
use repack_processing::{ArchiveError, ArchiveTool, SevenZipTool};
use repack_storage::{
    ClientError, ClientFactory, MemoryClientFactory, MemoryObjectStore, MessageQueue, ObjectStore,
    ObjectStream, QueueError, RegionClientRegistry, StorageError, StorageResult,
};
use repack_worker::{PipelineOrchestrator, PipelineSettings};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const REGION: &str = "us-east-1";
pub const QUEUE: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/results";

/// Archive tool that "compresses" by copying the input verbatim.
///
/// Records the file name of every input, which is the entry name `7za` would
/// store in the archive.
#[derive(Default)]
pub struct CopyArchiver {
    calls: AtomicUsize,
    delay: Option<Duration>,
    entries: Mutex<Vec<String>>,
}

impl CopyArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold each call open for `delay`, so concurrent invocations overlap.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArchiveTool for CopyArchiver {
    async fn compress(&self, input: &Path, output: &Path) -> Result<(), ArchiveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(name) = input.file_name() {
            self.entries
                .lock()
                .unwrap()
                .push(name.to_string_lossy().into_owned());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        tokio::fs::copy(input, output)
            .await
            .map_err(ArchiveError::Spawn)?;
        Ok(())
    }
}

/// Archive tool that always exits non-zero, like a `7za` run on a full disk.
pub struct FailingArchiver;

#[async_trait]
impl ArchiveTool for FailingArchiver {
    async fn compress(&self, _input: &Path, _output: &Path) -> Result<(), ArchiveError> {
        Err(ArchiveError::Execution {
            status: Some(2),
            output: "ERROR: No more space on disk".to_string(),
        })
    }
}

/// Real [`SevenZipTool`] that records whether the downloaded input was on disk
/// when it was asked to compress.
pub struct ProbeArchiver {
    inner: SevenZipTool,
    input_seen: AtomicBool,
}

impl ProbeArchiver {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            inner: SevenZipTool::new(executable, None),
            input_seen: AtomicBool::new(false),
        }
    }

    pub fn input_seen(&self) -> bool {
        self.input_seen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArchiveTool for ProbeArchiver {
    async fn compress(&self, input: &Path, output: &Path) -> Result<(), ArchiveError> {
        self.input_seen.store(input.exists(), Ordering::SeqCst);
        self.inner.compress(input, output).await
    }
}

/// Stand-in for `7za` that writes the entry name it was asked to store (the base
/// name of its last argument) into the archive path (second to last argument).
#[cfg(unix)]
pub fn entry_name_tool(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("7za");
    std::fs::write(
        &path,
        r#"#!/bin/sh
eval "out=\${$(($# - 1))}"
eval "src=\${$#}"
basename "$src" > "$out"
"#,
    )
    .expect("Failed to write fake 7za");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake 7za executable");
    path
}

/// Which operations of [`FaultyClientFactory`] clients should fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct Faults {
    pub put: bool,
    pub delete: bool,
    pub send: bool,
}

/// Wraps [`MemoryClientFactory`] and injects failures into the clients it hands out.
pub struct FaultyClientFactory {
    inner: Arc<MemoryClientFactory>,
    faults: Faults,
}

impl FaultyClientFactory {
    pub fn new(inner: Arc<MemoryClientFactory>, faults: Faults) -> Self {
        Self { inner, faults }
    }
}

#[async_trait]
impl ClientFactory for FaultyClientFactory {
    async fn create_store(&self, region: &str) -> Result<Arc<dyn ObjectStore>, ClientError> {
        self.inner.create_store(region).await?;
        Ok(Arc::new(FaultyStore {
            inner: self.inner.store(region),
            faults: self.faults,
        }))
    }

    async fn create_queue(&self, region: &str) -> Result<Arc<dyn MessageQueue>, ClientError> {
        let queue = self.inner.create_queue(region).await?;
        if self.faults.send {
            Ok(Arc::new(UnreachableQueue {
                region: region.to_string(),
            }))
        } else {
            Ok(queue)
        }
    }
}

struct FaultyStore {
    inner: Arc<MemoryObjectStore>,
    faults: Faults,
}

#[async_trait]
impl ObjectStore for FaultyStore {
    fn region(&self) -> &str {
        self.inner.region()
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectStream> {
        self.inner.get_object(bucket, key).await
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: tokio::fs::File,
        content_length: u64,
    ) -> StorageResult<()> {
        if self.faults.put {
            return Err(StorageError::UploadFailed("AccessDenied".to_string()));
        }
        self.inner.put_object(bucket, key, body, content_length).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        if self.faults.delete {
            return Err(StorageError::DeleteFailed("AccessDenied".to_string()));
        }
        self.inner.delete_object(bucket, key).await
    }
}

struct UnreachableQueue {
    region: String,
}

#[async_trait]
impl MessageQueue for UnreachableQueue {
    fn region(&self) -> &str {
        &self.region
    }

    async fn send_message(&self, _queue_address: &str, _body: &str) -> Result<String, QueueError> {
        Err(QueueError::SendFailed(
            "AWS.SimpleQueueService.NonExistentQueue".to_string(),
        ))
    }
}

/// A worker over in-memory clients and a private temp directory.
pub struct TestWorker {
    pub orchestrator: PipelineOrchestrator,
    pub clients: Arc<MemoryClientFactory>,
    pub registry: Arc<RegionClientRegistry>,
    pub temp_dir: TempDir,
}

impl TestWorker {
    pub fn new(archiver: Arc<dyn ArchiveTool>) -> Self {
        Self::build(archiver, Faults::default(), NotificationPolicy::Required)
    }

    pub fn build(
        archiver: Arc<dyn ArchiveTool>,
        faults: Faults,
        policy: NotificationPolicy,
    ) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let clients = Arc::new(MemoryClientFactory::new());
        let factory = FaultyClientFactory::new(Arc::clone(&clients), faults);
        let registry = Arc::new(RegionClientRegistry::new(Arc::new(factory)));
        let settings = PipelineSettings {
            invocation_region: REGION.to_string(),
            temp_dir: temp_dir.path().to_path_buf(),
            notification_policy: policy,
        };
        let orchestrator = PipelineOrchestrator::new(Arc::clone(&registry), archiver, settings);

        Self {
            orchestrator,
            clients,
            registry,
            temp_dir,
        }
    }

    pub fn store(&self, region: &str) -> Arc<MemoryObjectStore> {
        self.clients.store(region)
    }

    /// Number of entries left in the temp directory.
    pub fn temp_entries(&self) -> usize {
        std::fs::read_dir(self.temp_dir.path())
            .expect("Failed to read temp directory")
            .count()
    }

    pub fn messages(&self, region: &str) -> Vec<serde_json::Value> {
        self.clients
            .queue(region)
            .messages()
            .iter()
            .map(|(_, body)| serde_json::from_str(body).expect("message body is JSON"))
            .collect()
    }
}

/// Request for `bucket/key` with every optional field left empty.
pub fn request(bucket: &str, key: &str) -> CompressionRequest {
    CompressionRequest {
        process_id: "proc-1".to_string(),
        origin_bucket: bucket.to_string(),
        origin_key: key.to_string(),
        ..Default::default()
    }
}
