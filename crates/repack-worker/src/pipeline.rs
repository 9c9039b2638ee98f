//! The per-invocation pipeline.

use repack_core::{
    derive_scoped_temp_paths, resolve, validate, CompressionRequest, CompressionResult,
    EffectiveRequest, NotificationPolicy, WorkerConfig,
};
use repack_processing::{ArchiveTool, SevenZipTool};
use repack_storage::RegionClientRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::error::{PipelineError, PipelineFailure, PipelineStage};
use crate::notify::NotificationPublisher;
use crate::transfer;
use crate::workspace::Workspace;

/// Process-level inputs of the pipeline that do not come from the request.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub invocation_region: String,
    pub temp_dir: PathBuf,
    pub notification_policy: NotificationPolicy,
}

impl PipelineSettings {
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            invocation_region: config.invocation_region.clone(),
            temp_dir: config.temp_dir.clone(),
            notification_policy: config.notification_policy,
        }
    }
}

/// Runs invocations against a shared client registry.
///
/// One orchestrator serves any number of concurrent invocations; the registry is
/// the only state they share.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    registry: Arc<RegionClientRegistry>,
    archiver: Arc<dyn ArchiveTool>,
    publisher: NotificationPublisher,
    settings: PipelineSettings,
}

impl PipelineOrchestrator {
    pub fn new(
        registry: Arc<RegionClientRegistry>,
        archiver: Arc<dyn ArchiveTool>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            publisher: NotificationPublisher::new(Arc::clone(&registry)),
            registry,
            archiver,
            settings,
        }
    }

    /// Orchestrator using the `7za` binary named by the configuration.
    pub fn from_config(config: &WorkerConfig, registry: Arc<RegionClientRegistry>) -> Self {
        let archiver = SevenZipTool::new(config.archive_tool_path.clone(), config.archive_threads);
        Self::new(
            registry,
            Arc::new(archiver),
            PipelineSettings::from_config(config),
        )
    }

    /// Run one invocation to completion.
    ///
    /// Returns the SUCCEEDED result, or a [`PipelineFailure`] carrying both the
    /// FAILED result and the error that caused it. The invocation's scratch
    /// files are gone by the time this returns.
    #[tracing::instrument(skip_all, fields(process_id = %request.process_id))]
    pub async fn run(
        &self,
        request: &CompressionRequest,
    ) -> Result<CompressionResult, PipelineFailure> {
        let start = Instant::now();

        if let Err(e) = validate(request) {
            let error = PipelineError::from(e);
            tracing::warn!(
                error = %error,
                bucket = %request.origin_bucket,
                key = %request.origin_key,
                "Request rejected"
            );
            return Err(PipelineFailure {
                result: CompressionResult::rejected(request, error.to_string()),
                error,
            });
        }

        let effective = resolve(request, &self.settings.invocation_region);
        let token = Uuid::new_v4().simple().to_string();
        let paths =
            derive_scoped_temp_paths(&self.settings.temp_dir, &effective.origin_key, &token);
        let scratch_dir = paths.dir.clone().unwrap_or_else(|| self.settings.temp_dir.clone());
        let workspace = match Workspace::acquire(paths) {
            Ok(workspace) => workspace,
            Err(source) => {
                let error = PipelineError::Workspace {
                    path: scratch_dir,
                    source,
                };
                return Err(self.fail(&effective, error, start).await);
            }
        };

        tracing::info!(
            origin_region = %effective.origin_region,
            origin_bucket = %effective.origin_bucket,
            origin_key = %effective.origin_key,
            target_region = %effective.target_region,
            target_bucket = %effective.target_bucket,
            target_key = %effective.target_key,
            delete_original = effective.delete_original,
            "Compression started"
        );

        let outcome = self.execute(&effective, &workspace).await;
        drop(workspace);

        if let Err(error) = outcome {
            return Err(self.fail(&effective, error, start).await);
        }

        let result = CompressionResult::succeeded(&effective);

        if effective.notification_enabled() {
            if let Err(e) = self
                .publisher
                .publish(&effective.queue_region, &effective.queue_address, &result)
                .await
            {
                match self.settings.notification_policy {
                    NotificationPolicy::Required => {
                        let error = PipelineError::Publish(e);
                        tracing::error!(
                            error = %error,
                            queue = %effective.queue_address,
                            "Result notification failed"
                        );
                        return Err(PipelineFailure {
                            result: CompressionResult::failed(&effective, error.to_string()),
                            error,
                        });
                    }
                    NotificationPolicy::BestEffort => {
                        tracing::warn!(
                            error = %e,
                            queue = %effective.queue_address,
                            "Result notification failed, keeping success result"
                        );
                    }
                }
            }
        }

        tracing::info!(
            stage = %PipelineStage::Done,
            region = %result.region,
            bucket = %result.bucket,
            key = %result.key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Compression completed"
        );

        Ok(result)
    }

    async fn execute(
        &self,
        request: &EffectiveRequest,
        workspace: &Workspace,
    ) -> Result<(), PipelineError> {
        let source = self
            .registry
            .store_client(&request.origin_region)
            .await
            .map_err(|source| PipelineError::ClientConstruction {
                stage: PipelineStage::Downloading,
                source,
            })?;

        let stage_start = Instant::now();
        let downloaded = transfer::download(
            source.as_ref(),
            &request.origin_bucket,
            &request.origin_key,
            workspace.input_path(),
        )
        .await
        .map_err(PipelineError::Download)?;
        tracing::info!(
            stage = %PipelineStage::Downloading,
            size_bytes = downloaded,
            duration_ms = stage_start.elapsed().as_secs_f64() * 1000.0,
            "Stage finished"
        );

        let stage_start = Instant::now();
        self.archiver
            .compress(workspace.input_path(), workspace.output_path())
            .await?;
        tracing::info!(
            stage = %PipelineStage::Archiving,
            duration_ms = stage_start.elapsed().as_secs_f64() * 1000.0,
            "Stage finished"
        );

        let target = self
            .registry
            .store_client(&request.target_region)
            .await
            .map_err(|source| PipelineError::ClientConstruction {
                stage: PipelineStage::Uploading,
                source,
            })?;

        let stage_start = Instant::now();
        let uploaded = transfer::upload(
            target.as_ref(),
            &request.target_bucket,
            &request.target_key,
            workspace.output_path(),
        )
        .await
        .map_err(PipelineError::Upload)?;
        tracing::info!(
            stage = %PipelineStage::Uploading,
            size_bytes = uploaded,
            duration_ms = stage_start.elapsed().as_secs_f64() * 1000.0,
            "Stage finished"
        );

        if request.delete_original {
            // The source object lives in the origin region, so the origin client deletes it.
            let stage_start = Instant::now();
            match transfer::delete(source.as_ref(), &request.origin_bucket, &request.origin_key)
                .await
            {
                Ok(()) => tracing::info!(
                    stage = %PipelineStage::Deleting,
                    duration_ms = stage_start.elapsed().as_secs_f64() * 1000.0,
                    "Stage finished"
                ),
                Err(e) => tracing::warn!(
                    error = %e,
                    bucket = %request.origin_bucket,
                    key = %request.origin_key,
                    "Failed to delete original object, continuing"
                ),
            }
        }

        Ok(())
    }

    /// Build the FAILED result for `error` and tell the queue about it.
    ///
    /// A publish error here is only logged and never masks `error`.
    async fn fail(
        &self,
        request: &EffectiveRequest,
        error: PipelineError,
        start: Instant,
    ) -> PipelineFailure {
        let result = CompressionResult::failed(request, error.to_string());
        tracing::error!(
            error = %error,
            stage = %error.stage(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Compression failed"
        );

        if request.notification_enabled() {
            if let Err(e) = self
                .publisher
                .publish(&request.queue_region, &request.queue_address, &result)
                .await
            {
                tracing::warn!(
                    error = %e,
                    queue = %request.queue_address,
                    "Failed to publish failure notification"
                );
            }
        }

        PipelineFailure { result, error }
    }
}
