//! Shared pieces of the `repack` binary: request parsing, result rendering and
//! worker construction.

use anyhow::Context;
use repack_core::{CompressionRequest, CompressionResult, WorkerConfig};
use repack_infra::TelemetryFormat;
use repack_storage::{AwsClientFactory, RegionClientRegistry};
use repack_worker::{PipelineFailure, PipelineOrchestrator};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

pub const SERVICE_NAME: &str = "repack";

/// Default bound on invocations running at once in `listen` mode.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// Initialize tracing for the binary, in the format the configuration asks for.
pub fn init_tracing(config: &WorkerConfig) -> anyhow::Result<()> {
    let format = if config.log_json {
        TelemetryFormat::Json
    } else {
        TelemetryFormat::Pretty
    };
    repack_infra::init_telemetry(SERVICE_NAME, format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))
}

/// Build the orchestrator backed by AWS clients and pre-warm the default regions.
///
/// A failed warm-up is only logged; the clients are built again on first use.
pub async fn build_orchestrator(config: &WorkerConfig) -> PipelineOrchestrator {
    let factory = AwsClientFactory::new(config.s3_endpoint.clone());
    let registry = Arc::new(RegionClientRegistry::new(Arc::new(factory)));

    match registry
        .warm(&config.default_s3_region, &config.default_sqs_region)
        .await
    {
        Ok(()) => tracing::info!(
            s3_region = %config.default_s3_region,
            sqs_region = %config.default_sqs_region,
            "Clients pre-warmed"
        ),
        Err(e) => tracing::warn!(error = %e, "Client pre-warm failed, continuing"),
    }

    PipelineOrchestrator::from_config(config, registry)
}

pub fn parse_request(input: &str) -> anyhow::Result<CompressionRequest> {
    serde_json::from_str(input.trim()).context("Failed to parse compression request")
}

/// Result to report for an input line that could not be parsed at all.
pub fn unparseable(error: &anyhow::Error) -> CompressionResult {
    CompressionResult::rejected(
        &CompressionRequest::default(),
        format!("invalid request: {:#}", error),
    )
}

/// The result carried by an invocation outcome, whichever way it ended.
pub fn outcome_result(outcome: &Result<CompressionResult, PipelineFailure>) -> &CompressionResult {
    match outcome {
        Ok(result) => result,
        Err(failure) => &failure.result,
    }
}

pub fn render(result: &CompressionResult) -> anyhow::Result<String> {
    serde_json::to_string(result).context("Failed to serialize result")
}

/// Counters reported when `serve` reaches end of input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeSummary {
    /// Non-empty input lines handled.
    pub handled: usize,
    /// Most invocation tasks tracked at once.
    pub peak_tracked: usize,
}

/// Run one invocation per non-empty line of `input`, at most `max_in_flight` at a time.
///
/// Each rendered result is sent to `results` as soon as its invocation ends.
/// Finished tasks are reaped while reading, so a long-lived process only ever
/// tracks the invocations still running.
pub async fn serve<R>(
    input: R,
    orchestrator: PipelineOrchestrator,
    max_in_flight: usize,
    results: mpsc::UnboundedSender<String>,
) -> anyhow::Result<ServeSummary>
where
    R: AsyncBufRead + Unpin,
{
    let limit = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut lines = input.lines();
    let mut tasks = JoinSet::new();
    let mut summary = ServeSummary::default();

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        if line.trim().is_empty() {
            continue;
        }

        let permit = Arc::clone(&limit)
            .acquire_owned()
            .await
            .context("Invocation limit closed")?;
        while let Some(joined) = tasks.try_join_next() {
            reap(joined);
        }

        let orchestrator = orchestrator.clone();
        let results = results.clone();
        tasks.spawn(async move {
            let _permit = permit;
            let result = match parse_request(&line) {
                Ok(request) => outcome_result(&orchestrator.run(&request).await).clone(),
                Err(e) => {
                    tracing::warn!(error = %format!("{:#}", e), "Malformed request");
                    unparseable(&e)
                }
            };
            match render(&result) {
                Ok(line) => {
                    if results.send(line).is_err() {
                        tracing::warn!("Result receiver closed, dropping result");
                    }
                }
                Err(e) => tracing::error!(error = %e, "Failed to write result"),
            }
        });

        summary.handled += 1;
        summary.peak_tracked = summary.peak_tracked.max(tasks.len());
    }

    while let Some(joined) = tasks.join_next().await {
        reap(joined);
    }

    Ok(summary)
}

fn reap(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Invocation task panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use repack_core::{NotificationPolicy, ResultCode};
    use repack_processing::{ArchiveError, ArchiveTool};
    use repack_storage::MemoryClientFactory;
    use repack_worker::PipelineSettings;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Copies input to output after a short pause, tracking how many run at once.
    #[derive(Default)]
    struct SlowCopy {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ArchiveTool for SlowCopy {
        async fn compress(&self, input: &Path, output: &Path) -> Result<(), ArchiveError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let copied = tokio::fs::copy(input, output).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            copied.map(|_| ()).map_err(ArchiveError::Spawn)
        }
    }

    fn worker(
        temp_dir: &Path,
        archiver: Arc<SlowCopy>,
    ) -> (PipelineOrchestrator, Arc<MemoryClientFactory>) {
        let clients = Arc::new(MemoryClientFactory::new());
        let registry = Arc::new(RegionClientRegistry::new(clients.clone()));
        let settings = PipelineSettings {
            invocation_region: "us-east-1".to_string(),
            temp_dir: temp_dir.to_path_buf(),
            notification_policy: NotificationPolicy::Required,
        };
        (
            PipelineOrchestrator::new(registry, archiver, settings),
            clients,
        )
    }

    #[tokio::test]
    async fn serve_bounds_running_and_tracked_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = Arc::new(SlowCopy::default());
        let (orchestrator, clients) = worker(dir.path(), archiver.clone());

        let mut input = String::new();
        for i in 0..20 {
            clients
                .store("us-east-1")
                .insert("b", &format!("f{i}.txt"), format!("body-{i}"));
            input.push_str(&format!(
                "{{\"processId\":\"p{i}\",\"originBucket\":\"b\",\"originKey\":\"f{i}.txt\"}}\n\n"
            ));
        }
        input.push_str("{broken\n");

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let summary = serve(input.as_bytes(), orchestrator, 3, sender).await.unwrap();

        assert_eq!(summary.handled, 21);
        assert!(summary.peak_tracked <= 3, "tracked {}", summary.peak_tracked);
        assert!(archiver.peak.load(Ordering::SeqCst) <= 3);

        let mut lines = Vec::new();
        while let Some(line) = receiver.recv().await {
            lines.push(serde_json::from_str::<serde_json::Value>(&line).unwrap());
        }
        assert_eq!(lines.len(), 21);
        assert_eq!(lines.iter().filter(|v| v["result"] == "SUCCEEDED").count(), 20);
        assert_eq!(lines.iter().filter(|v| v["result"] == "FAILED").count(), 1);
        assert!(clients.store("us-east-1").contains("b", "f19.7z"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn parses_original_wire_names() {
        let req = parse_request(
            r#"{"processUuid":"p","originBucket":"b","originKey":"k.txt","queueUrl":"https://q"}
"#,
        )
        .unwrap();
        assert_eq!(req.process_id, "p");
        assert_eq!(req.queue_address, "https://q");
        assert!(!req.delete_original);
    }

    #[test]
    fn malformed_input_becomes_a_failed_result() {
        let err = parse_request("{not json").unwrap_err();
        let result = unparseable(&err);

        assert_eq!(result.result, ResultCode::Failed);
        assert!(result.message.starts_with("invalid request: Failed to parse"));
        assert_eq!(result.bucket, "");
    }

    #[test]
    fn renders_flat_json() {
        let result = unparseable(&anyhow::anyhow!("boom"));
        let line = render(&result).unwrap();

        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["result"], "FAILED");
        assert_eq!(value["message"], "invalid request: boom");
        assert_eq!(value["processId"], "");
    }
}
