use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str =
    "repack=info,repack_cli=info,repack_core=info,repack_worker=info,repack_storage=info,repack_processing=info";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TelemetryFormat {
    /// Human-readable lines, for terminals.
    #[default]
    Pretty,
    /// One JSON object per event, for log collectors.
    Json,
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Calling this twice returns an error
/// instead of panicking.
pub fn init_telemetry(
    service_name: &str,
    format: TelemetryFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    match format {
        TelemetryFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        TelemetryFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    tracing::debug!(service = service_name, ?format, "Telemetry initialized");
    Ok(())
}
