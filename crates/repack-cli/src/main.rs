//! repack: compress one S3 object into a 7z container.
//!
//! Configuration comes from the environment (and `.env`); see `WorkerConfig`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use repack_cli::{
    build_orchestrator, init_tracing, outcome_result, parse_request, render, serve,
    DEFAULT_MAX_IN_FLIGHT,
};
use repack_core::WorkerConfig;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "repack", about = "Repackage S3 objects into 7z archives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single invocation and print its result
    Run {
        /// JSON request file; read from stdin when omitted
        #[arg(long)]
        request: Option<PathBuf>,
    },
    /// Run one invocation per JSON line read from stdin, concurrently
    Listen {
        /// Maximum number of invocations running at once
        #[arg(long, default_value_t = DEFAULT_MAX_IN_FLIGHT)]
        max_in_flight: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = WorkerConfig::from_env().context("Failed to load configuration")?;
    init_tracing(&config)?;

    tracing::info!(
        environment = %config.environment,
        region = %config.invocation_region,
        archive_tool = %config.archive_tool_path.display(),
        notification_policy = ?config.notification_policy,
        "Starting repack"
    );

    let orchestrator = build_orchestrator(&config).await;

    match cli.command {
        Commands::Run { request } => {
            let input = match request {
                Some(path) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut input = String::new();
                    tokio::io::stdin()
                        .read_to_string(&mut input)
                        .await
                        .context("Failed to read request from stdin")?;
                    input
                }
            };
            let request = parse_request(&input)?;

            let outcome = orchestrator.run(&request).await;
            println!("{}", render(outcome_result(&outcome))?);

            if let Err(failure) = outcome {
                return Err(anyhow::Error::new(failure.error).context("Compression failed"));
            }
        }
        Commands::Listen { max_in_flight } => {
            let (sender, mut receiver) = mpsc::unbounded_channel::<String>();
            let printer = tokio::spawn(async move {
                while let Some(line) = receiver.recv().await {
                    println!("{}", line);
                }
            });

            let summary = serve(
                BufReader::new(tokio::io::stdin()),
                orchestrator,
                max_in_flight,
                sender,
            )
            .await?;
            printer.await.context("Result printer failed")?;

            tracing::info!(handled = summary.handled, "Input closed, shutting down");
        }
    }

    Ok(())
}
