//! Archive step: repackage one file into a 7z container without compression.

use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// Container format flag passed to the tool.
const FORMAT_FLAG: &str = "-t7z";
/// Store entries as-is; this is repackaging, not compression.
const COPY_MODE_FLAG: &str = "-m0=Copy";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive tool not found at {}", .0.display())]
    ToolMissing(PathBuf),

    #[error("failed to prepare archive output {}: {source}", .path.display())]
    Prepare {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to run archive tool: {0}")]
    Spawn(#[source] io::Error),

    #[error("archive tool exited with {}: {output}", describe_status(.status))]
    Execution { status: Option<i32>, output: String },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

/// Produces a container holding exactly one input file.
#[async_trait]
pub trait ArchiveTool: Send + Sync {
    async fn compress(&self, input: &Path, output: &Path) -> Result<(), ArchiveError>;
}

/// Runs an external `7za` binary in copy (store-only) mode.
#[derive(Debug, Clone)]
pub struct SevenZipTool {
    executable: PathBuf,
    threads: Option<u32>,
}

impl SevenZipTool {
    pub fn new(executable: impl Into<PathBuf>, threads: Option<u32>) -> Self {
        Self {
            executable: executable.into(),
            threads,
        }
    }

    /// Arguments for `7za a -t7z -m0=Copy [-mmt=N] <output> <input>`.
    pub fn command_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["a".into(), FORMAT_FLAG.into(), COPY_MODE_FLAG.into()];
        if let Some(threads) = self.threads {
            args.push(format!("-mmt={}", threads).into());
        }
        args.push(output.as_os_str().to_owned());
        args.push(input.as_os_str().to_owned());
        args
    }
}

#[async_trait]
impl ArchiveTool for SevenZipTool {
    #[tracing::instrument(skip_all, fields(
        process.executable.path = %self.executable.display(),
        input = %input.display(),
        output = %output.display()
    ))]
    async fn compress(&self, input: &Path, output: &Path) -> Result<(), ArchiveError> {
        match tokio::fs::metadata(&self.executable).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ArchiveError::ToolMissing(self.executable.clone()));
            }
            _ => {}
        }

        // `7za a` appends to an existing archive, so a leftover output must go first.
        match tokio::fs::remove_file(output).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                return Err(ArchiveError::Prepare {
                    path: output.to_path_buf(),
                    source: e,
                });
            }
            _ => {}
        }

        let start = std::time::Instant::now();

        let result = Command::new(&self.executable)
            .args(self.command_args(input, output))
            .env("LANG", "C")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(ArchiveError::Spawn)?;

        let mut combined = String::from_utf8_lossy(&result.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&result.stderr));

        if !result.status.success() {
            tracing::error!(
                status = ?result.status.code(),
                duration_ms = start.elapsed().as_millis(),
                output = %combined,
                "7za failed"
            );
            return Err(ArchiveError::Execution {
                status: result.status.code(),
                output: combined.trim().to_string(),
            });
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            "7za compression successful"
        );
        Ok(())
    }
}
