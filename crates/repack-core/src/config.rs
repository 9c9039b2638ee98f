//! Configuration module
//!
//! Worker settings are read from the environment (optionally seeded from a `.env`
//! file). Everything except the invocation region has a default.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{DEFAULT_ARCHIVE_TOOL_PATH, DEFAULT_TEMP_DIR};

/// How a failed completion notification affects the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationPolicy {
    /// A configured notification that cannot be delivered fails the invocation.
    #[default]
    Required,
    /// Delivery failures are logged and the result is returned unchanged.
    BestEffort,
}

impl FromStr for NotificationPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "required" | "mandatory" => Ok(NotificationPolicy::Required),
            "best-effort" | "best_effort" | "optional" => Ok(NotificationPolicy::BestEffort),
            other => Err(anyhow::anyhow!("Unsupported notification policy: {}", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Region the worker itself runs in; the last-resort default for every region field.
    pub invocation_region: String,
    /// Region whose store client is created at startup.
    pub default_s3_region: String,
    /// Region whose queue client is created at startup.
    pub default_sqs_region: String,
    pub archive_tool_path: PathBuf,
    pub archive_threads: Option<u32>,
    pub temp_dir: PathBuf,
    pub notification_policy: NotificationPolicy,
    // Custom endpoint for S3-compatible providers (MinIO, LocalStack, ...)
    pub s3_endpoint: Option<String>,
    pub log_json: bool,
    pub environment: String,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let invocation_region = var("AWS_REGION")
            .or_else(|| var("AWS_DEFAULT_REGION"))
            .ok_or_else(|| anyhow::anyhow!("AWS_REGION must be set"))?;

        let default_s3_region = var("DEFAULT_S3_REGION").unwrap_or_else(|| {
            tracing::warn!(
                region = %invocation_region,
                "DEFAULT_S3_REGION not set, falling back to invocation region"
            );
            invocation_region.clone()
        });

        let default_sqs_region = var("DEFAULT_SQS_REGION").unwrap_or_else(|| {
            tracing::warn!(
                region = %invocation_region,
                "DEFAULT_SQS_REGION not set, falling back to invocation region"
            );
            invocation_region.clone()
        });

        let archive_threads = match var("ARCHIVE_THREADS") {
            Some(raw) => Some(
                raw.parse::<u32>()
                    .map_err(|_| anyhow::anyhow!("ARCHIVE_THREADS must be a positive integer"))?,
            ),
            None => None,
        };

        let notification_policy = match var("NOTIFICATION_POLICY") {
            Some(raw) => raw.parse()?,
            None => NotificationPolicy::default(),
        };

        let config = WorkerConfig {
            invocation_region,
            default_s3_region,
            default_sqs_region,
            archive_tool_path: var("ARCHIVE_TOOL_PATH")
                .unwrap_or_else(|| DEFAULT_ARCHIVE_TOOL_PATH.to_string())
                .into(),
            archive_threads,
            temp_dir: var("TEMP_DIR")
                .unwrap_or_else(|| DEFAULT_TEMP_DIR.to_string())
                .into(),
            notification_policy,
            s3_endpoint: var("S3_ENDPOINT"),
            log_json: var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            environment: var("ENVIRONMENT")
                .or_else(|| var("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.archive_threads == Some(0) {
            return Err(anyhow::anyhow!("ARCHIVE_THREADS must be greater than zero"));
        }

        if !self.temp_dir.is_absolute() {
            return Err(anyhow::anyhow!("TEMP_DIR must be an absolute path"));
        }

        if let Some(ref endpoint) = self.s3_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(anyhow::anyhow!("S3_ENDPOINT must be an http(s) URL"));
            }
        }

        Ok(())
    }
}
