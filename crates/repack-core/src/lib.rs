//! Repack Core Library
//!
//! This crate provides the domain models, request validation, temporary path
//! derivation and configuration shared by every repack component.

pub mod config;
pub mod constants;
pub mod models;
pub mod paths;
pub mod validation;

// Re-export commonly used types
pub use config::{NotificationPolicy, WorkerConfig};
pub use models::{CompressionRequest, CompressionResult, EffectiveRequest, ResultCode};
pub use paths::{derive_scoped_temp_paths, derive_temp_paths, replace_extension, TempPaths};
pub use validation::{resolve, validate, ValidationError};
