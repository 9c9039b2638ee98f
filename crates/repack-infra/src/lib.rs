//! Repack Infrastructure Library
//!
//! Shared infrastructure used by the repack binaries:
//! - Telemetry initialization (tracing subscriber setup)

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, TelemetryFormat};
