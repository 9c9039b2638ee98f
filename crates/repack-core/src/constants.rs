//! Fixed values shared across the pipeline.

/// Extension of the container produced by the archive step.
pub const ARCHIVE_EXTENSION: &str = ".7z";

/// Default location of the `7za` executable inside the deployment image.
pub const DEFAULT_ARCHIVE_TOOL_PATH: &str = "/var/task/7za";

/// Scratch directory used when `TEMP_DIR` is not set.
pub const DEFAULT_TEMP_DIR: &str = "/tmp";

/// File name used when an object key has no usable base name (e.g. `"/"` or `".."`).
pub const FALLBACK_BASENAME: &str = "object";

/// Message carried by a successful result.
pub const SUCCESS_MESSAGE: &str = "Compression succeeded";
