//! Repack Processing Library
//!
//! The archive step of the pipeline: the [`ArchiveTool`] capability and its
//! `7za` subprocess implementation.

pub mod archive;

pub use archive::{ArchiveError, ArchiveTool, SevenZipTool};
