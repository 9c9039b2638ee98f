//! Scratch files of one invocation.

use repack_core::TempPaths;
use std::io;
use std::path::Path;

/// Owns the input and output scratch files of one invocation, and the
/// per-invocation directory holding them when the paths are scoped.
///
/// Everything is removed when the workspace is dropped, whichever way the
/// pipeline exits. Removal is best effort: a file that was never created is
/// ignored and any other failure is logged.
#[derive(Debug)]
pub struct Workspace {
    paths: TempPaths,
}

impl Workspace {
    /// Take ownership of `paths`, creating the per-invocation directory if any.
    pub fn acquire(paths: TempPaths) -> io::Result<Self> {
        if let Some(dir) = &paths.dir {
            std::fs::create_dir_all(dir)?;
        }
        tracing::debug!(
            input = %paths.input.display(),
            output = %paths.output.display(),
            "Workspace acquired"
        );
        Ok(Self { paths })
    }

    pub fn input_path(&self) -> &Path {
        &self.paths.input
    }

    pub fn output_path(&self) -> &Path {
        &self.paths.output
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        remove_scratch_file(&self.paths.input);
        remove_scratch_file(&self.paths.output);
        if let Some(dir) = &self.paths.dir {
            match std::fs::remove_dir(dir) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    error = %e,
                    path = %dir.display(),
                    "Failed to delete temp directory"
                ),
            }
        }
    }
}

fn remove_scratch_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Temp file removed"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            error = %e,
            path = %path.display(),
            "Failed to delete temp file"
        ),
    }
}
