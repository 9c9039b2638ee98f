//! Temporary path and output key derivation.
//!
//! All functions here are pure: no filesystem access, no allocation of
//! unique names. Uniqueness comes from the caller-supplied token.

use std::path::{Path, PathBuf};

use crate::constants::{ARCHIVE_EXTENSION, FALLBACK_BASENAME};

const MAX_TOKEN_LEN: usize = 64;

/// The two scratch files owned by one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempPaths {
    /// Per-invocation directory holding both files, when the paths are scoped.
    pub dir: Option<PathBuf>,
    /// Downloaded source bytes.
    pub input: PathBuf,
    /// Archive produced from `input`.
    pub output: PathBuf,
}

/// Final path segment of an object key, ignoring trailing slashes.
///
/// Keys whose last segment is empty, `.` or `..` map to a fixed fallback name so
/// the result can always be joined onto a directory without escaping it.
pub fn basename(key: &str) -> &str {
    let trimmed = key.trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or("");
    match name {
        "" | "." | ".." => FALLBACK_BASENAME,
        other => other,
    }
}

/// Extension of the final path segment, including the leading dot.
///
/// Returns an empty string when the segment has no dot. A segment that is only an
/// extension (`".txt"`) is entirely extension.
pub fn extension(key: &str) -> &str {
    let segment_start = key.rfind('/').map(|i| i + 1).unwrap_or(0);
    match key[segment_start..].rfind('.') {
        Some(dot) => &key[segment_start + dot..],
        None => "",
    }
}

/// Replace the final extension of `key` with `new_ext`, or append it if there is none.
///
/// Directory components are preserved and only the last extension is touched:
/// `"a/b/file.txt"` → `"a/b/file.7z"`, `"multi.part.tar"` → `"multi.part.7z"`.
pub fn replace_extension(key: &str, new_ext: &str) -> String {
    let ext = extension(key);
    format!("{}{}", &key[..key.len() - ext.len()], new_ext)
}

/// Derive the input/output scratch paths for `source_key` under `temp_dir`.
///
/// Only the key's base name is used, so every scratch file lives directly in
/// `temp_dir`.
pub fn derive_temp_paths(temp_dir: &Path, source_key: &str) -> TempPaths {
    derive_scoped_temp_paths(temp_dir, source_key, "")
}

/// Like [`derive_temp_paths`] but places both files in a `token` subdirectory.
///
/// The file names stay the object's own base name, which is also the entry name
/// the archive tool records. The token is reduced to ASCII alphanumerics, `-` and
/// `_` and capped in length. An empty (or fully stripped) token yields the
/// unscoped paths.
pub fn derive_scoped_temp_paths(temp_dir: &Path, source_key: &str, token: &str) -> TempPaths {
    let name = basename(source_key);
    let stem = &name[..name.len() - extension(name).len()];
    let dir = match sanitize_token(token) {
        t if t.is_empty() => None,
        t => Some(temp_dir.join(t)),
    };
    let base = dir.as_deref().unwrap_or(temp_dir);

    TempPaths {
        input: base.join(name),
        output: base.join(format!("{}{}", stem, ARCHIVE_EXTENSION)),
        dir,
    }
}

fn sanitize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_TOKEN_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_extension_examples() {
        assert_eq!(replace_extension("a/b/file.txt", ".7z"), "a/b/file.7z");
        assert_eq!(replace_extension("noext", ".7z"), "noext.7z");
        assert_eq!(replace_extension("multi.part.tar", ".7z"), "multi.part.7z");
    }

    #[test]
    fn replace_extension_edge_cases() {
        assert_eq!(replace_extension(".txt", ".7z"), ".7z");
        assert_eq!(replace_extension("dir.v2/readme", ".7z"), "dir.v2/readme.7z");
        assert_eq!(replace_extension("trailing.", ".7z"), "trailing.7z");
        assert_eq!(replace_extension("", ".7z"), ".7z");
    }

    #[test]
    fn temp_paths_drop_directory_components() {
        let tmp = Path::new("/tmp");
        let paths = derive_temp_paths(tmp, "folder/photo.png");
        assert_eq!(paths.input, Path::new("/tmp/photo.png"));
        assert_eq!(paths.output, Path::new("/tmp/photo.7z"));
        assert_eq!(derive_temp_paths(tmp, "photo.png"), paths);
    }

    #[test]
    fn temp_paths_for_unusual_keys() {
        let tmp = Path::new("/scratch");

        let paths = derive_temp_paths(tmp, "noext");
        assert_eq!(paths.input, Path::new("/scratch/noext"));
        assert_eq!(paths.output, Path::new("/scratch/noext.7z"));

        let paths = derive_temp_paths(tmp, "a/b/archive.tar.gz");
        assert_eq!(paths.input, Path::new("/scratch/archive.tar.gz"));
        assert_eq!(paths.output, Path::new("/scratch/archive.tar.7z"));

        let paths = derive_temp_paths(tmp, "logs/.env");
        assert_eq!(paths.input, Path::new("/scratch/.env"));
        assert_eq!(paths.output, Path::new("/scratch/.7z"));
    }

    #[test]
    fn temp_paths_never_escape_temp_dir() {
        let tmp = Path::new("/tmp");
        for key in ["dir/", "..", "a/..", "/", "./"] {
            let paths = derive_temp_paths(tmp, key);
            assert_eq!(paths.input.parent(), Some(tmp), "key {:?}", key);
            assert_eq!(paths.output.parent(), Some(tmp), "key {:?}", key);
        }
    }

    #[test]
    fn basename_follows_last_segment() {
        assert_eq!(basename("dir/"), "dir");
        assert_eq!(basename("a/b/c.txt"), "c.txt");
        assert_eq!(basename("/"), FALLBACK_BASENAME);
        assert_eq!(basename(".."), FALLBACK_BASENAME);
        assert_eq!(basename(""), FALLBACK_BASENAME);
    }

    #[test]
    fn scoped_paths_keep_the_base_name() {
        let tmp = Path::new("/tmp");
        let paths = derive_scoped_temp_paths(tmp, "folder/photo.png", "abc123");
        assert_eq!(paths.dir.as_deref(), Some(Path::new("/tmp/abc123")));
        assert_eq!(paths.input, Path::new("/tmp/abc123/photo.png"));
        assert_eq!(paths.output, Path::new("/tmp/abc123/photo.7z"));
        assert_eq!(paths.input.file_name().unwrap(), "photo.png");
    }

    #[test]
    fn scoped_paths_sanitize_token() {
        let tmp = Path::new("/tmp");
        let paths = derive_scoped_temp_paths(tmp, "x.bin", "../evil/id");
        assert_eq!(paths.input, Path::new("/tmp/evilid/x.bin"));

        let unscoped = derive_scoped_temp_paths(tmp, "x.bin", "///");
        assert_eq!(unscoped, derive_temp_paths(tmp, "x.bin"));
        assert_eq!(unscoped.dir, None);
    }
}
