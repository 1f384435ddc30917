//! Per-file fingerprints.

use std::path::Path;

use ember_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// A comparable summary of one file's content.
///
/// The content hash is authoritative. The length is compared first so that
/// a size change is detected without reading the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// File length in bytes.
    pub len: u64,
    /// XXH3-128 hash of the file content.
    pub hash: ContentHash,
}

impl Fingerprint {
    /// Computes the fingerprint of in-memory content.
    pub fn of_bytes(content: &[u8]) -> Self {
        Self {
            len: content.len() as u64,
            hash: ContentHash::from_bytes(content),
        }
    }

    /// Reads a file and computes its fingerprint.
    pub fn of_file(path: &Path) -> Result<Self, CacheError> {
        let content = std::fs::read(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::of_bytes(&content))
    }

    /// Returns `true` if the file at `path` still has this fingerprint.
    ///
    /// A file that is missing or unreadable never matches.
    pub fn matches_file(&self, path: &Path) -> bool {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() && meta.len() == self.len => {}
            _ => return false,
        }
        Self::of_file(path).map(|fp| fp == *self).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn of_file_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.cc");
        std::fs::write(&path, "int main() { return 0; }").unwrap();

        let a = Fingerprint::of_file(&path).unwrap();
        let b = Fingerprint::of_file(&path).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len, 24);
    }

    #[test]
    fn of_file_matches_of_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.h");
        std::fs::write(&path, "#pragma once\n").unwrap();
        assert_eq!(
            Fingerprint::of_file(&path).unwrap(),
            Fingerprint::of_bytes(b"#pragma once\n")
        );
    }

    #[test]
    fn of_file_nonexistent_errors() {
        let result = Fingerprint::of_file(Path::new("/nonexistent/file.cc"));
        assert!(matches!(result, Err(CacheError::Io { .. })));
    }

    #[test]
    fn matches_file_detects_same_length_edit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.h");
        std::fs::write(&path, "#define X 1\n").unwrap();
        let fp = Fingerprint::of_file(&path).unwrap();
        assert!(fp.matches_file(&path));

        std::fs::write(&path, "#define X 2\n").unwrap();
        assert!(!fp.matches_file(&path));
    }

    #[test]
    fn matches_file_missing_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let fp = Fingerprint::of_bytes(b"gone");
        assert!(!fp.matches_file(&dir.path().join("gone.h")));
    }

    #[test]
    fn matches_file_directory_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let fp = Fingerprint::of_bytes(b"");
        assert!(!fp.matches_file(dir.path()));
    }
}
