//! The persisted fingerprint table.
//!
//! A single JSON document mapping root-relative file paths to fingerprints.
//! It is replaced as a whole: the new table is written to a sibling temp file,
//! flushed, and renamed over the old one, so a reader never observes a
//! partially written table.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::fingerprint::Fingerprint;

/// Current table format version. Tables with any other version are ignored.
pub const TABLE_FORMAT_VERSION: u32 = 1;

/// Path → fingerprint for every file recorded by a committed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintTable {
    /// Format version of this table.
    pub format_version: u32,

    /// Recorded fingerprints, keyed by path relative to the project root.
    pub files: BTreeMap<PathBuf, Fingerprint>,
}

impl FingerprintTable {
    /// Creates a new, empty table at the current format version.
    pub fn new() -> Self {
        Self {
            format_version: TABLE_FORMAT_VERSION,
            files: BTreeMap::new(),
        }
    }

    /// Loads a table from `path`.
    ///
    /// Returns `Ok(None)` if no table has been written yet.
    pub fn load(path: &Path) -> Result<Option<Self>, CacheError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::StoreRead {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CacheError::TableParse {
                reason: e.to_string(),
            })
    }

    /// Atomically replaces the table at `path` with this one.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err(parent))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp_path).map_err(write_err(&tmp_path))?;
            file.write_all(json.as_bytes())
                .map_err(write_err(&tmp_path))?;
            file.sync_all().map_err(write_err(&tmp_path))?;
        }
        std::fs::rename(&tmp_path, path).map_err(write_err(path))
    }

    /// Returns `true` if this table was written in the current format.
    pub fn is_compatible(&self) -> bool {
        self.format_version == TABLE_FORMAT_VERSION
    }

    /// Returns the recorded fingerprint of a file, if any.
    pub fn get(&self, path: &Path) -> Option<&Fingerprint> {
        self.files.get(path)
    }
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> CacheError {
    let path = path.to_path_buf();
    move |source| CacheError::StoreWrite { path, source }
}

impl Default for FingerprintTable {
    fn default() -> Self {
        Self::new()
    }
}
