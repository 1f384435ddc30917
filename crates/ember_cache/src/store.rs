//! The freshness store.
//!
//! `FreshnessStore` holds the fingerprint table read at the start of a batch.
//! Checks during the batch only read that in-memory snapshot; the table is
//! replaced by [`FreshnessStore::update`], which the batch coordinator calls
//! once, after every unit has been checked.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::CacheError;
use crate::fingerprint::Fingerprint;
use crate::table::FingerprintTable;
use crate::DependencySet;

/// Why a file is not fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// The file does not exist or cannot be read.
    Missing,
    /// No fingerprint has ever been recorded for the file.
    Unrecorded,
    /// The file's content differs from the recorded fingerprint.
    Changed,
}

impl std::fmt::Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::Unrecorded => f.write_str("not recorded"),
            Self::Changed => f.write_str("changed"),
        }
    }
}

/// A file of a dependency set that failed the freshness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleFile {
    /// Root-relative path of the file.
    pub path: PathBuf,
    /// Why it is stale.
    pub reason: StaleReason,
}

/// Persisted fingerprints plus the root their paths are relative to.
pub struct FreshnessStore {
    /// Location of the persisted table.
    path: PathBuf,

    /// Directory tracked paths are relative to.
    root: PathBuf,

    /// Snapshot read at open or at the last reload, plus committed updates.
    table: FingerprintTable,
}

impl FreshnessStore {
    /// Opens the store persisted at `path`, for files relative to `root`.
    ///
    /// Never fails: a missing table starts empty, and a table that cannot be
    /// read, parsed, or that has another format version is discarded with a
    /// warning. Either way, nothing is fresh until the next commit.
    pub fn open(path: &Path, root: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
            table: read_table(path),
        }
    }

    /// Re-reads the persisted table, discarding the in-memory snapshot.
    pub fn reload(&mut self) {
        self.table = read_table(&self.path);
    }

    /// Returns `true` only if every file exists and matches its recorded
    /// fingerprint. Unrecorded files are never fresh.
    pub fn check(&self, files: &DependencySet) -> bool {
        files.iter().all(|file| self.stale_reason(file).is_none())
    }

    /// Lists every stale file of the set, with the reason, in path order.
    pub fn staleness(&self, files: &DependencySet) -> Vec<StaleFile> {
        files
            .iter()
            .filter_map(|file| {
                self.stale_reason(file).map(|reason| StaleFile {
                    path: file.clone(),
                    reason,
                })
            })
            .collect()
    }

    fn stale_reason(&self, file: &Path) -> Option<StaleReason> {
        let absolute = self.root.join(file);
        let Some(recorded) = self.table.get(file) else {
            return Some(if absolute.is_file() {
                StaleReason::Unrecorded
            } else {
                StaleReason::Missing
            });
        };
        if !absolute.is_file() {
            return Some(StaleReason::Missing);
        }
        if recorded.matches_file(&absolute) {
            None
        } else {
            Some(StaleReason::Changed)
        }
    }

    /// Records fresh fingerprints for every file in `files` and persists the
    /// table. This is the only mutation path.
    ///
    /// Entries of files not in the set are left untouched. A file of the set
    /// that cannot be read loses its entry, so it can never be judged fresh.
    /// Fingerprints are taken now, at commit time: a file edited after its
    /// unit was built but before the commit is recorded with its new content.
    /// Returns the number of files recorded.
    pub fn update(&mut self, files: &DependencySet) -> Result<usize, CacheError> {
        let mut recorded = 0;
        for file in files {
            match Fingerprint::of_file(&self.root.join(file)) {
                Ok(fp) => {
                    self.table.files.insert(file.clone(), fp);
                    recorded += 1;
                }
                Err(e) => {
                    debug!(error = %e, "dropping fingerprint of unreadable file");
                    self.table.files.remove(file);
                }
            }
        }
        self.table.save(&self.path)?;
        debug!(
            recorded,
            total = self.table.files.len(),
            path = %self.path.display(),
            "fingerprint table committed"
        );
        Ok(recorded)
    }

    /// Removes entries of files that no longer exist and persists the table.
    ///
    /// Returns the number of entries removed.
    pub fn prune_missing(&mut self) -> Result<usize, CacheError> {
        let before = self.table.files.len();
        let root = &self.root;
        self.table.files.retain(|file, _| root.join(file).is_file());
        let removed = before - self.table.files.len();
        self.table.save(&self.path)?;
        Ok(removed)
    }

    /// Returns the number of recorded files.
    pub fn len(&self) -> usize {
        self.table.files.len()
    }

    /// Returns `true` if no file is recorded.
    pub fn is_empty(&self) -> bool {
        self.table.files.is_empty()
    }

    /// Returns the directory tracked paths are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the location of the persisted table.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the in-memory table.
    pub fn table(&self) -> &FingerprintTable {
        &self.table
    }
}

fn read_table(path: &Path) -> FingerprintTable {
    match FingerprintTable::load(path) {
        Ok(Some(table)) if table.is_compatible() => table,
        Ok(Some(table)) => {
            warn!(
                found = table.format_version,
                path = %path.display(),
                "fingerprint table has an incompatible format; starting empty"
            );
            FingerprintTable::new()
        }
        Ok(None) => FingerprintTable::new(),
        Err(e) => {
            warn!(error = %e, "fingerprint table unusable; every unit will rebuild");
            FingerprintTable::new()
        }
    }
}
