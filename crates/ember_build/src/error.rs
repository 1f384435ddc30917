//! Error types for unit processing.

use std::path::PathBuf;

use ember_cache::{CacheError, DependencySet};

/// Errors that abort one unit, or the commit of a batch.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The build invocation could not be started or exited unsuccessfully.
    ///
    /// `diagnostics` is the tool's own output, verbatim.
    #[error("failed to build '{unit}' ({status})\n{diagnostics}")]
    BuildFailed {
        /// Key of the unit that failed.
        unit: String,
        /// Exit status, or why the tool could not be run.
        status: String,
        /// What the tool printed.
        diagnostics: String,
    },

    /// An I/O error outside of the tool invocation.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The fingerprint table could not be committed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A unit was loaded that was not resolved during the current batch.
    #[error("unit '{0}' was loaded without being resolved in this batch")]
    UnresolvedUnit(String),

    /// A unit path that the translation tool does not accept.
    #[error("'{0}' is not a C or C++ source")]
    NotTranslatable(String),

    /// The worker pool could not be created.
    #[error("cannot start worker pool: {0}")]
    Pool(String),
}

impl BuildError {
    /// Creates an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A dependency report invocation that failed.
///
/// Never fatal: the caller logs it and continues with `partial`, which holds
/// whatever the report did list plus the source itself.
#[derive(Debug, thiserror::Error)]
#[error("dependency report for '{source_file}' failed: {reason}")]
pub struct ExtractionFailed {
    /// The source the report was requested for, as passed to the tool.
    pub source_file: String,
    /// What went wrong.
    pub reason: String,
    /// Root-relative files recovered despite the failure.
    pub partial: DependencySet,
}
