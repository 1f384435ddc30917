//! Error types for fingerprint table operations.

use std::path::PathBuf;

/// Errors that can occur while reading, fingerprinting, or persisting.
///
/// Reads are fail-safe at the [`FreshnessStore`](crate::FreshnessStore)
/// level: a table that cannot be read is treated as empty, so nothing is
/// fresh. Write errors are always surfaced.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A tracked file could not be read for fingerprinting.
    #[error("cannot fingerprint {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The persisted table exists but could not be read.
    #[error("cannot read fingerprint table at {path}: {source}")]
    StoreRead {
        /// The table path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The persisted table could not be written or moved into place.
    #[error("cannot write fingerprint table at {path}: {source}")]
    StoreWrite {
        /// The path being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The persisted table is not valid JSON of the expected shape.
    #[error("failed to parse fingerprint table: {reason}")]
    TableParse {
        /// Description of the parse failure.
        reason: String,
    },

    /// The table could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
