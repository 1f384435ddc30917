//! Persisted file fingerprints and freshness checks.
//!
//! This crate records a content fingerprint for every file that any build
//! unit was found to depend on, and answers whether a set of files is still
//! exactly as recorded. The table is read once per batch and replaced as a
//! whole, atomically, when the batch commits.

#![warn(missing_docs)]

pub mod error;
pub mod fingerprint;
pub mod store;
pub mod table;

use std::collections::BTreeSet;
use std::path::PathBuf;

pub use error::CacheError;
pub use fingerprint::Fingerprint;
pub use store::{FreshnessStore, StaleFile, StaleReason};
pub use table::{FingerprintTable, TABLE_FORMAT_VERSION};

/// Root-relative paths of the files one unit's artifact depends on.
pub type DependencySet = BTreeSet<PathBuf>;
