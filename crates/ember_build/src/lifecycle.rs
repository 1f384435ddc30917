//! Per-batch bookkeeping and the single commit at batch end.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use ember_cache::{CacheError, DependencySet, FreshnessStore};
use tracing::debug;

/// Summary of a batch commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchCommit {
    /// Units whose dependency sets were committed.
    pub units: usize,
    /// Distinct files fingerprinted.
    pub files: usize,
}

/// Owns the freshness store for the duration of a batch, and the dependency
/// set every unit registered during it.
///
/// Units register concurrently through `&self`. Starting and ending a batch
/// take `&mut self`, so no check can be in flight while the table is
/// re-read or replaced.
pub struct LifecycleCoordinator {
    store: FreshnessStore,
    registrations: Mutex<BTreeMap<PathBuf, DependencySet>>,
}

impl LifecycleCoordinator {
    /// Creates a coordinator around an opened store.
    pub fn new(store: FreshnessStore) -> Self {
        Self {
            store,
            registrations: Mutex::new(BTreeMap::new()),
        }
    }

    /// Clears the registrations of the previous batch and re-reads the
    /// persisted table.
    pub fn start_batch(&mut self) {
        self.registrations
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.store.reload();
    }

    /// Records `files` as the dependency set of `unit` for this batch,
    /// replacing any earlier registration of the same unit.
    pub fn register(&self, unit: PathBuf, files: DependencySet) {
        let mut registrations = self
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        registrations.insert(unit, files);
    }

    /// Returns the number of units registered so far in this batch.
    pub fn registered(&self) -> usize {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Unions every registered dependency set and updates the store once
    /// with it. Units not registered this batch keep their old entries.
    pub fn end_batch(&mut self) -> Result<BatchCommit, CacheError> {
        let registrations = std::mem::take(
            self.registrations
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let units = registrations.len();
        let union: DependencySet = registrations.into_values().flatten().collect();
        let files = union.len();

        self.store.update(&union)?;
        debug!(units, files, "batch committed");
        Ok(BatchCommit { units, files })
    }

    /// Returns the store, for freshness checks during the batch.
    pub fn store(&self) -> &FreshnessStore {
        &self.store
    }

    /// Returns the store mutably, for maintenance outside of a batch.
    pub fn store_mut(&mut self) -> &mut FreshnessStore {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(paths: &[&str]) -> DependencySet {
        paths.iter().map(PathBuf::from).collect()
    }

    fn setup() -> (tempfile::TempDir, LifecycleCoordinator) {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.cc", "b.cc", "h.h"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }
        let store = FreshnessStore::open(&dir.path().join(".ember/freshness.json"), dir.path());
        (dir, LifecycleCoordinator::new(store))
    }

    #[test]
    fn end_batch_commits_union_once() {
        let (_dir, mut co) = setup();
        co.start_batch();
        co.register(PathBuf::from("a.cc"), set(&["a.cc", "h.h"]));
        co.register(PathBuf::from("b.cc"), set(&["b.cc", "h.h"]));
        assert_eq!(co.registered(), 2);

        let commit = co.end_batch().unwrap();
        assert_eq!(commit, BatchCommit { units: 2, files: 3 });
        assert!(co.store().check(&set(&["a.cc", "b.cc", "h.h"])));
        assert_eq!(co.registered(), 0);
    }

    #[test]
    fn reregistration_overwrites() {
        let (_dir, mut co) = setup();
        co.start_batch();
        co.register(PathBuf::from("a.cc"), set(&["a.cc", "h.h"]));
        co.register(PathBuf::from("a.cc"), set(&["a.cc"]));
        let commit = co.end_batch().unwrap();
        assert_eq!(commit, BatchCommit { units: 1, files: 1 });
        assert!(!co.store().check(&set(&["h.h"])));
    }

    #[test]
    fn untouched_units_keep_their_fingerprints() {
        let (dir, mut co) = setup();
        co.start_batch();
        co.register(PathBuf::from("a.cc"), set(&["a.cc"]));
        co.register(PathBuf::from("b.cc"), set(&["b.cc"]));
        co.end_batch().unwrap();

        std::fs::write(dir.path().join("a.cc"), "a.cc v2").unwrap();
        co.start_batch();
        co.register(PathBuf::from("a.cc"), set(&["a.cc"]));
        co.end_batch().unwrap();

        let reopened =
            FreshnessStore::open(&dir.path().join(".ember/freshness.json"), dir.path());
        assert!(reopened.check(&set(&["a.cc"])));
        assert!(reopened.check(&set(&["b.cc"])));
    }

    #[test]
    fn start_batch_discards_stale_registrations() {
        let (_dir, mut co) = setup();
        co.start_batch();
        co.register(PathBuf::from("a.cc"), set(&["a.cc"]));
        co.start_batch();
        assert_eq!(co.registered(), 0);
        assert_eq!(co.end_batch().unwrap(), BatchCommit { units: 0, files: 0 });
        assert!(!co.store().check(&set(&["a.cc"])));
    }

    #[test]
    fn concurrent_registration() {
        let (_dir, mut co) = setup();
        co.start_batch();
        std::thread::scope(|scope| {
            for i in 0..16 {
                let co = &co;
                scope.spawn(move || {
                    co.register(PathBuf::from(format!("unit{i}.cc")), set(&["h.h"]));
                });
            }
        });
        assert_eq!(co.registered(), 16);
        assert_eq!(co.end_batch().unwrap().files, 1);
        assert!(co.store().check(&set(&["h.h"])));
        assert!(co.store().path().exists());
    }
}
