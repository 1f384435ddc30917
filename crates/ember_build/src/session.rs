//! Host adapter.
//!
//! A host build tool drives the engine through four hooks: batch start, unit
//! resolution, unit load, and batch end. `Session` maps each hook onto the
//! engine. The load hook may be called concurrently for different units.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use ember_cache::{FreshnessStore, StaleFile};

use crate::error::BuildError;
use crate::extract::DependencyExtractor;
use crate::lifecycle::{BatchCommit, LifecycleCoordinator};
use crate::orchestrator::Orchestrator;
use crate::toolchain::Toolchain;
use crate::unit::{Artifact, BuildEnv, BuildUnit, RawAttributes, UnitAttributes};

/// Freshness of one unit, computed without building or committing anything.
#[derive(Debug, Clone)]
pub struct UnitStatus {
    /// The unit key.
    pub key: PathBuf,
    /// Where the unit's artifact lives.
    pub artifact: PathBuf,
    /// Whether the artifact file exists.
    pub artifact_exists: bool,
    /// Size of the unit's dependency set.
    pub dependencies: usize,
    /// Whether every dependency report succeeded.
    pub complete: bool,
    /// Files of the dependency set that fail the freshness check.
    pub stale: Vec<StaleFile>,
}

impl UnitStatus {
    /// Returns `true` if the next batch would reuse the artifact.
    pub fn is_fresh(&self) -> bool {
        self.complete && self.artifact_exists && self.stale.is_empty()
    }
}

/// The engine as seen from a host build tool.
pub struct Session<T: Toolchain> {
    env: BuildEnv,
    toolchain: T,
    coordinator: LifecycleCoordinator,
    resolve_dirs: Mutex<HashMap<PathBuf, PathBuf>>,
}

impl<T: Toolchain> Session<T> {
    /// Creates a session over an opened store.
    pub fn new(env: BuildEnv, toolchain: T, store: FreshnessStore) -> Self {
        Self {
            env,
            toolchain,
            coordinator: LifecycleCoordinator::new(store),
            resolve_dirs: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a session whose store is persisted at `store_path`.
    pub fn open(env: BuildEnv, toolchain: T, store_path: &Path) -> Self {
        let store = FreshnessStore::open(store_path, &env.root);
        Self::new(env, toolchain, store)
    }

    /// Batch start: forgets every resolution and registration of the
    /// previous batch and re-reads the persisted table.
    pub fn on_start(&mut self) {
        self.resolve_dirs
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.coordinator.start_batch();
    }

    /// Unit resolution: maps an import of `path` from `resolve_dir` to the
    /// unit key, remembering the resolve directory for the load hook.
    ///
    /// Returns `None` for paths the tool does not translate.
    pub fn on_resolve(&self, path: &str, resolve_dir: &Path) -> Option<PathBuf> {
        let (key, resolve_dir) = self.resolve_key(path, resolve_dir)?;
        self.resolve_dirs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), resolve_dir);
        Some(key)
    }

    /// Unit load: produces the artifact of a unit resolved in this batch.
    pub fn on_load(&self, key: &Path, attributes: &RawAttributes) -> Result<Artifact, BuildError> {
        let resolve_dir = self
            .resolve_dirs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| BuildError::UnresolvedUnit(key.display().to_string()))?;

        let unit = BuildUnit {
            key: key.to_path_buf(),
            resolve_dir,
            attributes: UnitAttributes::parse(attributes),
        };
        Orchestrator::new(&self.toolchain, &self.env).process(&unit, &self.coordinator)
    }

    /// Batch end: commits the dependency sets of every unit loaded
    /// successfully in this batch.
    pub fn on_end(&mut self) -> Result<BatchCommit, BuildError> {
        Ok(self.coordinator.end_batch()?)
    }

    /// Reports whether a unit's artifact is fresh, without building it and
    /// without registering anything.
    pub fn status(
        &self,
        path: &str,
        resolve_dir: &Path,
        attributes: &RawAttributes,
    ) -> Result<UnitStatus, BuildError> {
        let (key, resolve_dir) = self
            .resolve_key(path, resolve_dir)
            .ok_or_else(|| BuildError::NotTranslatable(path.to_string()))?;
        let unit = BuildUnit {
            key,
            resolve_dir,
            attributes: UnitAttributes::parse(attributes),
        };

        let sources = unit.sources(&self.env.root);
        let options = self.env.merged_options(&unit.attributes);
        let extraction = DependencyExtractor::new(&self.toolchain, &self.env.root)
            .extract(&unit, &sources, &options);

        let artifact = self.env.artifact_path(&unit.key);
        Ok(UnitStatus {
            artifact_exists: artifact.is_file(),
            artifact,
            dependencies: extraction.files.len(),
            complete: extraction.complete,
            stale: self.coordinator.store().staleness(&extraction.files),
            key: unit.key,
        })
    }

    /// Drops fingerprints of files that no longer exist. Returns how many
    /// entries were removed.
    pub fn prune(&mut self) -> Result<usize, BuildError> {
        Ok(self.coordinator.store_mut().prune_missing()?)
    }

    /// Returns the batch environment.
    pub fn env(&self) -> &BuildEnv {
        &self.env
    }

    /// Returns the lifecycle coordinator.
    pub fn coordinator(&self) -> &LifecycleCoordinator {
        &self.coordinator
    }

    fn resolve_key(&self, path: &str, resolve_dir: &Path) -> Option<(PathBuf, PathBuf)> {
        if !ember_common::is_translatable(Path::new(path)) {
            return None;
        }
        let resolve_dir = ember_common::absolutize(resolve_dir, &self.env.root);
        let absolute = ember_common::absolutize(Path::new(path), &resolve_dir);
        Some((ember_common::relative_to(&absolute, &self.env.root), resolve_dir))
    }
}
