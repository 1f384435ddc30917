//! Running a whole batch on a worker pool.

use std::collections::HashMap;
use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::BuildError;
use crate::lifecycle::BatchCommit;
use crate::session::Session;
use crate::toolchain::Toolchain;
use crate::unit::{Artifact, RawAttributes};

/// One unit as a host would announce it.
#[derive(Debug, Clone)]
pub struct UnitRequest {
    /// The import path, as written.
    pub path: String,
    /// Directory the import path is relative to.
    pub resolve_dir: PathBuf,
    /// The unit's attribute bag.
    pub attributes: RawAttributes,
}

/// A unit that produced no artifact.
#[derive(Debug)]
pub struct UnitFailure {
    /// The request path of the unit.
    pub unit: String,
    /// What went wrong.
    pub error: BuildError,
}

/// Outcome of [`run_batch`].
#[derive(Debug)]
pub struct BatchReport {
    /// Artifacts in request order, failed units left out.
    pub artifacts: Vec<Artifact>,
    /// Failed units in request order.
    pub failures: Vec<UnitFailure>,
    /// Result of the batch-end commit. The commit runs even when some units
    /// failed.
    pub commit: Result<BatchCommit, BuildError>,
}

impl BatchReport {
    /// Number of artifacts the tool rebuilt.
    pub fn rebuilt(&self) -> usize {
        self.artifacts.iter().filter(|a| a.rebuilt).count()
    }

    /// Returns `true` if every unit produced an artifact and the commit
    /// succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.commit.is_ok()
    }
}

/// Runs one batch: start, resolve every request, load the resolved units on
/// `jobs` worker threads (0 picks one per CPU), then end.
///
/// Requests resolving to the same unit are loaded once, with the attributes
/// of the last such request. A failing unit does not stop its siblings. Only
/// an error creating the pool aborts the batch, before anything is started.
pub fn run_batch<T: Toolchain>(
    session: &mut Session<T>,
    requests: &[UnitRequest],
    jobs: usize,
) -> Result<BatchReport, BuildError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .thread_name(|i| format!("ember-unit-{i}"))
        .build()
        .map_err(|e| BuildError::Pool(e.to_string()))?;

    session.on_start();

    let resolved = collapse(
        requests
            .iter()
            .map(|req| (req, session.on_resolve(&req.path, &req.resolve_dir))),
    );

    let shared: &Session<T> = &*session;
    let outcomes: Vec<(&UnitRequest, Result<Artifact, BuildError>)> = pool.install(|| {
        resolved
            .into_par_iter()
            .map(|(req, key)| {
                let outcome = match key {
                    Some(key) => shared.on_load(&key, &req.attributes),
                    None => Err(BuildError::NotTranslatable(req.path.clone())),
                };
                (req, outcome)
            })
            .collect()
    });

    let mut artifacts = Vec::new();
    let mut failures = Vec::new();
    for (req, outcome) in outcomes {
        match outcome {
            Ok(artifact) => artifacts.push(artifact),
            Err(error) => {
                warn!(unit = %req.path, "{error}");
                failures.push(UnitFailure {
                    unit: req.path.clone(),
                    error,
                });
            }
        }
    }

    let commit = session.on_end();
    debug!(
        artifacts = artifacts.len(),
        failures = failures.len(),
        "batch finished"
    );

    Ok(BatchReport {
        artifacts,
        failures,
        commit,
    })
}

/// Keeps one entry per resolved key, at the position of its first request
/// and with its last request. Unresolved requests are all kept.
fn collapse<'r>(
    resolved: impl Iterator<Item = (&'r UnitRequest, Option<PathBuf>)>,
) -> Vec<(&'r UnitRequest, Option<PathBuf>)> {
    let mut out: Vec<(&UnitRequest, Option<PathBuf>)> = Vec::new();
    let mut seen: HashMap<PathBuf, usize> = HashMap::new();
    for (req, key) in resolved {
        match key {
            Some(key) => match seen.get(&key) {
                Some(&i) => {
                    debug!(unit = %key.display(), "duplicate request merged");
                    out[i].0 = req;
                }
                None => {
                    seen.insert(key.clone(), out.len());
                    out.push((req, Some(key)));
                }
            },
            None => out.push((req, None)),
        }
    }
    out
}
