//! Dependency extraction through the tool's own dependency report.

use std::path::{Path, PathBuf};

use ember_cache::DependencySet;
use tracing::{debug, warn};

use crate::depfile;
use crate::error::ExtractionFailed;
use crate::toolchain::Toolchain;
use crate::unit::BuildUnit;

/// The dependency set of a unit, and whether every report behind it
/// succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Root-relative files the unit depends on.
    pub files: DependencySet,
    /// `false` if any source's report failed and `files` may be missing
    /// headers. An incomplete set can never prove an artifact fresh.
    pub complete: bool,
}

/// Asks the tool which files a unit depends on.
///
/// Does not touch the fingerprint table.
pub struct DependencyExtractor<'a> {
    toolchain: &'a dyn Toolchain,
    root: &'a Path,
}

impl<'a> DependencyExtractor<'a> {
    /// Creates an extractor producing paths relative to `root`.
    pub fn new(toolchain: &'a dyn Toolchain, root: &'a Path) -> Self {
        Self { toolchain, root }
    }

    /// Returns the union of the dependency sets of every source of `unit`.
    ///
    /// `sources` are relative to the unit's resolve directory and `options`
    /// are the merged options. A failed report is logged, its partial
    /// result used, and the extraction marked incomplete; the unit is never
    /// aborted here.
    pub fn extract(&self, unit: &BuildUnit, sources: &[String], options: &[String]) -> Extraction {
        let mut watch = DependencySet::new();
        let mut complete = true;
        for source in sources {
            match self.extract_source(&unit.resolve_dir, source, options) {
                Ok(files) => watch.extend(files),
                Err(e) => {
                    warn!(unit = %unit.key.display(), error = %e, "continuing with partial dependencies");
                    watch.extend(e.partial);
                    complete = false;
                }
            }
        }
        debug!(unit = %unit.key.display(), files = watch.len(), complete, "dependencies extracted");
        Extraction {
            files: watch,
            complete,
        }
    }

    /// Runs one dependency report for `source` in `cwd`.
    ///
    /// The source itself is always part of the result, including the partial
    /// result carried by the error.
    pub fn extract_source(
        &self,
        cwd: &Path,
        source: &str,
        options: &[String],
    ) -> Result<DependencySet, ExtractionFailed> {
        let mut files = DependencySet::new();
        files.insert(self.root_relative(cwd, source));

        let fail = |reason: String, partial: DependencySet| ExtractionFailed {
            source_file: source.to_string(),
            reason,
            partial,
        };

        let output = match self.toolchain.run(cwd, &report_args(source, options)) {
            Ok(output) => output,
            Err(e) => return Err(fail(format!("cannot run tool: {e}"), files)),
        };

        let report = match std::str::from_utf8(&output.stdout) {
            Ok(report) => report,
            Err(_) => return Err(fail("report is not valid UTF-8".to_string(), files)),
        };

        for path in depfile::parse(report) {
            files.insert(self.root_relative(cwd, &path));
        }

        if !output.success() {
            let reason = format!("tool exited with {}: {}", output.status(), output.diagnostics().trim());
            return Err(fail(reason, files));
        }
        Ok(files)
    }

    fn root_relative(&self, cwd: &Path, path: &str) -> PathBuf {
        let absolute = ember_common::absolutize(Path::new(path), cwd);
        ember_common::relative_to(&absolute, self.root)
    }
}

/// Arguments of a dependency report invocation for one source.
pub fn report_args(source: &str, options: &[String]) -> Vec<String> {
    let mut args = vec![
        format!("-MT{source}"),
        "-MP".to_string(),
        "-MM".to_string(),
        source.to_string(),
    ];
    args.extend(options.iter().cloned());
    args
}
