//! Processing of a single build unit.

use std::path::Path;

use ember_cache::DependencySet;
use tracing::{debug, info};

use crate::error::BuildError;
use crate::extract::DependencyExtractor;
use crate::lifecycle::LifecycleCoordinator;
use crate::toolchain::Toolchain;
use crate::unit::{Artifact, BuildEnv, BuildUnit, ContentKind};

/// Decides whether a unit's artifact is still valid and rebuilds it if not.
pub struct Orchestrator<'a> {
    toolchain: &'a dyn Toolchain,
    env: &'a BuildEnv,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator for units of the given environment.
    pub fn new(toolchain: &'a dyn Toolchain, env: &'a BuildEnv) -> Self {
        Self { toolchain, env }
    }

    /// Produces the artifact of `unit`.
    ///
    /// The artifact is reused when it exists, every dependency report
    /// succeeded, and every file of the unit's freshly extracted dependency
    /// set matches the store; otherwise the tool rebuilds it. Once the artifact has been read back, the dependency
    /// set is registered with `coordinator` for the batch commit, on cache
    /// hits as well as rebuilds. A failed unit registers nothing.
    pub fn process(
        &self,
        unit: &BuildUnit,
        coordinator: &LifecycleCoordinator,
    ) -> Result<Artifact, BuildError> {
        let sources = unit.sources(&self.env.root);
        let options = self.env.merged_options(&unit.attributes);

        let extraction = DependencyExtractor::new(self.toolchain, &self.env.root)
            .extract(unit, &sources, &options);
        let watch = extraction.files;

        let out_path = self.env.artifact_path(&unit.key);
        let fresh =
            extraction.complete && out_path.is_file() && coordinator.store().check(&watch);

        if fresh {
            debug!(unit = %unit.key.display(), "artifact is fresh");
        } else {
            self.compile(unit, &sources, &options, &watch, &out_path)?;
        }

        let contents =
            std::fs::read(&out_path).map_err(|e| BuildError::io(out_path.clone(), e))?;

        coordinator.register(unit.key.clone(), watch.clone());

        Ok(Artifact {
            key: unit.key.clone(),
            path: out_path,
            contents,
            watch_files: watch.into_iter().collect(),
            kind: ContentKind::Js,
            rebuilt: !fresh,
        })
    }

    fn compile(
        &self,
        unit: &BuildUnit,
        sources: &[String],
        options: &[String],
        watch: &DependencySet,
        out_path: &Path,
    ) -> Result<(), BuildError> {
        if self.env.verbose {
            let compiling: Vec<String> = sources
                .iter()
                .map(|s| {
                    let abs = ember_common::absolutize(Path::new(s), &unit.resolve_dir);
                    ember_common::relative_to(&abs, &self.env.root)
                        .display()
                        .to_string()
                })
                .collect();
            info!(unit = %unit.key.display(), sources = %compiling.join(" "), "compiling");
        } else {
            debug!(unit = %unit.key.display(), dependencies = watch.len(), "compiling");
        }

        if let Some(dir) = out_path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
        }

        let output_arg = ember_common::relative_to(out_path, &unit.resolve_dir);
        let args = build_args(
            sources,
            &output_arg.to_string_lossy(),
            &self.env.baseline_flags,
            options,
        );

        let output = self
            .toolchain
            .run(&unit.resolve_dir, &args)
            .map_err(|e| BuildError::BuildFailed {
                unit: unit.name(),
                status: "could not start the tool".to_string(),
                diagnostics: e.to_string(),
            })?;

        if !output.success() {
            return Err(BuildError::BuildFailed {
                unit: unit.name(),
                status: output.status(),
                diagnostics: output.diagnostics(),
            });
        }
        Ok(())
    }
}

/// Arguments of a build invocation: every source, the output, the baseline
/// flags, then the merged options in order.
pub fn build_args(
    sources: &[String],
    output: &str,
    baseline_flags: &[String],
    options: &[String],
) -> Vec<String> {
    let mut args: Vec<String> = sources.to_vec();
    args.push("-o".to_string());
    args.push(output.to_string());
    args.extend(baseline_flags.iter().cloned());
    args.extend(options.iter().cloned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_args_order() {
        let args = build_args(
            &["a.cc".to_string(), "b.cc".to_string()],
            "../dist/a.cc.0123.mjs",
            &["-Os".to_string(), "-sMODULARIZE=1".to_string()],
            &["-sX=1".to_string(), "-sX=2".to_string()],
        );
        assert_eq!(
            args,
            vec![
                "a.cc",
                "b.cc",
                "-o",
                "../dist/a.cc.0123.mjs",
                "-Os",
                "-sMODULARIZE=1",
                "-sX=1",
                "-sX=2"
            ]
        );
    }
}
