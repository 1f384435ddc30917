//! `ember build`: one batch over the configured units.
//!
//! 1. Load the project (walk up looking for `ember.toml`)
//! 2. Resolve the configured units, or the named subset
//! 3. Run the batch on the worker pool
//! 4. Report each unit, then the commit

use ember_build::{run_batch, BuildError};

use crate::pipeline::load_project;
use crate::{BuildArgs, GlobalArgs};

/// Runs the `ember build` command.
///
/// Returns exit code 0 if every unit produced an artifact and the fingerprint
/// table was committed, 1 otherwise.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let requests = project.requests(&args.units)?;

    if requests.is_empty() {
        if !global.quiet {
            eprintln!("warning: no units configured in {}", project.dir.display());
        }
        return Ok(0);
    }

    let jobs = args.jobs.unwrap_or(project.config.build.jobs);
    let mut session = project.open_session(global.verbose);
    let report = run_batch(&mut session, &requests, jobs)?;

    if !global.quiet {
        for artifact in &report.artifacts {
            let label = if artifact.rebuilt { "Compiling" } else { "Fresh" };
            eprintln!(
                "{label:>12} {} -> {}",
                artifact.key.display(),
                project.display(&artifact.path)
            );
        }
    }

    for failure in &report.failures {
        match &failure.error {
            BuildError::BuildFailed {
                status,
                diagnostics,
                ..
            } => {
                eprintln!("error: failed to build '{}' ({status})", failure.unit);
                if !diagnostics.is_empty() {
                    eprintln!("{}", diagnostics.trim_end());
                }
            }
            other => eprintln!("error: {}: {other}", failure.unit),
        }
    }

    if let Err(ref e) = report.commit {
        eprintln!("error: fingerprints not saved: {e}");
    }

    if !global.quiet {
        eprintln!(
            "    Finished {} unit(s): {} rebuilt, {} fresh, {} failed",
            requests.len(),
            report.rebuilt(),
            report.artifacts.len() - report.rebuilt(),
            report.failures.len()
        );
    }

    if report.is_success() {
        Ok(0)
    } else {
        Ok(1)
    }
}
