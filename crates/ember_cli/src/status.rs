//! `ember status`: freshness of each unit, without building or committing.

use crate::pipeline::load_project;
use crate::{GlobalArgs, StatusArgs};

/// Runs the `ember status` command.
///
/// Prints one line per unit. Returns exit code 0 when every unit is fresh
/// and 1 when any unit would be rebuilt.
pub fn run(args: &StatusArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let requests = project.requests(&args.units)?;
    let session = project.open_session(global.verbose);

    let mut stale_units = 0;
    for req in &requests {
        let status = session.status(&req.path, &req.resolve_dir, &req.attributes)?;

        if status.is_fresh() {
            if !global.quiet {
                println!("{:>7} {}", "fresh", status.key.display());
            }
            continue;
        }

        stale_units += 1;
        let why = if !status.artifact_exists {
            "artifact missing".to_string()
        } else if !status.complete {
            "dependency report failed".to_string()
        } else {
            status
                .stale
                .first()
                .map(|f| format!("{} {}", f.path.display(), f.reason))
                .unwrap_or_default()
        };
        println!("{:>7} {} ({why})", "stale", status.key.display());
        if global.verbose {
            for file in status.stale.iter().skip(1) {
                println!("          {} {}", file.path.display(), file.reason);
            }
        }
    }

    Ok(if stale_units == 0 { 0 } else { 1 })
}
