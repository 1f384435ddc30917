//! `ember prune`: drop fingerprints of files that no longer exist.

use crate::pipeline::load_project;
use crate::GlobalArgs;

/// Runs the `ember prune` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let mut session = project.open_session(global.verbose);
    let removed = session.prune()?;
    if !global.quiet {
        eprintln!(
            "     Pruned {removed} fingerprint(s) from {}",
            project.display(&project.config.store_path(&project.dir))
        );
    }
    Ok(0)
}
