//! Shared helpers for CLI commands.
//!
//! Contains project root resolution, config loading, and the translation
//! of configured units into a build session and its requests.

use std::path::{Path, PathBuf};

use ember_build::{BuildEnv, EmccToolchain, RawAttributes, Session, UnitRequest};
use ember_config::{ConfigError, ProjectConfig, ResolvedUnit, CONFIG_FILE};
use tracing::debug;

use crate::GlobalArgs;

/// A loaded project: its root directory and validated configuration.
pub struct Project {
    /// Absolute project root.
    pub dir: PathBuf,
    /// Parsed `ember.toml`.
    pub config: ProjectConfig,
}

/// Walks up from `start` looking for the nearest directory containing `ember.toml`.
///
/// Returns the directory containing `ember.toml`, or an error if none is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Loads the project selected by the global CLI args.
///
/// If `--config` names a file, that file is loaded and its directory is the
/// project root; if it names a directory, `ember.toml` is loaded from it.
/// Otherwise walks up from the current directory looking for `ember.toml`.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let (dir, config) = match global.config {
        Some(ref config_path) => {
            let p = ember_common::absolutize(Path::new(config_path), &cwd);
            if p.is_file() {
                let content = std::fs::read_to_string(&p).map_err(|source| {
                    ConfigError::IoError {
                        path: p.clone(),
                        source,
                    }
                })?;
                let dir = p.parent().map(Path::to_path_buf).unwrap_or(cwd);
                (dir, ember_config::load_config_from_str(&content)?)
            } else {
                let config = ember_config::load_config(&p)?;
                (p, config)
            }
        }
        None => {
            let dir = find_project_root(&cwd)?;
            let config = ember_config::load_config(&dir)?;
            (dir, config)
        }
    };
    debug!(
        root = %dir.display(),
        units = config.units.len(),
        "project loaded"
    );
    Ok(Project { dir, config })
}

impl Project {
    /// Returns the batch environment described by the configuration.
    pub fn build_env(&self, verbose: bool) -> BuildEnv {
        BuildEnv {
            root: self.dir.clone(),
            out_dir: self.config.out_dir(&self.dir),
            global_options: self.config.toolchain.options.clone(),
            baseline_flags: self.config.toolchain.baseline_flags.clone(),
            verbose: verbose || self.config.build.verbose,
        }
    }

    /// Opens a session driving the configured tool over the project's store.
    pub fn open_session(&self, verbose: bool) -> Session<EmccToolchain> {
        Session::open(
            self.build_env(verbose),
            EmccToolchain::new(&self.config.toolchain.program),
            &self.config.store_path(&self.dir),
        )
    }

    /// Resolves the configured units (or the named subset) into requests.
    pub fn requests(&self, selection: &[String]) -> Result<Vec<UnitRequest>, Box<dyn std::error::Error>> {
        let units = ember_config::resolve_units(&self.config, &self.dir, selection)?;
        Ok(units.into_iter().map(to_request).collect())
    }

    /// Renders an absolute path relative to the project root.
    pub fn display(&self, path: &Path) -> String {
        ember_common::relative_to(path, &self.dir).display().to_string()
    }
}

fn to_request(unit: ResolvedUnit) -> UnitRequest {
    UnitRequest {
        path: unit.path,
        resolve_dir: unit.resolve_dir,
        attributes: RawAttributes {
            options: unit.options,
            sources: unit.sources,
        },
    }
}
