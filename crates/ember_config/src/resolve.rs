//! Unit resolution: anchoring each `[[units]]` entry to the project root.

use crate::error::ConfigError;
use crate::types::{ProjectConfig, UnitConfig};
use std::path::{Path, PathBuf};

/// A unit entry with its resolve directory made absolute.
///
/// The option and source strings are still raw; they are tokenized once,
/// when the unit is handed to the build engine.
#[derive(Debug, Clone)]
pub struct ResolvedUnit {
    /// Primary source as written, relative to `resolve_dir`.
    pub path: String,
    /// Absolute directory the unit's relative paths resolve against.
    pub resolve_dir: PathBuf,
    /// Raw unit-specific options string.
    pub options: Option<String>,
    /// Raw auxiliary sources string.
    pub sources: Option<String>,
}

impl ResolvedUnit {
    /// Returns the primary source path relative to the project root.
    pub fn root_relative(&self, project_dir: &Path) -> PathBuf {
        let absolute = ember_common::absolutize(Path::new(&self.path), &self.resolve_dir);
        ember_common::relative_to(&absolute, project_dir)
    }
}

/// Resolves the configured units, optionally restricted to `selection`.
///
/// A selection entry matches a unit either by its `path` as written or by its
/// project-root-relative path. Selected units keep declaration order. An entry
/// that matches nothing is an error.
pub fn resolve_units(
    config: &ProjectConfig,
    project_dir: &Path,
    selection: &[String],
) -> Result<Vec<ResolvedUnit>, ConfigError> {
    let all: Vec<ResolvedUnit> = config
        .units
        .iter()
        .map(|unit| resolve_one(unit, project_dir))
        .collect();

    if selection.is_empty() {
        return Ok(all);
    }

    for wanted in selection {
        let wanted_path = ember_common::normalize(Path::new(wanted));
        let found = all
            .iter()
            .any(|u| u.path == *wanted || u.root_relative(project_dir) == wanted_path);
        if !found {
            return Err(ConfigError::UnknownUnit(wanted.clone()));
        }
    }

    Ok(all
        .into_iter()
        .filter(|u| {
            let key = u.root_relative(project_dir);
            selection
                .iter()
                .any(|w| u.path == *w || key == ember_common::normalize(Path::new(w)))
        })
        .collect())
}

fn resolve_one(unit: &UnitConfig, project_dir: &Path) -> ResolvedUnit {
    let resolve_dir = match &unit.resolve_dir {
        Some(dir) => ember_common::absolutize(Path::new(dir), project_dir),
        None => ember_common::normalize(project_dir),
    };
    ResolvedUnit {
        path: unit.path.clone(),
        resolve_dir,
        options: unit.options.clone(),
        sources: unit.sources.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    fn config() -> ProjectConfig {
        load_config_from_str(
            r#"
[[units]]
path = "src/a.cc"
options = "-O2"

[[units]]
path = "b.cpp"
resolve_dir = "lib"
sources = "c.cc"
"#,
        )
        .unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn resolves_all_in_order() {
        let root = Path::new("/work/app");
        let units = resolve_units(&config(), root, &[]).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].resolve_dir, PathBuf::from("/work/app"));
        assert_eq!(units[0].options.as_deref(), Some("-O2"));
        assert_eq!(units[1].resolve_dir, PathBuf::from("/work/app/lib"));
        assert_eq!(units[1].root_relative(root), PathBuf::from("lib/b.cpp"));
    }

    #[cfg(unix)]
    #[test]
    fn selects_by_written_or_root_relative_path() {
        let root = Path::new("/work/app");
        let by_written = resolve_units(&config(), root, &["b.cpp".to_string()]).unwrap();
        assert_eq!(by_written.len(), 1);
        assert_eq!(by_written[0].path, "b.cpp");

        let by_key = resolve_units(&config(), root, &["./lib/b.cpp".to_string()]).unwrap();
        assert_eq!(by_key.len(), 1);
        assert_eq!(by_key[0].sources.as_deref(), Some("c.cc"));
    }

    #[test]
    fn unknown_selection_errors() {
        let err = resolve_units(&config(), Path::new("/work/app"), &["zzz.cc".to_string()])
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownUnit(ref u) if u == "zzz.cc"));
    }
}
