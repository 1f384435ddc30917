//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::collections::HashSet;
use std::path::Path;

/// Name of the configuration file at the project root.
pub const CONFIG_FILE: &str = "ember.toml";

/// Loads and validates an `ember.toml` configuration from a project directory.
///
/// Reads `<project_dir>/ember.toml`, parses it, and validates it.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::IoError {
        path: config_path.clone(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates an `ember.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates required fields and the consistency of configuration values.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.toolchain.program.trim().is_empty() {
        return Err(ConfigError::MissingField("toolchain.program".to_string()));
    }
    if config.output.dir.is_some() && config.output.file.is_some() {
        return Err(ConfigError::ValidationError(
            "output.dir and output.file are mutually exclusive".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for (i, unit) in config.units.iter().enumerate() {
        if unit.path.trim().is_empty() {
            return Err(ConfigError::MissingField(format!("units[{i}].path")));
        }
        if !ember_common::is_translatable(Path::new(&unit.path)) {
            return Err(ConfigError::ValidationError(format!(
                "unit '{}' is not a C or C++ source (.c, .cc, .cpp, .cxx)",
                unit.path
            )));
        }
        let dir = Path::new(unit.resolve_dir.as_deref().unwrap_or("."));
        if !seen.insert(ember_common::normalize(&dir.join(&unit.path))) {
            return Err(ConfigError::ValidationError(format!(
                "unit '{}' is declared more than once",
                unit.path
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.toolchain.program, "emcc");
        assert!(config.units.is_empty());
        assert_eq!(config.build.jobs, 0);
        assert!(!config.build.verbose);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[toolchain]
program = "/opt/emsdk/upstream/emscripten/emcc"
options = ["-Iinclude", "-sEXPORTED_FUNCTIONS=_main"]
baseline_flags = ["-O3"]

[output]
dir = "public/wasm"

[cache]
dir = ".cache/ember"

[build]
jobs = 4
verbose = true

[[units]]
path = "src/a.cc"

[[units]]
path = "lib/b.cpp"
resolve_dir = "lib"
options = "-O2 -sEXPORTED_FUNCTIONS=_helper"
sources = "util.cc 'with space.cc'"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.toolchain.program, "/opt/emsdk/upstream/emscripten/emcc");
        assert_eq!(config.toolchain.options.len(), 2);
        assert_eq!(config.toolchain.baseline_flags, vec!["-O3"]);
        assert_eq!(config.output.dir.as_deref(), Some("public/wasm"));
        assert_eq!(config.build.jobs, 4);
        assert!(config.build.verbose);
        assert_eq!(config.units.len(), 2);
        assert_eq!(config.units[1].resolve_dir.as_deref(), Some("lib"));
        assert_eq!(
            config.units[1].sources.as_deref(),
            Some("util.cc 'with space.cc'")
        );
    }

    #[test]
    fn empty_unit_path_errors() {
        let toml = r#"
[[units]]
path = ""
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "units[0].path"));
    }

    #[test]
    fn non_translatable_unit_errors() {
        let toml = r#"
[[units]]
path = "include/a.h"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn duplicate_unit_errors() {
        let toml = r#"
[[units]]
path = "src/a.cc"

[[units]]
path = "a.cc"
resolve_dir = "./src"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(err.to_string().contains("declared more than once"));

        let distinct = "[[units]]\npath = \"src/a.cc\"\n[[units]]\npath = \"lib/a.cc\"\n";
        assert_eq!(load_config_from_str(distinct).unwrap().units.len(), 2);
    }

    #[test]
    fn empty_program_errors() {
        let toml = r#"
[toolchain]
program = " "
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn dir_and_file_conflict() {
        let toml = r#"
[output]
dir = "dist"
file = "dist/bundle.js"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[[units]]\npath = \"main.c\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.units[0].path, "main.c");
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}
