//! Configuration types deserialized from `ember.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

/// Output directory used when `[output]` names neither `dir` nor `file`.
pub const DEFAULT_OUT_DIR: &str = "dist";

/// Cache directory used when `[cache]` does not name one.
pub const DEFAULT_CACHE_DIR: &str = ".ember";

/// File name of the fingerprint table inside the cache directory.
pub const STORE_FILE: &str = "freshness.json";

/// Flags every build invocation gets ahead of the merged options, producing an
/// ES6 module factory suitable for the web.
pub const DEFAULT_BASELINE_FLAGS: &[&str] = &[
    "-Os",
    "-sENVIRONMENT=web",
    "-sEXPORT_ES6=1",
    "-sMODULARIZE=1",
];

/// The top-level project configuration parsed from `ember.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectConfig {
    /// The translation tool and its global options.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// Where artifacts are written.
    #[serde(default)]
    pub output: OutputConfig,
    /// Where the fingerprint table is persisted.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Batch settings (parallelism, verbosity).
    #[serde(default)]
    pub build: BuildSettings,
    /// The build units, in declaration order.
    #[serde(default)]
    pub units: Vec<UnitConfig>,
}

impl ProjectConfig {
    /// Returns the absolute artifact output directory.
    ///
    /// `output.file` contributes its parent directory; otherwise `output.dir`
    /// is used, falling back to [`DEFAULT_OUT_DIR`].
    pub fn out_dir(&self, project_dir: &Path) -> PathBuf {
        let relative = match (&self.output.dir, &self.output.file) {
            (_, Some(file)) => Path::new(file)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            (Some(dir), None) => PathBuf::from(dir),
            (None, None) => PathBuf::from(DEFAULT_OUT_DIR),
        };
        ember_common::absolutize(&relative, project_dir)
    }

    /// Returns the absolute path of the persisted fingerprint table.
    pub fn store_path(&self, project_dir: &Path) -> PathBuf {
        let dir = self.cache.dir.as_deref().unwrap_or(DEFAULT_CACHE_DIR);
        ember_common::absolutize(Path::new(dir), project_dir).join(STORE_FILE)
    }
}

/// The external translation tool.
#[derive(Debug, Deserialize)]
pub struct ToolchainConfig {
    /// Program name or path of the tool.
    #[serde(default = "default_program")]
    pub program: String,
    /// Options passed to every unit, before the unit's own options.
    ///
    /// Accepts either a list or a single whitespace-separated string.
    #[serde(default, deserialize_with = "deserialize_options")]
    pub options: Vec<String>,
    /// Fixed flags for build invocations.
    #[serde(default = "default_baseline_flags")]
    pub baseline_flags: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            options: Vec::new(),
            baseline_flags: default_baseline_flags(),
        }
    }
}

fn default_program() -> String {
    "emcc".to_string()
}

fn default_baseline_flags() -> Vec<String> {
    DEFAULT_BASELINE_FLAGS.iter().map(|f| f.to_string()).collect()
}

/// Deserializes options from either a string (`options = "-O2 -Wall"`) or an
/// array of strings (`options = ["-O2", "-Wall"]`).
fn deserialize_options<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(ember_common::split_options(v))
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Artifact output location. At most one of `dir` and `file` may be set.
#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Output directory, relative to the project root.
    pub dir: Option<String>,
    /// Output file of the enclosing bundle; artifacts go next to it.
    pub file: Option<String>,
}

/// Fingerprint table location.
#[derive(Debug, Default, Deserialize)]
pub struct CacheConfig {
    /// Cache directory, relative to the project root.
    pub dir: Option<String>,
}

/// Batch settings.
#[derive(Debug, Default, Deserialize)]
pub struct BuildSettings {
    /// Worker count for concurrent units; `0` means one per core.
    #[serde(default)]
    pub jobs: usize,
    /// Log every unit that gets compiled.
    #[serde(default)]
    pub verbose: bool,
}

/// A single `[[units]]` entry, with its attribute strings still raw.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitConfig {
    /// Primary source, relative to `resolve_dir`.
    pub path: String,
    /// Directory relative paths of this unit resolve against, relative to the
    /// project root. Defaults to the project root.
    #[serde(default)]
    pub resolve_dir: Option<String>,
    /// Unit-specific options, appended after the global options.
    #[serde(default)]
    pub options: Option<String>,
    /// Auxiliary sources compiled into the same artifact.
    #[serde(default)]
    pub sources: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolchain_defaults() {
        let tc = ToolchainConfig::default();
        assert_eq!(tc.program, "emcc");
        assert!(tc.options.is_empty());
        assert_eq!(tc.baseline_flags, DEFAULT_BASELINE_FLAGS);
    }

    #[test]
    fn options_from_string() {
        let config: ProjectConfig = toml::from_str(
            r#"
[toolchain]
options = "-Iinclude  -O2"
"#,
        )
        .unwrap();
        assert_eq!(config.toolchain.options, vec!["-Iinclude", "-O2"]);
    }

    #[test]
    fn options_from_list() {
        let config: ProjectConfig = toml::from_str(
            r#"
[toolchain]
options = ["-Iinclude", "-sEXPORTED_FUNCTIONS=_main"]
"#,
        )
        .unwrap();
        assert_eq!(
            config.toolchain.options,
            vec!["-Iinclude", "-sEXPORTED_FUNCTIONS=_main"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn out_dir_variants() {
        let root = Path::new("/work/app");

        let config = ProjectConfig::default();
        assert_eq!(config.out_dir(root), PathBuf::from("/work/app/dist"));

        let config: ProjectConfig = toml::from_str("[output]\ndir = \"build/wasm\"\n").unwrap();
        assert_eq!(config.out_dir(root), PathBuf::from("/work/app/build/wasm"));

        let config: ProjectConfig =
            toml::from_str("[output]\nfile = \"public/bundle.js\"\n").unwrap();
        assert_eq!(config.out_dir(root), PathBuf::from("/work/app/public"));
    }

    #[cfg(unix)]
    #[test]
    fn store_path_variants() {
        let root = Path::new("/work/app");
        let config = ProjectConfig::default();
        assert_eq!(
            config.store_path(root),
            PathBuf::from("/work/app/.ember/freshness.json")
        );

        let config: ProjectConfig = toml::from_str("[cache]\ndir = \"tmp/c\"\n").unwrap();
        assert_eq!(
            config.store_path(root),
            PathBuf::from("/work/app/tmp/c/freshness.json")
        );
    }
}
