//! Build units, their typed attributes, and the artifacts they produce.

use std::path::{Path, PathBuf};

use ember_common::ContentHash;

/// Extension of every artifact file.
const ARTIFACT_EXT: &str = "mjs";

/// The per-unit attribute bag as the host supplies it: two optional strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAttributes {
    /// Unit-specific options, whitespace separated.
    pub options: Option<String>,
    /// Auxiliary sources, whitespace separated, quotes allowed.
    pub sources: Option<String>,
}

/// Typed per-unit attributes, tokenized once from [`RawAttributes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitAttributes {
    /// Unit-specific options, in declaration order.
    pub options: Vec<String>,
    /// Auxiliary sources relative to the unit's resolve directory.
    pub sources: Vec<String>,
}

impl UnitAttributes {
    /// Tokenizes the raw attribute strings.
    pub fn parse(raw: &RawAttributes) -> Self {
        Self {
            options: raw
                .options
                .as_deref()
                .map(ember_common::split_options)
                .unwrap_or_default(),
            sources: raw
                .sources
                .as_deref()
                .map(ember_common::parse_sources)
                .unwrap_or_default(),
        }
    }
}

/// One entry point, identified by its root-relative path.
#[derive(Debug, Clone)]
pub struct BuildUnit {
    /// Normalized primary source path relative to the project root. This is
    /// the unit's identity across batches.
    pub key: PathBuf,
    /// Absolute directory the unit's sources resolve against; the tool runs
    /// here.
    pub resolve_dir: PathBuf,
    /// Options and auxiliary sources.
    pub attributes: UnitAttributes,
}

impl BuildUnit {
    /// Returns the unit's sources as passed to the tool: the primary source
    /// first, relative to the resolve directory, then the auxiliary sources
    /// as written.
    pub fn sources(&self, root: &Path) -> Vec<String> {
        let primary = ember_common::relative_to(&root.join(&self.key), &self.resolve_dir);
        std::iter::once(primary.to_string_lossy().into_owned())
            .chain(self.attributes.sources.iter().cloned())
            .collect()
    }

    /// The key as a display string.
    pub fn name(&self) -> String {
        self.key.to_string_lossy().into_owned()
    }
}

/// Settings shared by every unit of a batch.
#[derive(Debug, Clone)]
pub struct BuildEnv {
    /// Absolute project root; every tracked path is relative to it.
    pub root: PathBuf,
    /// Absolute directory artifacts are written to.
    pub out_dir: PathBuf,
    /// Options every unit gets ahead of its own.
    pub global_options: Vec<String>,
    /// Fixed flags for build invocations.
    pub baseline_flags: Vec<String>,
    /// Log each compiled unit at `info` instead of `debug`.
    pub verbose: bool,
}

impl BuildEnv {
    /// Global options followed by the unit's options.
    ///
    /// Nothing is de-duplicated: a flag given in both places is passed twice
    /// and the tool's own precedence rules apply.
    pub fn merged_options(&self, attributes: &UnitAttributes) -> Vec<String> {
        self.global_options
            .iter()
            .chain(&attributes.options)
            .cloned()
            .collect()
    }

    /// Returns the artifact path of a unit: `<out_dir>/<base>.<digest>.mjs`,
    /// where the digest is taken over the unit key.
    pub fn artifact_path(&self, key: &Path) -> PathBuf {
        let base = key
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let digest = ContentHash::of_str(&key.to_string_lossy());
        self.out_dir.join(format!("{base}.{digest}.{ARTIFACT_EXT}"))
    }
}

/// How the host should interpret artifact contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// A JavaScript module.
    Js,
}

impl ContentKind {
    /// The host's loader tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Js => "js",
        }
    }
}

/// A unit's output, as handed back to the host.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Key of the unit that produced it.
    pub key: PathBuf,
    /// Absolute path of the artifact file.
    pub path: PathBuf,
    /// Artifact bytes.
    pub contents: Vec<u8>,
    /// Root-relative files whose change should invalidate this artifact.
    pub watch_files: Vec<PathBuf>,
    /// How to interpret `contents`.
    pub kind: ContentKind,
    /// Whether the tool ran for this artifact in the current batch.
    pub rebuilt: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> BuildEnv {
        BuildEnv {
            root: PathBuf::from("/work/app"),
            out_dir: PathBuf::from("/work/app/dist"),
            global_options: vec!["-sEXPORTED_FUNCTIONS=_a".to_string(), "-Iinclude".to_string()],
            baseline_flags: vec!["-Os".to_string()],
            verbose: false,
        }
    }

    #[test]
    fn parse_attributes() {
        let attrs = UnitAttributes::parse(&RawAttributes {
            options: Some("-O2  -DX".to_string()),
            sources: Some("b.cc 'c d.cc'".to_string()),
        });
        assert_eq!(attrs.options, vec!["-O2", "-DX"]);
        assert_eq!(attrs.sources, vec!["b.cc", "c d.cc"]);
    }

    #[test]
    fn parse_absent_attributes() {
        assert_eq!(
            UnitAttributes::parse(&RawAttributes::default()),
            UnitAttributes::default()
        );
        let attrs = UnitAttributes::parse(&RawAttributes {
            options: Some(String::new()),
            sources: None,
        });
        assert!(attrs.options.is_empty());
    }

    #[test]
    fn merged_options_keep_duplicates_in_order() {
        let attrs = UnitAttributes {
            options: vec!["-sEXPORTED_FUNCTIONS=_b".to_string()],
            sources: Vec::new(),
        };
        assert_eq!(
            env().merged_options(&attrs),
            vec![
                "-sEXPORTED_FUNCTIONS=_a",
                "-Iinclude",
                "-sEXPORTED_FUNCTIONS=_b"
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn sources_relative_to_resolve_dir() {
        let unit = BuildUnit {
            key: PathBuf::from("lib/core/a.cc"),
            resolve_dir: PathBuf::from("/work/app/lib"),
            attributes: UnitAttributes {
                options: Vec::new(),
                sources: vec!["core/b.cc".to_string()],
            },
        };
        assert_eq!(unit.sources(Path::new("/work/app")), vec!["core/a.cc", "core/b.cc"]);
        assert_eq!(unit.name(), "lib/core/a.cc");
    }

    #[cfg(unix)]
    #[test]
    fn artifact_path_is_stable_and_distinct_per_directory() {
        let env = env();
        let a = env.artifact_path(Path::new("one/main.cc"));
        let b = env.artifact_path(Path::new("two/main.cc"));
        assert_eq!(a, env.artifact_path(Path::new("one/main.cc")));
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(Path::new("/work/app/dist")));

        let name = a.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("main.cc."));
        assert!(name.ends_with(".mjs"));
        assert_eq!(name.len(), "main.cc.".len() + 32 + ".mjs".len());
    }

    #[test]
    fn content_kind_tag() {
        assert_eq!(ContentKind::Js.as_str(), "js");
    }
}
