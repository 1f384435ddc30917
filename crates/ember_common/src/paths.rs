//! Lexical path utilities.
//!
//! Every path the cache stores or compares goes through these helpers so that
//! `src/./a.cc`, `src/x/../a.cc` and `src/a.cc` name the same file. None of
//! them touch the filesystem; symlinks are not resolved.

use std::path::{Component, Path, PathBuf};

/// Source file extensions the translation tool accepts, lowercase.
const TRANSLATABLE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx"];

/// Lexically normalizes a path: drops `.` components and folds `..` into the
/// preceding normal component.
///
/// Leading `..` components of a relative path are kept. `..` directly above
/// the root of an absolute path is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last().copied() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().map(|c| c.as_os_str()).collect()
}

/// Joins `path` onto `base` (unless it is already absolute) and normalizes
/// the result.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Returns the lexical path leading from `base` to `path`.
///
/// Both paths should be absolute. Identical paths yield an empty path. When
/// the paths share no root (different drive prefixes), `path` is returned
/// normalized but otherwise unchanged.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path = normalize(path);
    let base = normalize(base);

    let path_parts: Vec<Component<'_>> = path.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 && (path.has_root() || base.has_root()) {
        return path;
    }

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &path_parts[common..] {
        out.push(part.as_os_str());
    }
    out
}

/// Returns `true` if the path names a C or C++ source the translation tool
/// accepts (`.c`, `.cc`, `.cpp`, `.cxx`, any case).
pub fn is_translatable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            TRANSLATABLE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_cur_dir() {
        assert_eq!(normalize(Path::new("./src/./a.cc")), PathBuf::from("src/a.cc"));
    }

    #[test]
    fn normalize_folds_parent_dir() {
        assert_eq!(
            normalize(Path::new("src/include/../a.cc")),
            PathBuf::from("src/a.cc")
        );
    }

    #[test]
    fn normalize_keeps_leading_parent_of_relative() {
        assert_eq!(normalize(Path::new("../../x.h")), PathBuf::from("../../x.h"));
        assert_eq!(normalize(Path::new("a/../../x.h")), PathBuf::from("../x.h"));
    }

    #[cfg(unix)]
    #[test]
    fn normalize_clamps_at_root() {
        assert_eq!(normalize(Path::new("/../usr/./include")), PathBuf::from("/usr/include"));
    }

    #[cfg(unix)]
    #[test]
    fn absolutize_relative_and_absolute() {
        let base = Path::new("/work/project/src");
        assert_eq!(
            absolutize(Path::new("../include/h.h"), base),
            PathBuf::from("/work/project/include/h.h")
        );
        assert_eq!(
            absolutize(Path::new("/usr/include/stdio.h"), base),
            PathBuf::from("/usr/include/stdio.h")
        );
    }

    #[cfg(unix)]
    #[test]
    fn relative_to_child() {
        assert_eq!(
            relative_to(Path::new("/work/project/src/a.cc"), Path::new("/work/project")),
            PathBuf::from("src/a.cc")
        );
    }

    #[cfg(unix)]
    #[test]
    fn relative_to_sibling_dir() {
        assert_eq!(
            relative_to(Path::new("/work/project/dist/a.mjs"), Path::new("/work/project/src")),
            PathBuf::from("../dist/a.mjs")
        );
    }

    #[cfg(unix)]
    #[test]
    fn relative_to_outside_root() {
        assert_eq!(
            relative_to(Path::new("/usr/include/stdio.h"), Path::new("/work/project")),
            PathBuf::from("../../usr/include/stdio.h")
        );
    }

    #[cfg(unix)]
    #[test]
    fn relative_to_same_path_is_empty() {
        assert_eq!(
            relative_to(Path::new("/work/project"), Path::new("/work/project/")),
            PathBuf::new()
        );
    }

    #[test]
    fn translatable_extensions() {
        assert!(is_translatable(Path::new("a.c")));
        assert!(is_translatable(Path::new("src/a.cc")));
        assert!(is_translatable(Path::new("src/a.CPP")));
        assert!(is_translatable(Path::new("a.cxx")));
        assert!(!is_translatable(Path::new("a.h")));
        assert!(!is_translatable(Path::new("a.ccx")));
        assert!(!is_translatable(Path::new("Makefile")));
    }
}
