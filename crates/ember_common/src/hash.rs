//! Content hashing for freshness checks and artifact naming.

use serde::{Deserialize, Serialize};
use std::fmt;

/// XXH3-128 digest of a byte string.
///
/// Fingerprints use it over file contents; artifact names use it over the
/// unit's root-relative path, so two units with the same base name in
/// different directories never share an output file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Digests `data`.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data).to_le_bytes())
    }

    /// Digests the UTF-8 bytes of `s`.
    pub fn of_str(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

/// 32 lowercase hex digits, as embedded in artifact file names.
impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, ..] = self.0;
        write!(f, "ContentHash({a:02x}{b:02x}{c:02x}{d:02x}..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"int main() {}");
        let b = ContentHash::from_bytes(b"int main() {}");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = ContentHash::from_bytes(b"#include \"a.h\"");
        let b = ContentHash::from_bytes(b"#include \"b.h\"");
        assert_ne!(a, b);
    }

    #[test]
    fn of_str_matches_bytes() {
        assert_eq!(
            ContentHash::of_str("src/a.cc"),
            ContentHash::from_bytes(b"src/a.cc")
        );
    }

    #[test]
    fn same_base_name_different_dirs_differ() {
        let a = ContentHash::of_str("lib/one/main.cc");
        let b = ContentHash::of_str("lib/two/main.cc");
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn display_format() {
        let s = ContentHash::of_str("test").to_string();
        assert_eq!(s.len(), 32, "Display should be 32 hex chars");
        assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn debug_abbreviated() {
        let h = ContentHash::of_str("test");
        let s = format!("{h:?}");
        assert_eq!(s, format!("ContentHash({}..)", &h.to_string()[..8]));
    }

    #[test]
    fn serde_roundtrip() {
        let h = ContentHash::of_str("serde test");
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
