//! Shared fixture helpers for the asterix workspace's tests.

use std::fs;
use std::path::PathBuf;

/// Returns the path to the workspace-level `testdata/` directory, resolved
/// relative to whichever crate's tests are running.
pub fn testdata_dir() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    let candidates = [
        manifest_dir.join("../testdata"),
        manifest_dir.join("../../testdata"),
        manifest_dir.join("testdata"),
    ];

    for candidate in &candidates {
        if candidate.exists() {
            return candidate.canonicalize().unwrap_or_else(|_| candidate.clone());
        }
    }

    manifest_dir.join("../testdata")
}

/// Path to a fixture file under a named subdirectory of `testdata/` (e.g.
/// `"categories"`, `"index"`, `"records"`).
pub fn fixture_path(category: &str, filename: &str) -> PathBuf {
    testdata_dir().join(category).join(filename)
}

/// Loads a text fixture (an XML category or index document) as a `String`.
///
/// # Panics
///
/// Panics if the file cannot be read.
pub fn load_fixture(category: &str, filename: &str) -> String {
    let path = fixture_path(category, filename);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read fixture {}: {}", path.display(), e))
}

/// Loads a binary fixture (a captured or synthetic ASTERIX wire buffer) as
/// raw bytes.
///
/// # Panics
///
/// Panics if the file cannot be read.
pub fn load_fixture_bytes(category: &str, filename: &str) -> Vec<u8> {
    let path = fixture_path(category, filename);
    fs::read(&path).unwrap_or_else(|e| panic!("failed to read fixture {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_path_joins_category_and_filename() {
        let path = fixture_path("categories", "cat048.xml");
        assert!(path.ends_with("categories/cat048.xml"));
    }
}
