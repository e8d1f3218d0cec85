//! Shared test utilities for the front-builder test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_demo_project();
//! let manifest = load_manifest(&tmp.path().join("manifest.json")).unwrap();
//! assert_eq!(manifest.files, vec!["a.js", "b.js"]);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The demo manifest: two scripts, one stylesheet, no resources.
pub const DEMO_MANIFEST: &str = r#"{"projectName":"demo","releaseFolder":"dist","resources":[],"files":["a.js","b.js"],"styles":["a.css"],"build":{"jsPath":"app.js","cssPath":"app.css"},"closureBuildParameters":[],"compressorBuildParameters":[]}"#;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `contents` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Read a file to a string. Panics with the path on failure.
pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

/// Temp project containing the demo manifest and its sources.
pub fn setup_demo_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "manifest.json", DEMO_MANIFEST);
    write_file(tmp.path(), "a.js", "var a=1;");
    write_file(tmp.path(), "b.js", "var b=2;");
    write_file(tmp.path(), "a.css", "body{margin:0}");
    tmp
}
