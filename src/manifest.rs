//! Project manifest loading and validation.
//!
//! The manifest is a JSON file at the root of a front-end project. Its
//! directory is the *app path*: every relative path inside the manifest
//! resolves against it.
//!
//! ```json
//! {
//!   "projectName": "demo",
//!   "releaseFolder": "dist",
//!   "resources": ["index.html", "assets/img"],
//!   "files": ["js/a.js", "js/b.js"],
//!   "styles": ["css/main.css"],
//!   "build": { "jsPath": "app.js", "cssPath": "app.css" },
//!   "closureBuildParameters": ["--compilation_level", "SIMPLE_OPTIMIZATIONS"],
//!   "compressorBuildParameters": ["--line-break", "80"]
//! }
//! ```
//!
//! ## Validation
//!
//! Loading fails before anything touches the filesystem when:
//! - the file does not exist or is empty
//! - the JSON is malformed or not an object
//! - required keys are missing (all missing keys are reported together)
//! - values are semantically unusable, e.g. a `releaseFolder` that escapes
//!   the app path (the release folder is wiped on every build), an output
//!   path that climbs out of the release folder, or a `projectName` that
//!   cannot be used as a file name
//!
//! Unknown top-level keys are ignored.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("No project manifest found at {0}")]
    NotFound(PathBuf),
    #[error("{0} does not name a manifest file")]
    NotAFile(PathBuf),
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Manifest {0} is empty")]
    Empty(PathBuf),
    #[error("There was an error while parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Manifest {path} is missing required fields: {}", fields.join(", "))]
    MissingFields { path: PathBuf, fields: Vec<String> },
    #[error("Manifest {path} is invalid: {}", problems.join("; "))]
    Invalid {
        path: PathBuf,
        problems: Vec<String>,
    },
}

/// Typed project descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManifest {
    /// Used in log messages and temporary file names.
    pub project_name: String,
    /// Output directory, relative to the app path. Wiped on every build.
    pub release_folder: String,
    /// Files or directories copied verbatim into the release folder.
    pub resources: Vec<String>,
    /// Script sources, concatenated in this order.
    pub files: Vec<String>,
    /// Stylesheet sources, concatenated in this order.
    pub styles: Vec<String>,
    pub build: BuildTargets,
    /// Flags passed verbatim to the script optimizer.
    pub closure_build_parameters: Vec<String>,
    /// Flags passed verbatim to the style optimizer.
    pub compressor_build_parameters: Vec<String>,
}

/// Output file names inside the release folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTargets {
    pub js_path: String,
    pub css_path: String,
}

const REQUIRED_KEYS: &[&str] = &[
    "projectName",
    "releaseFolder",
    "resources",
    "files",
    "styles",
    "build",
    "closureBuildParameters",
    "compressorBuildParameters",
];

const REQUIRED_BUILD_KEYS: &[&str] = &["jsPath", "cssPath"];

impl ProjectManifest {
    /// Release folder as a path.
    pub fn release_dir(&self) -> &Path {
        Path::new(&self.release_folder)
    }

    /// `releaseFolder/jsPath`
    pub fn js_output(&self) -> PathBuf {
        self.release_dir().join(&self.build.js_path)
    }

    /// `releaseFolder/cssPath`
    pub fn css_output(&self) -> PathBuf {
        self.release_dir().join(&self.build.css_path)
    }

    /// Check values that deserialize fine but cannot drive a build.
    ///
    /// Returns every problem found, not just the first.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.project_name.trim().is_empty() {
            problems.push("projectName must not be empty".to_string());
        } else if !is_file_name_safe(&self.project_name) {
            problems.push(format!(
                "projectName '{}' must not contain '/', '\\' or '..'",
                self.project_name
            ));
        }

        if self.release_folder.trim().is_empty() {
            problems.push("releaseFolder must not be empty".to_string());
        } else if !is_contained(self.release_dir()) {
            problems.push(format!(
                "releaseFolder '{}' must be a relative path inside the project",
                self.release_folder
            ));
        }

        for (key, value) in [
            ("build.jsPath", &self.build.js_path),
            ("build.cssPath", &self.build.css_path),
        ] {
            if value.trim().is_empty() {
                problems.push(format!("{key} must not be empty"));
            } else if !is_contained(Path::new(value)) {
                problems.push(format!(
                    "{key} '{value}' must be a relative path inside the release folder"
                ));
            }
        }

        problems
    }
}

/// Temp files are named `.<projectName>.<ext>.tmp` in the app path.
fn is_file_name_safe(name: &str) -> bool {
    !name.contains(['/', '\\']) && !name.contains("..")
}

/// True when `path` is relative, names something below its base, and never
/// climbs out with `..`.
pub(crate) fn is_contained(path: &Path) -> bool {
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}

/// Load and validate the manifest at `path`.
pub fn load_manifest(path: &Path) -> Result<ProjectManifest, ManifestError> {
    if !path.is_file() {
        return Err(ManifestError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_manifest(&content, path)
}

/// Parse manifest text. `path` is only used for error messages.
pub fn parse_manifest(content: &str, path: &Path) -> Result<ProjectManifest, ManifestError> {
    if content.trim().is_empty() {
        return Err(ManifestError::Empty(path.to_path_buf()));
    }

    let parse_err = |source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let value: serde_json::Value = serde_json::from_str(content).map_err(parse_err)?;

    let missing = missing_fields(&value);
    if !missing.is_empty() {
        return Err(ManifestError::MissingFields {
            path: path.to_path_buf(),
            fields: missing,
        });
    }

    let manifest: ProjectManifest = serde_json::from_value(value).map_err(parse_err)?;

    let problems = manifest.validate();
    if !problems.is_empty() {
        return Err(ManifestError::Invalid {
            path: path.to_path_buf(),
            problems,
        });
    }

    Ok(manifest)
}

/// Every required key absent from `value`, in declaration order.
///
/// A non-object top level reports every key as missing. Explicit `null`
/// counts as missing.
fn missing_fields(value: &serde_json::Value) -> Vec<String> {
    let present = |obj: &serde_json::Value, key: &str| obj.get(key).is_some_and(|v| !v.is_null());

    let mut missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|key| !present(value, **key))
        .map(|key| key.to_string())
        .collect();

    if let Some(build) = value.get("build").filter(|b| b.is_object()) {
        missing.extend(
            REQUIRED_BUILD_KEYS
                .iter()
                .filter(|key| !present(build, **key))
                .map(|key| format!("build.{key}")),
        );
    }

    missing
}
