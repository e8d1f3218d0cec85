//! Build session and stage orchestration.
//!
//! A build runs these stages strictly in order, stopping at the first error:
//!
//! ```text
//! 1. Stage      release folder created or emptied
//! 2. Resources  declared files/directories mirrored into it
//! 3. Scripts    `files` concatenated, optimized → releaseFolder/jsPath
//! 4. Styles     `styles` concatenated, optimized → releaseFolder/cssPath
//! ```
//!
//! Manifest loading and the switch into the app directory happen before
//! [`build`] is called (see `main.rs`). Progress is reported as
//! [`BuildEvent`]s; formatting them is the job of [`crate::output`].

use crate::bundle::{self, BundleError, BundleOutcome, BundleSpec};
use crate::config::ConfigError;
use crate::manifest::{ManifestError, ProjectManifest};
use crate::optimizer::{ArtifactKind, ExitSummary, OptimizerBackend, Toolchain};
use crate::release::{self, CopiedResource, ReleaseError, ResourceError, StageOutcome};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Manifest file name used when none is given on the command line.
pub const DEFAULT_MANIFEST: &str = "manifest.json";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Cannot change working directory to {path}: {source}")]
    WorkingDirectory { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Release(#[from] ReleaseError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Bundle(#[from] BundleError),
}

/// Progress notifications, one per log-worthy step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    WorkingDirectory(PathBuf),
    Building {
        project: String,
    },
    ReleaseStaged {
        folder: String,
        outcome: StageOutcome,
    },
    ResourceCopied(CopiedResource),
    DebugWritten {
        kind: ArtifactKind,
        output: PathBuf,
    },
    OptimizerStarted {
        kind: ArtifactKind,
        command_line: String,
    },
    OptimizerOutput {
        kind: ArtifactKind,
        stdout: String,
        stderr: String,
    },
    OptimizerFailureIgnored {
        kind: ArtifactKind,
        status: ExitSummary,
    },
    Complete {
        project: String,
        release: PathBuf,
    },
}

/// Per-invocation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSession {
    /// Directory containing the manifest; all manifest paths resolve here.
    pub app_path: PathBuf,
    /// Manifest path exactly as given on the command line.
    pub manifest: PathBuf,
    /// Skip optimization and write raw concatenations.
    pub debug: bool,
}

impl BuildSession {
    /// Derive the app path from `manifest`.
    ///
    /// A bare file name gets `.` as its app path. Paths without a file name
    /// (`..`, `/`) are rejected.
    pub fn new(manifest: &Path, debug: bool) -> Result<Self, ManifestError> {
        if manifest.file_name().is_none() {
            return Err(ManifestError::NotAFile(manifest.to_path_buf()));
        }
        let app_path = manifest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            app_path,
            manifest: manifest.to_path_buf(),
            debug,
        })
    }

    /// Manifest to load, relative to the directory the process started in.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest
    }

    /// `.<project>.<ext>.tmp` in the app path.
    pub fn temp_file(&self, project: &str, kind: ArtifactKind) -> PathBuf {
        self.app_path
            .join(format!(".{project}.{}.tmp", kind.extension()))
    }

    /// Make the app path the process working directory.
    ///
    /// Called exactly once per run. Afterwards `app_path` is `.` and the
    /// returned path is the absolute new working directory.
    pub fn enter_app_path(&mut self) -> Result<PathBuf, BuildError> {
        let wd_err = |source| BuildError::WorkingDirectory {
            path: self.app_path.clone(),
            source,
        };
        std::env::set_current_dir(&self.app_path).map_err(wd_err)?;
        let cwd = std::env::current_dir().map_err(wd_err)?;
        self.app_path = PathBuf::from(".");
        Ok(cwd)
    }
}

/// What a completed build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub release: PathBuf,
    pub resources: Vec<CopiedResource>,
    pub script: BundleOutcome,
    pub style: BundleOutcome,
}

/// Run every build stage for `manifest`.
pub fn build(
    session: &BuildSession,
    manifest: &ProjectManifest,
    toolchain: &Toolchain,
    backend: &dyn OptimizerBackend,
    on_event: &mut dyn FnMut(BuildEvent),
) -> Result<BuildSummary, BuildError> {
    let app = session.app_path.as_path();

    on_event(BuildEvent::Building {
        project: manifest.project_name.clone(),
    });

    let release = app.join(manifest.release_dir());
    let outcome = release::stage_release_folder(&release)?;
    on_event(BuildEvent::ReleaseStaged {
        folder: manifest.release_folder.clone(),
        outcome,
    });

    let resources = release::copy_resources(app, &manifest.resources, &release, |copied| {
        on_event(BuildEvent::ResourceCopied(copied.clone()))
    })?;

    let script = bundle::build_bundle(
        app,
        &BundleSpec {
            kind: ArtifactKind::Script,
            sources: &manifest.files,
            params: &manifest.closure_build_parameters,
            output: app.join(manifest.js_output()),
            temp_file: session.temp_file(&manifest.project_name, ArtifactKind::Script),
        },
        session.debug,
        toolchain,
        backend,
        on_event,
    )?;

    let style = bundle::build_bundle(
        app,
        &BundleSpec {
            kind: ArtifactKind::Style,
            sources: &manifest.styles,
            params: &manifest.compressor_build_parameters,
            output: app.join(manifest.css_output()),
            temp_file: session.temp_file(&manifest.project_name, ArtifactKind::Style),
        },
        session.debug,
        toolchain,
        backend,
        on_event,
    )?;

    on_event(BuildEvent::Complete {
        project: manifest.project_name.clone(),
        release: release.clone(),
    });

    Ok(BuildSummary {
        release,
        resources,
        script,
        style,
    })
}
