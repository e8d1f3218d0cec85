//! Script and stylesheet bundling.
//!
//! Both artifact kinds go through the same routine:
//!
//! ```text
//! sources (manifest order) → concatenation ─┬─ debug ──→ release/<out>
//!                                           └─ release → .<project>.<ext>.tmp → optimizer → release/<out>
//! ```
//!
//! Each source contributes its bytes followed by a single `\n`; no decoding
//! happens, so Latin-1 or BOM-prefixed sources pass through untouched. A missing
//! source aborts before anything is written. The temporary file is owned by a
//! [`TempArtifact`] guard and removed on every exit path.

use crate::optimizer::{ArtifactKind, OptimizerBackend, OptimizerError, RunOutput, Toolchain};
use crate::pipeline::BuildEvent;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Cannot include {0}")]
    MissingSource(PathBuf),
    #[error("IO error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Optimizer(#[from] OptimizerError),
}

/// Everything needed to produce one artifact.
#[derive(Debug, Clone)]
pub struct BundleSpec<'a> {
    pub kind: ArtifactKind,
    /// Source paths, relative to the app path.
    pub sources: &'a [String],
    /// Flags passed verbatim to the optimizer.
    pub params: &'a [String],
    /// Final artifact path.
    pub output: PathBuf,
    /// Where the concatenation is parked while the optimizer runs.
    pub temp_file: PathBuf,
}

/// What a bundle run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOutcome {
    pub kind: ArtifactKind,
    pub sources: usize,
    pub bytes: usize,
    pub output: PathBuf,
    pub optimized: bool,
}

/// Concatenate `sources` in order, each followed by `\n`.
pub fn concatenate(app: &Path, sources: &[String]) -> Result<Vec<u8>, BundleError> {
    let mut bundle = Vec::new();
    for source in sources {
        let path = app.join(source);
        if !path.is_file() {
            return Err(BundleError::MissingSource(path));
        }
        let content = fs::read(&path).map_err(|source| BundleError::Io {
            path: path.clone(),
            source,
        })?;
        bundle.extend_from_slice(&content);
        bundle.push(b'\n');
    }
    Ok(bundle)
}

/// Temporary file deleted when dropped.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    /// Write `contents` to `path` and take ownership of its removal.
    pub fn create(path: PathBuf, contents: &[u8]) -> io::Result<Self> {
        fs::write(&path, contents)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        // Best effort: the file may already be gone.
        let _ = fs::remove_file(&self.path);
    }
}

/// Build one artifact.
///
/// In debug mode the concatenation is written straight to `spec.output` and
/// no optimizer runs. Otherwise the optimizer is invoked once; its exit
/// status fails the build only when `toolchain.strict` is set.
pub fn build_bundle(
    app: &Path,
    spec: &BundleSpec<'_>,
    debug: bool,
    toolchain: &Toolchain,
    backend: &dyn OptimizerBackend,
    on_event: &mut dyn FnMut(BuildEvent),
) -> Result<BundleOutcome, BundleError> {
    let bundle = concatenate(app, spec.sources)?;

    if let Some(parent) = spec.output.parent() {
        fs::create_dir_all(parent).map_err(|source| BundleError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let outcome = BundleOutcome {
        kind: spec.kind,
        sources: spec.sources.len(),
        bytes: bundle.len(),
        output: spec.output.clone(),
        optimized: !debug,
    };

    if debug {
        fs::write(&spec.output, &bundle).map_err(|source| BundleError::Io {
            path: spec.output.clone(),
            source,
        })?;
        on_event(BuildEvent::DebugWritten {
            kind: spec.kind,
            output: spec.output.clone(),
        });
        return Ok(outcome);
    }

    let temp = TempArtifact::create(spec.temp_file.clone(), &bundle).map_err(|source| {
        BundleError::Io {
            path: spec.temp_file.clone(),
            source,
        }
    })?;

    let invocation = toolchain.invocation(spec.kind, spec.params, temp.path(), &spec.output);
    on_event(BuildEvent::OptimizerStarted {
        kind: spec.kind,
        command_line: invocation.command_line(),
    });

    let RunOutput {
        status,
        stdout,
        stderr,
    } = backend.run(&invocation)?;

    on_event(BuildEvent::OptimizerOutput {
        kind: spec.kind,
        stdout,
        stderr: stderr.clone(),
    });

    if !status.success() {
        if toolchain.strict {
            return Err(OptimizerError::Failed {
                kind: spec.kind,
                status,
                stderr,
            }
            .into());
        }
        on_event(BuildEvent::OptimizerFailureIgnored {
            kind: spec.kind,
            status,
        });
    }

    Ok(outcome)
}
