//! External optimizer invocation.
//!
//! Scripts go through Google Closure Compiler, stylesheets through YUI
//! Compressor. Both ship as jars and are launched through `java`:
//!
//! | Artifact | Command |
//! |---|---|
//! | Script | `java -jar compiler.jar <params…> --js <tmp> --js_output_file <out>` |
//! | Style | `java -jar compressor.jar <params…> --type css <tmp> -o <out>` |
//!
//! Manifest parameters are passed as separate argv entries, in order and
//! unmodified. No shell is involved.
//!
//! The [`OptimizerBackend`] trait is the seam between the bundle routine and
//! the process table. [`ProcessBackend`] is the production implementation;
//! tests use the recording mock in [`tests`].

use crate::config::ToolsConfig;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{kind} optimizer exited with status {status}{}", stderr_suffix(stderr))]
    Failed {
        kind: ArtifactKind,
        status: ExitSummary,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

/// The two artifact types a build produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Script,
    Style,
}

impl ArtifactKind {
    /// Extension used in the temporary concatenation file name.
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Script => "js",
            ArtifactKind::Style => "css",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Script => write!(f, "javascript"),
            ArtifactKind::Style => write!(f, "css"),
        }
    }
}

/// A fully-resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Shell-readable rendering for the build log.
    ///
    /// Arguments containing whitespace or quotes are single-quoted so the
    /// logged line can be pasted back into a shell.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote_arg(arg: &str) -> String {
    let needs_quotes =
        arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"');
    if needs_quotes {
        format!("'{}'", arg.replace('\'', r"'\''"))
    } else {
        arg.to_string()
    }
}

/// Exit status reduced to what the build log and errors need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitSummary {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl ExitSummary {
    pub fn success(self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ExitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{code}"),
            None => write!(f, "signal"),
        }
    }
}

/// Captured result of one optimizer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub status: ExitSummary,
    pub stdout: String,
    pub stderr: String,
}

/// Runs optimizer invocations.
pub trait OptimizerBackend {
    /// Run to completion and capture output. Only failure to start the
    /// process is an `Err`; a nonzero exit is reported through `RunOutput`.
    fn run(&self, invocation: &Invocation) -> Result<RunOutput, OptimizerError>;
}

/// Production backend: spawns the process and blocks until it exits.
pub struct ProcessBackend;

impl OptimizerBackend for ProcessBackend {
    fn run(&self, invocation: &Invocation) -> Result<RunOutput, OptimizerError> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .map_err(|source| OptimizerError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        Ok(RunOutput {
            status: ExitSummary {
                code: output.status.code(),
            },
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Resolved locations of the optimizer tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub java: String,
    pub compiler_jar: PathBuf,
    pub compressor_jar: PathBuf,
    /// Nonzero optimizer exit fails the build.
    pub strict: bool,
}

impl Toolchain {
    /// Resolve jar paths from config. See [`ToolsConfig::resolve_tools_dir`].
    pub fn from_config(tools: &ToolsConfig, app_path: &Path, exe_dir: &Path) -> Self {
        let dir = tools.resolve_tools_dir(app_path, exe_dir);
        Self {
            java: tools.java.clone(),
            compiler_jar: tools.compiler_jar_path(&dir),
            compressor_jar: tools.compressor_jar_path(&dir),
            strict: tools.strict,
        }
    }

    /// Build the command line that optimizes `input` into `output`.
    pub fn invocation(
        &self,
        kind: ArtifactKind,
        params: &[String],
        input: &Path,
        output: &Path,
    ) -> Invocation {
        let jar = match kind {
            ArtifactKind::Script => &self.compiler_jar,
            ArtifactKind::Style => &self.compressor_jar,
        };

        let mut args = vec!["-jar".to_string(), jar.display().to_string()];
        args.extend(params.iter().cloned());

        let input = input.display().to_string();
        let output = output.display().to_string();
        match kind {
            ArtifactKind::Script => {
                args.extend(["--js".to_string(), input]);
                args.extend(["--js_output_file".to_string(), output]);
            }
            ArtifactKind::Style => {
                args.extend(["--type".to_string(), "css".to_string(), input]);
                args.extend(["-o".to_string(), output]);
            }
        }

        Invocation {
            program: self.java.clone(),
            args,
        }
    }
}
