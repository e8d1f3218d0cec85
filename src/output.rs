//! CLI output formatting for build events.
//!
//! # Output Format
//!
//! ```text
//! Note: Working directory changed to: /home/me/my-app
//!
//! Building 'demo' ...
//! Cleaning dist folder
//! Resource: index.html
//! Resource: assets/img/ (12 files)
//! Build: java -jar /opt/front-builder/compiler.jar --js ./.demo.js.tmp --js_output_file ./dist/app.js
//!     0 error(s), 0 warning(s)
//! Build: java -jar /opt/front-builder/compressor.jar --type css ./.demo.css.tmp -o ./dist/app.css
//! ==> Build complete: ./dist
//! ```
//!
//! In debug mode the two `Build:` blocks become `Debug: <output>` lines.
//! Optimizer output is echoed indented beneath the command that produced it;
//! stderr lines are marked with `!`.
//!
//! # Architecture
//!
//! [`format_build_event`] returns `Vec<String>` for testability and
//! [`print_build_event`] writes the lines to stdout. Format functions are
//! pure: no I/O, no side effects.

use crate::pipeline::BuildEvent;
use crate::release::{ResourceKind, StageOutcome};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Echo captured process output, one indented line per input line.
fn echo_lines(text: &str, marker: &str) -> impl Iterator<Item = String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(move |line| format!("{}{marker}{line}", indent(1)))
}

/// Format a single build event as output lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::WorkingDirectory(dir) => vec![
            format!("Note: Working directory changed to: {}", dir.display()),
            String::new(),
        ],
        BuildEvent::Building { project } => vec![format!("Building '{project}' ...")],
        BuildEvent::ReleaseStaged { folder, outcome } => match outcome {
            StageOutcome::Created => vec![format!("Created {folder} folder")],
            StageOutcome::Cleaned => vec![format!("Cleaning {folder} folder")],
        },
        BuildEvent::ResourceCopied(copied) => match copied.kind {
            ResourceKind::File => vec![format!("Resource: {}", copied.resource)],
            ResourceKind::Directory { files } => vec![format!(
                "Resource: {}/ ({} {})",
                copied.resource.trim_end_matches('/'),
                files,
                if files == 1 { "file" } else { "files" }
            )],
        },
        BuildEvent::DebugWritten { output, .. } => vec![format!("Debug: {}", output.display())],
        BuildEvent::OptimizerStarted { command_line, .. } => {
            vec![format!("Build: {command_line}")]
        }
        BuildEvent::OptimizerOutput { stdout, stderr, .. } => echo_lines(stdout, "")
            .chain(echo_lines(stderr, "! "))
            .collect(),
        BuildEvent::OptimizerFailureIgnored { kind, status } => vec![format!(
            "Warning: {kind} optimizer exited with status {status}; continuing (tools.strict = false)"
        )],
        BuildEvent::Complete { release, .. } => {
            vec![format!("==> Build complete: {}", release.display())]
        }
    }
}

/// Print a build event to stdout.
pub fn print_build_event(event: &BuildEvent) {
    for line in format_build_event(event) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::{ArtifactKind, ExitSummary};
    use crate::release::CopiedResource;
    use std::path::PathBuf;

    #[test]
    fn working_directory_note_has_blank_line() {
        let lines = format_build_event(&BuildEvent::WorkingDirectory(PathBuf::from("/w/app")));
        assert_eq!(lines, vec!["Note: Working directory changed to: /w/app", ""]);
    }

    #[test]
    fn building_line_quotes_project() {
        let lines = format_build_event(&BuildEvent::Building {
            project: "demo".into(),
        });
        assert_eq!(lines, vec!["Building 'demo' ..."]);
    }

    #[test]
    fn release_staging_lines() {
        let cleaned = format_build_event(&BuildEvent::ReleaseStaged {
            folder: "dist".into(),
            outcome: StageOutcome::Cleaned,
        });
        assert_eq!(cleaned, vec!["Cleaning dist folder"]);

        let created = format_build_event(&BuildEvent::ReleaseStaged {
            folder: "dist".into(),
            outcome: StageOutcome::Created,
        });
        assert_eq!(created, vec!["Created dist folder"]);
    }

    #[test]
    fn resource_lines() {
        let file = format_build_event(&BuildEvent::ResourceCopied(CopiedResource {
            resource: "index.html".into(),
            destination: PathBuf::from("dist/index.html"),
            kind: ResourceKind::File,
        }));
        assert_eq!(file, vec!["Resource: index.html"]);

        let dir = format_build_event(&BuildEvent::ResourceCopied(CopiedResource {
            resource: "assets/img/".into(),
            destination: PathBuf::from("dist/assets/img"),
            kind: ResourceKind::Directory { files: 1 },
        }));
        assert_eq!(dir, vec!["Resource: assets/img/ (1 file)"]);
    }

    #[test]
    fn optimizer_output_is_indented_and_marked() {
        let lines = format_build_event(&BuildEvent::OptimizerOutput {
            kind: ArtifactKind::Script,
            stdout: "done\n\n".into(),
            stderr: "a.js:3: WARNING - unused\n0 error(s), 1 warning(s)\n".into(),
        });
        assert_eq!(
            lines,
            vec![
                "    done",
                "    ! a.js:3: WARNING - unused",
                "    ! 0 error(s), 1 warning(s)",
            ]
        );
    }

    #[test]
    fn silent_optimizer_prints_nothing() {
        let lines = format_build_event(&BuildEvent::OptimizerOutput {
            kind: ArtifactKind::Style,
            stdout: String::new(),
            stderr: String::new(),
        });
        assert!(lines.is_empty());
    }

    #[test]
    fn ignored_failure_warning() {
        let lines = format_build_event(&BuildEvent::OptimizerFailureIgnored {
            kind: ArtifactKind::Style,
            status: ExitSummary { code: Some(2) },
        });
        assert_eq!(
            lines,
            vec!["Warning: css optimizer exited with status 2; continuing (tools.strict = false)"]
        );
    }

    #[test]
    fn debug_and_build_lines() {
        let debug = format_build_event(&BuildEvent::DebugWritten {
            kind: ArtifactKind::Script,
            output: PathBuf::from("./dist/app.js"),
        });
        assert_eq!(debug, vec!["Debug: ./dist/app.js"]);

        let build = format_build_event(&BuildEvent::OptimizerStarted {
            kind: ArtifactKind::Script,
            command_line: "java -jar compiler.jar".into(),
        });
        assert_eq!(build, vec!["Build: java -jar compiler.jar"]);
    }
}
