//! Command-line surface.
//!
//! Arguments are scanned left to right before clap sees them:
//!
//! | Token | Effect |
//! |-------|--------|
//! | `-h`, `--h`, `-help`, `--help` | show help, ignore everything after it |
//! | `-v`, `--v`, `-version`, `--version` | show version, ignore everything after it |
//! | `-d`, `--d`, `-debug`, `--debug` | debug build (repeats are fine) |
//! | `--gen-config` | print a documented `front-builder.toml` |
//! | anything else | manifest path, the last one wins |
//!
//! "Anything else" includes dash-prefixed tokens such as `-dv` or
//! `-x.json`. clap then only ever sees canonical flags plus at most one
//! positional after `--`.

use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::pipeline::DEFAULT_MANIFEST;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    let release_date = env!("RELEASE_DATE");
    let version = if on_tag == "true" {
        format!("v{}", env!("CARGO_PKG_VERSION"))
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown".to_string()
        } else {
            format!("dev@{hash}")
        }
    };
    // clap wants a 'static str; leaked once per parse
    Box::leak(format!("{version} (released {release_date})").into_boxed_str())
}

#[derive(Parser, Debug)]
#[command(name = "front-builder")]
#[command(about = "Concatenate, optimize and release front-end projects")]
#[command(long_about = "\
Concatenate, optimize and release front-end projects

Reads a manifest (default: ./manifest.json), resets the release folder,
copies resources into it, and builds one script and one stylesheet:

  manifest.json
  {
    \"projectName\": \"demo\",
    \"releaseFolder\": \"dist\",
    \"resources\": [\"index.html\", \"assets/img\"],
    \"files\": [\"js/a.js\", \"js/b.js\"],
    \"styles\": [\"css/main.css\"],
    \"build\": { \"jsPath\": \"app.js\", \"cssPath\": \"app.css\" },
    \"closureBuildParameters\": [\"--compilation_level\", \"SIMPLE_OPTIMIZATIONS\"],
    \"compressorBuildParameters\": []
  }

Scripts are optimized with Closure Compiler, stylesheets with YUI
Compressor. Use --debug to skip both and ship the raw concatenations.

Run 'front-builder --gen-config' to generate a documented front-builder.toml.")]
#[command(version = version_string())]
#[command(disable_help_flag = true, disable_version_flag = true)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Path to the project manifest [default: manifest.json]. If given more
    /// than once, the last one wins.
    #[arg(value_name = "MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Merge files and create the release folder without optimizing
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Print a documented front-builder.toml and exit
    #[arg(long)]
    pub gen_config: bool,

    /// Print help
    #[allow(dead_code)]
    #[arg(short = 'h', long = "help", action = ArgAction::Help)]
    help: Option<bool>,

    /// Print version
    #[allow(dead_code)]
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
}

impl Cli {
    /// Parse from the process arguments.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Manifest to build: the last positional argument, or the default.
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    Help,
    Version,
    Debug,
    GenConfig,
}

fn recognize(token: &str) -> Option<Flag> {
    match token {
        "-h" | "--h" | "-help" | "--help" => Some(Flag::Help),
        "-v" | "--v" | "-version" | "--version" => Some(Flag::Version),
        "-d" | "--d" | "-debug" | "--debug" => Some(Flag::Debug),
        "--gen-config" => Some(Flag::GenConfig),
        _ => None,
    }
}

/// Scan `args` (program name first) and rebuild them in canonical form.
///
/// Help and version stop the scan. Debug and gen-config are emitted once
/// however often they appear. Every other token replaces the manifest path
/// and ends up as the single positional after `--`.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter();
    let mut normalized: Vec<OsString> = args.next().into_iter().collect();
    let mut debug = false;
    let mut gen_config = false;
    let mut manifest = None;

    for arg in args {
        match arg.to_str().and_then(recognize) {
            Some(Flag::Help) => {
                normalized.push("--help".into());
                return normalized;
            }
            Some(Flag::Version) => {
                normalized.push("--version".into());
                return normalized;
            }
            Some(Flag::Debug) => debug = true,
            Some(Flag::GenConfig) => gen_config = true,
            None => manifest = Some(arg),
        }
    }

    if debug {
        normalized.push("--debug".into());
    }
    if gen_config {
        normalized.push("--gen-config".into());
    }
    if let Some(manifest) = manifest {
        normalized.push("--".into());
        normalized.push(manifest);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let argv = std::iter::once("front-builder")
            .chain(args.iter().copied())
            .map(OsString::from);
        Cli::try_parse_from(normalize_args(argv))
    }

    #[test]
    fn defaults_to_manifest_json() {
        let cli = parse(&[]).unwrap();
        assert!(!cli.debug);
        assert_eq!(cli.manifest_path(), PathBuf::from("manifest.json"));
    }

    #[test]
    fn every_debug_spelling_sets_debug() {
        for flag in ["-d", "--d", "-debug", "--debug"] {
            let cli = parse(&[flag]).unwrap();
            assert!(cli.debug, "{flag} should enable debug");
        }
    }

    #[test]
    fn every_help_spelling_shows_help() {
        for flag in ["-h", "--h", "-help", "--help"] {
            let err = parse(&[flag]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DisplayHelp, "{flag}");
        }
    }

    #[test]
    fn every_version_spelling_shows_version() {
        for flag in ["-v", "--v", "-version", "--version"] {
            let err = parse(&[flag]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DisplayVersion, "{flag}");
        }
    }

    #[test]
    fn help_wins_over_later_arguments() {
        let err = parse(&["--help", "--debug", "app/manifest.json"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn positional_sets_manifest() {
        let cli = parse(&["web/manifest.json", "--debug"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.manifest_path(), PathBuf::from("web/manifest.json"));
    }

    #[test]
    fn last_positional_wins() {
        let cli = parse(&["one/manifest.json", "-d", "two/project.json"]).unwrap();
        assert_eq!(cli.manifest_path(), PathBuf::from("two/project.json"));
    }

    #[test]
    fn repeated_debug_flags_are_accepted() {
        for args in [["-d", "--debug"], ["--d", "-debug"], ["--d", "--d"]] {
            let cli = parse(&args).unwrap();
            assert!(cli.debug, "{args:?}");
        }
    }

    #[test]
    fn unrecognized_dash_tokens_are_manifest_paths() {
        for token in ["-x.json", "-dv", "--bogus", "-debugx"] {
            let cli = parse(&["-d", token]).unwrap();
            assert!(cli.debug);
            assert_eq!(cli.manifest_path(), PathBuf::from(token));
        }
    }

    #[test]
    fn help_after_unknown_token_still_shows_help() {
        let err = parse(&["--bogus", "-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn normalize_emits_canonical_form() {
        let args = normalize_args(
            ["front-builder", "a.json", "-debug", "-d", "-b.json"].map(OsString::from),
        );
        assert_eq!(args, ["front-builder", "--debug", "--", "-b.json"].map(OsString::from));
    }

    #[test]
    fn normalize_stops_at_version() {
        let args = normalize_args(["front-builder", "-d", "-version", "x.json"].map(OsString::from));
        assert_eq!(args, ["front-builder", "--version"].map(OsString::from));
    }

    #[test]
    fn gen_config_flag() {
        assert!(parse(&["--gen-config"]).unwrap().gen_config);
    }
}
