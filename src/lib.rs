//! # front-builder
//!
//! Manifest-driven release builds for front-end projects: concatenate
//! scripts and stylesheets in a declared order, run them through external
//! optimizers, and assemble a release folder next to the copied resources.
//!
//! # Pipeline
//!
//! ```text
//! manifest.json ─→ load + validate ─→ chdir(app path)
//!                                        │
//!        ┌───────────────────────────────┘
//!        ▼
//!   1. Stage      dist/ created or emptied
//!   2. Resources  files/dirs mirrored into dist/
//!   3. Scripts    files[]  → concat → Closure Compiler → dist/<jsPath>
//!   4. Styles     styles[] → concat → YUI Compressor  → dist/<cssPath>
//! ```
//!
//! Every stage is fatal on error; nothing is rolled back. `--debug` skips
//! both optimizers and writes the raw concatenations instead.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`manifest`] | JSON manifest loading with upfront validation of every required field |
//! | [`config`] | Optional `front-builder.toml`: optimizer locations and exit-status policy |
//! | [`release`] | Release folder reset and resource mirroring |
//! | [`bundle`] | Shared concatenate → optimize → write routine for both artifact kinds |
//! | [`optimizer`] | External optimizer command lines and the process backend |
//! | [`pipeline`] | Build session, stage ordering, build events |
//! | [`output`] | CLI output formatting of build events |
//! | [`cli`] | Argument parsing, including legacy flag spellings |
//!
//! # Design Decisions
//!
//! ## Validate Everything Upfront
//!
//! A manifest missing `build.cssPath` should not fail after the script
//! optimizer has already run for a minute. [`manifest::load_manifest`] checks
//! every required key and reports all missing ones in one error before the
//! release folder is touched.
//!
//! ## Optimizer Exit Status
//!
//! Optimizer failures are fatal by default. Projects that depend on the
//! historical "echo and carry on" behavior can set `tools.strict = false`.
//! Failing to start the optimizer at all is always fatal.
//!
//! ## One Working-Directory Change
//!
//! The process switches into the app path exactly once, right after the
//! manifest loads, so optimizer command lines in the log use short relative
//! paths that can be re-run by hand from the project directory.

pub mod bundle;
pub mod cli;
pub mod config;
pub mod manifest;
pub mod optimizer;
pub mod output;
pub mod pipeline;
pub mod release;

#[cfg(test)]
pub(crate) mod test_helpers;
