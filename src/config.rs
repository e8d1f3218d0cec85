//! Optimizer tool configuration.
//!
//! The manifest says *what* to build; `front-builder.toml` says *with what*.
//! The file is optional and lives next to the manifest:
//!
//! ```text
//! my-app/
//! ├── manifest.json
//! ├── front-builder.toml   # optional
//! └── js/ css/ ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [tools]
//! java = "java"                     # Launcher for the optimizer jars
//! # tools_dir = "vendor/optimizers" # Defaults to the executable's directory
//! compiler_jar = "compiler.jar"     # Script optimizer (Closure Compiler)
//! compressor_jar = "compressor.jar" # Style optimizer (YUI Compressor)
//! strict = true                     # Nonzero optimizer exit fails the build
//! ```
//!
//! Values are merged on top of stock defaults, so a file only needs the keys
//! it changes. Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the app path.
pub const CONFIG_FILENAME: &str = "front-builder.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level `front-builder.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderConfig {
    /// Where the optimizers live and how their results are judged.
    pub tools: ToolsConfig,
}

/// External optimizer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Program used to launch the jars.
    pub java: String,
    /// Directory holding the jars. Relative values resolve against the app
    /// path; when absent the executable's own directory is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_dir: Option<String>,
    /// Script optimizer jar, relative to `tools_dir` unless absolute.
    pub compiler_jar: String,
    /// Style optimizer jar, relative to `tools_dir` unless absolute.
    pub compressor_jar: String,
    /// Treat a nonzero optimizer exit status as a fatal build error.
    pub strict: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            java: "java".to_string(),
            tools_dir: None,
            compiler_jar: "compiler.jar".to_string(),
            compressor_jar: "compressor.jar".to_string(),
            strict: true,
        }
    }
}

impl BuilderConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tools.java.trim().is_empty() {
            return Err(ConfigError::Validation(
                "tools.java must not be empty".into(),
            ));
        }
        if self.tools.compiler_jar.trim().is_empty() {
            return Err(ConfigError::Validation(
                "tools.compiler_jar must not be empty".into(),
            ));
        }
        if self.tools.compressor_jar.trim().is_empty() {
            return Err(ConfigError::Validation(
                "tools.compressor_jar must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl ToolsConfig {
    /// Directory the jar names resolve against.
    ///
    /// `app_path` anchors a relative `tools_dir`; `exe_dir` is the fallback
    /// when no `tools_dir` is configured.
    pub fn resolve_tools_dir(&self, app_path: &Path, exe_dir: &Path) -> PathBuf {
        match &self.tools_dir {
            Some(dir) => app_path.join(dir),
            None => exe_dir.to_path_buf(),
        }
    }

    /// Full path to the script optimizer jar.
    pub fn compiler_jar_path(&self, tools_dir: &Path) -> PathBuf {
        tools_dir.join(&self.compiler_jar)
    }

    /// Full path to the style optimizer jar.
    pub fn compressor_jar_path(&self, tools_dir: &Path) -> PathBuf {
        tools_dir.join(&self.compressor_jar)
    }
}

/// Directory of the running executable, where the jars ship by default.
///
/// Falls back to the current directory if the executable path is unknown.
pub fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(BuilderConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `front-builder.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<BuilderConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BuilderConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `front-builder.toml` in the given directory.
pub fn load_config(dir: &Path) -> Result<BuilderConfig, ConfigError> {
    resolve_config(load_raw_config(dir)?)
}

/// Returns a fully-commented stock `front-builder.toml`.
///
/// Used by the `--gen-config` flag.
pub fn stock_config_toml() -> &'static str {
    r##"# front-builder configuration
# ===========================
# Place this file next to manifest.json. All settings are optional;
# values shown below are the defaults. Unknown keys cause an error.

[tools]
# Program used to launch the optimizer jars.
java = "java"

# Directory holding the jars. Relative paths resolve against the directory
# containing manifest.json. When omitted, the directory of the front-builder
# executable is used.
# tools_dir = "vendor/optimizers"

# Google Closure Compiler, used for scripts.
compiler_jar = "compiler.jar"

# YUI Compressor, used for stylesheets.
compressor_jar = "compressor.jar"

# When true, an optimizer that exits with a nonzero status fails the build.
# Set to false to log the failure and keep going.
strict = true
"##
}
