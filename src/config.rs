//! # Configuration Module
//!
//! This module provides configuration support for crtdebug, allowing users to
//! customize the marker, the anchor and the inserted block, the legacy code
//! page used as the last-resort encoding guess, and which files are scanned.
//!
//! Configuration can be specified in a `.crtdebug.toml` file or via the
//! `CRTDEBUG_CONFIG` environment variable.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::inserter::{DEFAULT_ANCHOR, DEFAULT_BLOCK, DEFAULT_MARKER, MacroInserter};
use crate::verbose_log;

/// The default config file name.
pub const DEFAULT_CONFIG_FILENAME: &str = ".crtdebug.toml";

/// Environment variable for specifying config file path.
pub const CONFIG_ENV_VAR: &str = "CRTDEBUG_CONFIG";

fn default_marker() -> String {
  DEFAULT_MARKER.to_string()
}

fn default_anchor() -> String {
  DEFAULT_ANCHOR.to_string()
}

fn default_block() -> Vec<String> {
  DEFAULT_BLOCK.iter().map(|line| (*line).to_string()).collect()
}

fn default_legacy_codepage() -> String {
  crate::encoding::DEFAULT_LEGACY_CODEPAGE.to_string()
}

fn default_include() -> Vec<String> {
  vec!["cpp".to_string()]
}

fn default_path_excludes() -> Vec<String> {
  ["CommonCpp", "stdafx", "/tests/", "/setup/", "interop"]
    .iter()
    .map(|fragment| (*fragment).to_string())
    .collect()
}

/// Configuration for extension-based file filtering.
///
/// Only files whose extension is in `include` are processed; an empty
/// `include` list admits every extension. `exclude` always wins.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ExtensionConfig {
  #[serde(default = "default_include")]
  pub include: Vec<String>,

  #[serde(default)]
  pub exclude: Vec<String>,
}

impl Default for ExtensionConfig {
  fn default() -> Self {
    Self {
      include: default_include(),
      exclude: Vec::new(),
    }
  }
}

/// Path substrings that exclude a file, matched case-insensitively against
/// the `/`-separated path.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PathsConfig {
  #[serde(default = "default_path_excludes")]
  pub exclude: Vec<String>,
}

impl Default for PathsConfig {
  fn default() -> Self {
    Self {
      exclude: default_path_excludes(),
    }
  }
}

/// Main configuration struct for crtdebug.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
  /// Sentinel whose presence means a file is already done.
  #[serde(default = "default_marker")]
  pub marker: String,

  /// Substring identifying the line the block goes after.
  #[serde(default = "default_anchor")]
  pub anchor: String,

  /// Lines of the inserted block.
  #[serde(default = "default_block")]
  pub block: Vec<String>,

  /// `encoding_rs` label of the last-resort single-byte code page.
  #[serde(default = "default_legacy_codepage")]
  pub legacy_codepage: String,

  #[serde(default)]
  pub extensions: ExtensionConfig,

  #[serde(default)]
  pub paths: PathsConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      marker: default_marker(),
      anchor: default_anchor(),
      block: default_block(),
      legacy_codepage: default_legacy_codepage(),
      extensions: ExtensionConfig::default(),
      paths: PathsConfig::default(),
    }
  }
}

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("Failed to read config file '{path}': {source}")]
  ReadError { path: PathBuf, source: std::io::Error },

  /// The config file contains invalid TOML.
  #[error("Failed to parse config file '{path}': {source}")]
  ParseError { path: PathBuf, source: toml::de::Error },

  /// A configuration value is invalid.
  #[error("Invalid value for '{key}': {message}")]
  InvalidValue { key: String, message: String },
}

impl ConfigError {
  fn invalid(key: &str, message: impl Into<String>) -> Self {
    Self::InvalidValue {
      key: key.to_string(),
      message: message.into(),
    }
  }
}

impl Config {
  /// Load configuration from a file.
  ///
  /// # Arguments
  ///
  /// * `path` - Path to the configuration file
  ///
  /// # Returns
  ///
  /// The loaded configuration, or an error if the file cannot be read,
  /// parsed or validated.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    verbose_log!("Loading config from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
      path: path.to_path_buf(),
      source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
      path: path.to_path_buf(),
      source: e,
    })?;

    config.validate()?;

    Ok(config.normalize())
  }

  /// Validate the configuration.
  ///
  /// Checks that:
  /// - `marker` and `anchor` are non-empty
  /// - `block` is non-empty and contains the marker, so a second run
  ///   recognizes its own insertion
  /// - `legacy-codepage` names a single-byte encoding
  /// - Extension entries don't include the leading dot
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.marker.is_empty() {
      return Err(ConfigError::invalid("marker", "marker cannot be empty"));
    }

    if self.anchor.is_empty() {
      return Err(ConfigError::invalid("anchor", "anchor cannot be empty"));
    }

    if self.block.is_empty() {
      return Err(ConfigError::invalid("block", "block must have at least one line"));
    }

    if self.block.iter().any(|line| line.contains('\n')) {
      return Err(ConfigError::invalid("block", "block lines cannot contain newlines"));
    }

    if !self.block.iter().any(|line| line.contains(&self.marker)) {
      return Err(ConfigError::invalid(
        "block",
        format!("block must contain the marker '{}'", self.marker),
      ));
    }

    let codepage = encoding_rs::Encoding::for_label(self.legacy_codepage.as_bytes());
    if !codepage.is_some_and(|enc| enc.is_single_byte()) {
      return Err(ConfigError::invalid(
        "legacy-codepage",
        format!("'{}' is not a single-byte encoding", self.legacy_codepage),
      ));
    }

    for ext in self.extensions.include.iter().chain(&self.extensions.exclude) {
      if ext.starts_with('.') {
        return Err(ConfigError::invalid(
          "extensions",
          format!("extension '{}' should not include leading dot", ext),
        ));
      }
    }

    Ok(())
  }

  /// Normalize extensions to lowercase for case-insensitive matching.
  fn normalize(mut self) -> Self {
    self.extensions.include = self.extensions.include.iter().map(|e| e.to_lowercase()).collect();
    self.extensions.exclude = self.extensions.exclude.iter().map(|e| e.to_lowercase()).collect();
    self
  }

  /// Builds the inserter described by this configuration.
  pub fn inserter(&self) -> MacroInserter {
    MacroInserter::new(self.marker.clone(), self.anchor.clone(), self.block.clone())
  }
}

/// Discover the configuration file path.
///
/// The configuration file is discovered in the following order:
/// 1. Path specified via `--config` flag (passed as `explicit_path`)
/// 2. Path specified via `CRTDEBUG_CONFIG` environment variable
/// 3. `.crtdebug.toml` in the workspace root
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path from CLI flag
/// * `workspace_root` - The workspace root directory
///
/// # Returns
///
/// The path to the configuration file, or `None` if no config file is found.
pub fn discover_config_path(explicit_path: Option<&Path>, workspace_root: &Path) -> Option<PathBuf> {
  if let Some(path) = explicit_path {
    if path.exists() {
      verbose_log!("Using explicit config path: {}", path.display());
      return Some(path.to_path_buf());
    }
    verbose_log!("Explicit config path does not exist: {}", path.display());
    return None;
  }

  if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
    let path = PathBuf::from(&env_path);
    if path.exists() {
      verbose_log!("Using config from {}: {}", CONFIG_ENV_VAR, path.display());
      return Some(path);
    }
    verbose_log!("{} path does not exist: {}", CONFIG_ENV_VAR, env_path);
  }

  let workspace_config = workspace_root.join(DEFAULT_CONFIG_FILENAME);
  if workspace_config.exists() {
    verbose_log!("Using workspace config: {}", workspace_config.display());
    return Some(workspace_config);
  }

  verbose_log!("No config file found");
  None
}

/// Load configuration from the discovered path, or return the defaults.
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path from CLI flag
/// * `workspace_root` - The workspace root directory
/// * `no_config` - If true, skip config file discovery and use defaults
pub fn load_config(explicit_path: Option<&Path>, workspace_root: &Path, no_config: bool) -> Result<Config> {
  if no_config {
    verbose_log!("Config file discovery disabled (--no-config)");
    return Ok(Config::default());
  }

  match discover_config_path(explicit_path, workspace_root) {
    Some(path) => Config::load(&path).with_context(|| format!("Failed to load config from {}", path.display())),
    None => Ok(Config::default()),
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_parse_valid_config() {
    let config_content = concat!(
      "marker = \"TRACE_NEW\"\n",
      "anchor = \"#import\"\n",
      "block = [\"\", \"#define new TRACE_NEW\"]\n",
      "legacy-codepage = \"iso-8859-15\"\n",
      "\n",
      "[extensions]\n",
      "include = [\"cpp\", \"cxx\"]\n",
      "\n",
      "[paths]\n",
      "exclude = [\"interop\", \"/tests/\"]\n",
    );

    let config: Config = toml::from_str(config_content).expect("valid config should parse");
    config.validate().expect("valid config should validate");

    assert_eq!(config.marker, "TRACE_NEW");
    assert_eq!(config.anchor, "#import");
    assert_eq!(config.block, vec!["", "#define new TRACE_NEW"]);
    assert_eq!(config.legacy_codepage, "iso-8859-15");
    assert_eq!(config.extensions.include, vec!["cpp", "cxx"]);
    assert_eq!(config.paths.exclude, vec!["interop", "/tests/"]);
  }

  #[test]
  fn test_parse_empty_config_uses_defaults() {
    let config: Config = toml::from_str("").expect("empty config should parse");
    assert_eq!(config, Config::default());
    assert_eq!(config.marker, "DEBUG_NEW");
    assert_eq!(config.block.len(), 4);
    assert_eq!(config.extensions.include, vec!["cpp"]);
    assert_eq!(config.paths.exclude, vec!["CommonCpp", "stdafx", "/tests/", "/setup/", "interop"]);
  }

  #[test]
  fn test_unknown_keys_are_rejected() {
    let result: Result<Config, _> = toml::from_str("markr = \"X\"\n");
    assert!(result.is_err());
  }

  #[test]
  fn test_validate_block_must_contain_marker() {
    let config = Config {
      block: vec!["#define new MY_NEW".to_string()],
      ..Config::default()
    };

    let err = config.validate().expect_err("should fail");
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "block"));
  }

  #[test]
  fn test_validate_empty_marker() {
    let config = Config {
      marker: String::new(),
      ..Config::default()
    };
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_validate_multi_byte_codepage() {
    let config = Config {
      legacy_codepage: "gbk".to_string(),
      ..Config::default()
    };
    let err = config.validate().expect_err("should fail");
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "legacy-codepage"));
  }

  #[test]
  fn test_validate_extension_leading_dot() {
    let config = Config {
      extensions: ExtensionConfig {
        include: vec![".cpp".to_string()],
        exclude: Vec::new(),
      },
      ..Config::default()
    };
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_load_config_from_file_normalizes_extensions() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILENAME);
    std::fs::write(&config_path, "[extensions]\ninclude = [\"CPP\", \"Cxx\"]\n").expect("write config");

    let config = Config::load(&config_path).expect("load should succeed");
    assert_eq!(config.extensions.include, vec!["cpp", "cxx"]);
  }

  #[test]
  fn test_load_config_file_not_found() {
    let result = Config::load(Path::new("/nonexistent/path/.crtdebug.toml"));
    assert!(matches!(
      result.expect_err("should fail"),
      ConfigError::ReadError { .. }
    ));
  }

  #[test]
  fn test_discover_config_explicit_path() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let config_path = temp_dir.path().join("custom-config.toml");
    std::fs::write(&config_path, "").expect("write config");

    let result = discover_config_path(Some(&config_path), temp_dir.path());
    assert_eq!(result, Some(config_path));
  }

  #[test]
  fn test_discover_config_workspace_root() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILENAME);
    std::fs::write(&config_path, "").expect("write config");

    let result = discover_config_path(None, temp_dir.path());
    assert_eq!(result, Some(config_path));
  }

  #[test]
  fn test_load_config_disabled_returns_defaults() {
    let temp_dir = TempDir::new().expect("create temp dir");
    std::fs::write(temp_dir.path().join(DEFAULT_CONFIG_FILENAME), "marker = \"X\"\nblock = [\"X\"]\n")
      .expect("write config");

    let config = load_config(None, temp_dir.path(), true).expect("load should succeed");
    assert_eq!(config, Config::default());
  }

  #[test]
  fn test_inserter_from_config() {
    let inserter = Config::default().inserter();
    assert_eq!(inserter, MacroInserter::default());
  }
}
