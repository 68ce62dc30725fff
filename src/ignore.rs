//! # Ignore Module
//!
//! Decides which files are left alone during a scan. Patterns come from
//! `--ignore` arguments, `.crtdebugignore` files (gitignore syntax) found
//! between the scanned directory and the workspace root, and an optional
//! global ignore file named by `CRTDEBUG_GLOBAL_IGNORE`.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::verbose_log;

/// Name of the per-directory ignore file.
pub const IGNORE_FILENAME: &str = ".crtdebugignore";

/// Environment variable naming a global ignore file.
pub const GLOBAL_IGNORE_ENV_VAR: &str = "CRTDEBUG_GLOBAL_IGNORE";

/// Expands one command-line pattern into the globs that implement it.
///
/// `dir/` and bare names match the entry itself and anything below it,
/// anywhere in the tree. Wildcard patterns additionally match at any depth.
fn expand_cli_pattern(pattern: &str) -> Vec<String> {
  let pattern = pattern.replace('\\', "/");

  if let Some(dir) = pattern.strip_suffix('/') {
    return vec![
      dir.to_string(),
      format!("{dir}/**"),
      format!("**/{dir}"),
      format!("**/{dir}/**"),
    ];
  }

  if !pattern.contains(['*', '?', '[']) {
    return vec![
      pattern.clone(),
      format!("{pattern}/**"),
      format!("**/{pattern}"),
      format!("**/{pattern}/**"),
    ];
  }

  if pattern.starts_with("**/") {
    vec![pattern]
  } else {
    let anywhere = format!("**/{pattern}");
    vec![pattern, anywhere]
  }
}

/// Adds every non-blank, non-comment line of an ignore file to `builder`.
fn add_ignore_file(builder: &mut GitignoreBuilder, base: Option<&Path>, file: &Path) -> Result<()> {
  let content = fs::read_to_string(file).with_context(|| format!("Failed to read ignore file: {}", file.display()))?;

  for line in content.lines() {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
      continue;
    }
    builder
      .add_line(base.map(Path::to_path_buf), line)
      .with_context(|| format!("Invalid pattern '{}' in {}", line, file.display()))?;
  }

  Ok(())
}

/// Matches paths against command-line globs and `.crtdebugignore` rules.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
///
/// use crtdebug::ignore::IgnoreManager;
///
/// # fn main() -> anyhow::Result<()> {
/// let mut manager = IgnoreManager::new(vec!["generated/".to_string()])?;
/// manager.load_ignore_files(Path::new("."), Path::new("."))?;
///
/// assert!(manager.is_ignored(Path::new("generated/resource.cpp")));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct IgnoreManager {
  cli_glob_set: GlobSet,

  /// Matcher built from ignore files, once loaded.
  gitignore: Option<Gitignore>,

  /// Directory the ignore-file patterns are relative to.
  root_dir: Option<PathBuf>,
}

impl IgnoreManager {
  /// Creates a manager from command-line ignore patterns.
  ///
  /// # Errors
  ///
  /// Returns an error if any pattern is not a valid glob.
  pub fn new(cli_patterns: Vec<String>) -> Result<Self> {
    let mut builder = GlobSetBuilder::new();

    for pattern in &cli_patterns {
      for glob in expand_cli_pattern(pattern) {
        builder.add(Glob::new(&glob).with_context(|| format!("Invalid glob pattern: {}", pattern))?);
      }
    }

    let cli_glob_set = builder.build().context("Failed to build glob set")?;

    Ok(Self {
      cli_glob_set,
      gitignore: None,
      root_dir: None,
    })
  }

  /// Loads `.crtdebugignore` files from `dir` up to `workspace_root`, plus
  /// the global ignore file if `CRTDEBUG_GLOBAL_IGNORE` is set.
  ///
  /// Files nearer to `dir` take precedence over those higher up, so a
  /// `!pattern` in a subdirectory can re-include something the root
  /// excluded.
  ///
  /// # Errors
  ///
  /// Returns an error if an ignore file exists but cannot be read or holds an
  /// invalid pattern.
  pub fn load_ignore_files(&mut self, dir: &Path, workspace_root: &Path) -> Result<()> {
    let root_dir = if dir.starts_with(workspace_root) {
      workspace_root
    } else {
      dir
    };
    let mut builder = GitignoreBuilder::new(root_dir);

    if let Ok(global) = env::var(GLOBAL_IGNORE_ENV_VAR) {
      let global = PathBuf::from(global);
      if global.exists() {
        verbose_log!("Loading global ignore file: {}", global.display());
        add_ignore_file(&mut builder, None, &global)?;
      } else {
        verbose_log!("Global ignore file not found: {}", global.display());
      }
    }

    let mut found = Vec::new();
    for ancestor in dir.ancestors() {
      let candidate = ancestor.join(IGNORE_FILENAME);
      if candidate.is_file() {
        found.push((ancestor.to_path_buf(), candidate));
      }
      if ancestor == root_dir {
        break;
      }
    }

    for (base, file) in found.iter().rev() {
      verbose_log!("Loading {} file: {}", IGNORE_FILENAME, file.display());
      add_ignore_file(&mut builder, Some(base), file)?;
    }

    self.gitignore = Some(builder.build().context("Failed to build ignore matcher")?);
    self.root_dir = Some(root_dir.to_path_buf());

    Ok(())
  }

  /// Returns `true` if `path` matches a command-line pattern or an ignore
  /// file rule.
  pub fn is_ignored(&self, path: &Path) -> bool {
    if self.cli_glob_set.is_match(path) {
      verbose_log!("Skipping: {} (matches CLI ignore pattern)", path.display());
      return true;
    }

    let (Some(gitignore), Some(root_dir)) = (&self.gitignore, &self.root_dir) else {
      return false;
    };

    let full = if path.is_absolute() {
      Cow::Borrowed(path)
    } else {
      Cow::Owned(root_dir.join(path))
    };

    match full.strip_prefix(root_dir) {
      Ok(relative) if gitignore.matched_path_or_any_parents(relative, false).is_ignore() => {
        verbose_log!("Skipping: {} (matches {} pattern)", full.display(), IGNORE_FILENAME);
        true
      }
      _ => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_expand_directory_pattern() {
    let globs = expand_cli_pattern("third_party/");
    assert!(globs.contains(&"**/third_party/**".to_string()));
    assert_eq!(globs.len(), 4);
  }

  #[test]
  fn test_expand_wildcard_pattern() {
    assert_eq!(expand_cli_pattern("*.g.cpp"), vec!["*.g.cpp", "**/*.g.cpp"]);
    assert_eq!(expand_cli_pattern("**/gen/*.cpp"), vec!["**/gen/*.cpp"]);
  }

  #[test]
  fn test_backslashes_are_normalized() {
    assert_eq!(expand_cli_pattern(r"vendor\*.cpp"), vec!["vendor/*.cpp", "**/vendor/*.cpp"]);
  }

  #[test]
  fn test_cli_patterns_match() {
    let manager = IgnoreManager::new(vec!["generated".to_string(), "*_moc.cpp".to_string()]).unwrap();

    assert!(manager.is_ignored(Path::new("generated/a.cpp")));
    assert!(manager.is_ignored(Path::new("src/generated/a.cpp")));
    assert!(manager.is_ignored(Path::new("src/view_moc.cpp")));
    assert!(!manager.is_ignored(Path::new("src/view.cpp")));
  }

  #[test]
  fn test_invalid_cli_pattern_is_an_error() {
    assert!(IgnoreManager::new(vec!["[".to_string()]).is_err());
  }

  #[test]
  fn test_ignore_file_with_negation() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let sub = root.join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(root.join(IGNORE_FILENAME), "*.cpp\n# comment\n\n").unwrap();
    fs::write(sub.join(IGNORE_FILENAME), "!keep.cpp\n").unwrap();

    let mut manager = IgnoreManager::new(Vec::new()).unwrap();
    manager.load_ignore_files(&sub, root).unwrap();

    assert!(manager.is_ignored(&root.join("top.cpp")));
    assert!(manager.is_ignored(&sub.join("other.cpp")));
    assert!(!manager.is_ignored(&sub.join("keep.cpp")));
    assert!(!manager.is_ignored(&sub.join("keep.h")));
  }
}
