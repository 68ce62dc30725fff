//! # Workspace Module
//!
//! Picks the directory crtdebug treats as the workspace root. Config
//! discovery, `.crtdebugignore` lookup and filter matching are all relative
//! to it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Resolve the workspace root for a run.
///
/// The root is the first pattern naming an existing directory, or the parent
/// of the first pattern naming an existing file. Globs and missing paths are
/// passed over; if nothing matches, the current directory is used.
pub fn resolve_workspace(patterns: &[String]) -> Result<PathBuf> {
  let current_dir = std::env::current_dir().context("Failed to get current directory")?;
  Ok(resolve_workspace_from_patterns(patterns, &current_dir).unwrap_or(current_dir))
}

fn resolve_workspace_from_patterns(patterns: &[String], current_dir: &Path) -> Option<PathBuf> {
  patterns.iter().find_map(|pattern| {
    let candidate = PathBuf::from(pattern);

    if candidate.is_dir() {
      return Some(abs_path_or_current(&candidate, current_dir));
    }

    if candidate.is_file() {
      let parent = candidate.parent().filter(|p| !p.as_os_str().is_empty());
      return Some(parent.map_or_else(|| current_dir.to_path_buf(), |p| abs_path_or_current(p, current_dir)));
    }

    None
  })
}

fn abs_path_or_current(path: &Path, current_dir: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    current_dir.join(path).components().collect()
  }
}
