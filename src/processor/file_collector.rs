//! # File Collector Module
//!
//! Expands command-line patterns (files, directories, globs) into a sorted,
//! de-duplicated list of candidate files, and normalizes paths for display.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File collector for pattern expansion and directory traversal.
pub struct FileCollector;

impl FileCollector {
  /// Expands `patterns` into absolute file paths.
  ///
  /// Directories are walked recursively; anything else is tried as a glob.
  /// Symlinks are collected without being followed, so the processor can
  /// report and skip them. The result is sorted and free of duplicates even
  /// when patterns overlap.
  ///
  /// # Errors
  ///
  /// Returns an error if a glob pattern is invalid or the current directory
  /// cannot be determined.
  pub fn collect(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for pattern in patterns {
      let path = PathBuf::from(pattern);
      if path.is_dir() {
        found.extend(Self::traverse_directory(&path));
      } else if std::fs::symlink_metadata(&path).is_ok() {
        found.push(path);
      } else {
        let before = found.len();
        let entries = glob::glob(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?;

        for entry in entries {
          match entry {
            Ok(matched) if matched.is_dir() => found.extend(Self::traverse_directory(&matched)),
            Ok(matched) => found.push(matched),
            Err(e) => warn!("Error with glob pattern {}: {}", pattern, e),
          }
        }

        if found.len() == before {
          warn!("No files matched: {}", pattern);
        }
      }
    }

    let mut files = found
      .iter()
      .map(|path| absolutize_path(path))
      .collect::<Result<Vec<_>>>()?;
    files.sort();
    files.dedup();

    Ok(files)
  }

  /// Recursively lists the files (and symlinks) below `dir`.
  ///
  /// Unreadable entries are logged and skipped.
  pub fn traverse_directory(dir: &Path) -> Vec<PathBuf> {
    debug!("Scanning directory: {}", dir.display());
    let start_time = std::time::Instant::now();

    let files: Vec<PathBuf> = WalkDir::new(dir)
      .follow_links(false)
      .into_iter()
      .filter_map(|entry| {
        entry
          .inspect_err(|e| warn!("Error reading directory entry: {}", e))
          .ok()
      })
      .filter(|entry| !entry.file_type().is_dir())
      .map(walkdir::DirEntry::into_path)
      .collect();

    debug!(
      "Found {} files in {}ms",
      files.len(),
      start_time.elapsed().as_millis()
    );

    files
  }
}

/// Converts a potentially relative path to an absolute path.
///
/// Relative paths are joined onto the current directory with `.` segments
/// dropped, so `./src/a.cpp` and `src/a.cpp` resolve to the same path.
pub fn absolutize_path(path: &Path) -> Result<PathBuf> {
  if path.is_absolute() {
    Ok(path.to_path_buf())
  } else {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    Ok(current_dir.join(path).components().collect())
  }
}

/// Normalizes a path to be relative to `base`, dropping `.` components.
///
/// Absolute paths outside `base` are expressed with `..` segments.
pub fn normalize_relative_path(path: &Path, base: &Path) -> PathBuf {
  if path.is_absolute() {
    if let Ok(stripped) = path.strip_prefix(base) {
      return stripped.to_path_buf();
    }

    if let Some(rel_path) = pathdiff::diff_paths(path, base) {
      return rel_path;
    }
  }

  let normalized: PathBuf = path
    .components()
    .filter(|component| !matches!(component, std::path::Component::CurDir))
    .collect();

  if normalized.as_os_str().is_empty() {
    PathBuf::from(".")
  } else {
    normalized
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_absolutize_path_already_absolute() {
    let path = PathBuf::from("/absolute/path");
    assert_eq!(absolutize_path(&path).unwrap(), path);
  }

  #[test]
  fn test_normalize_relative_path() {
    assert_eq!(
      normalize_relative_path(Path::new("/ws/src/a.cpp"), Path::new("/ws")),
      PathBuf::from("src/a.cpp")
    );
    assert_eq!(
      normalize_relative_path(Path::new("/other/a.cpp"), Path::new("/ws")),
      PathBuf::from("../other/a.cpp")
    );
    assert_eq!(
      normalize_relative_path(Path::new("./src/./a.cpp"), Path::new("/ws")),
      PathBuf::from("src/a.cpp")
    );
    assert_eq!(normalize_relative_path(Path::new("."), Path::new("/ws")), PathBuf::from("."));
  }

  #[test]
  fn test_collect_dedupes_and_sorts() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src/nested")).unwrap();
    fs::write(root.join("src/b.cpp"), "").unwrap();
    fs::write(root.join("src/a.cpp"), "").unwrap();
    fs::write(root.join("src/nested/c.cpp"), "").unwrap();

    let patterns = vec![
      root.join("src").display().to_string(),
      root.join("src/a.cpp").display().to_string(),
      root.join("src/*.cpp").display().to_string(),
    ];
    let files = FileCollector::collect(&patterns).unwrap();

    assert_eq!(
      files,
      vec![root.join("src/a.cpp"), root.join("src/b.cpp"), root.join("src/nested/c.cpp")]
    );
  }

  #[test]
  fn test_collect_invalid_glob_is_an_error() {
    assert!(FileCollector::collect(&["/definitely/missing/[".to_string()]).is_err());
  }

  #[cfg(unix)]
  #[test]
  fn test_traverse_keeps_symlinks_unfollowed() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("real.cpp"), "").unwrap();
    std::os::unix::fs::symlink(root.join("real.cpp"), root.join("link.cpp")).unwrap();

    let mut files = FileCollector::traverse_directory(root);
    files.sort();
    assert_eq!(files, vec![root.join("link.cpp"), root.join("real.cpp")]);
  }
}
