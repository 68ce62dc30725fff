//! # File I/O Module
//!
//! Whole-file byte reads and writes for the per-file pipeline. Handles are
//! scoped to each call and released on every path.

use std::path::Path;

use super::ProcessError;

/// File I/O operations for the processor.
pub struct FileIO;

impl FileIO {
  /// Reads the complete raw contents of a file.
  pub fn read_bytes(path: &Path) -> Result<Vec<u8>, ProcessError> {
    std::fs::read(path).map_err(|source| ProcessError::Read {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Replaces the contents of a file with `bytes`.
  pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), ProcessError> {
    std::fs::write(path, bytes).map_err(|source| ProcessError::Write {
      path: path.to_path_buf(),
      source,
    })
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_bytes_round_trip_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("raw.cpp");
    let bytes = b"\xFF\xFE#\x00\r\x00\n\x00";

    FileIO::write_bytes(&path, bytes).unwrap();
    assert_eq!(FileIO::read_bytes(&path).unwrap(), bytes);
  }

  #[test]
  fn test_missing_file_is_a_read_error() {
    let err = FileIO::read_bytes(Path::new("/nonexistent/view.cpp")).unwrap_err();
    assert!(matches!(err, ProcessError::Read { .. }));
  }
}
