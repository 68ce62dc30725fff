//! # Processor Module
//!
//! Drives the per-file pipeline over a batch of files:
//! detect encoding → read and decode → ensure the marker → re-encode and
//! write back with the same encoding.
//!
//! The module is organized into submodules:
//! - [`file_io`] - Whole-file byte reads and writes
//! - [`file_collector`] - Pattern expansion, directory traversal and path normalization
//!
//! Files are handled one after another on the calling thread. Every failure
//! is scoped to its file: it is recorded in the report and the batch moves
//! on.

mod file_collector;
mod file_io;

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
pub use file_collector::{FileCollector, absolutize_path, normalize_relative_path};
pub use file_io::FileIO;
use tracing::{debug, trace, warn};

use crate::diff::DiffManager;
use crate::encoding::{CodecError, EncodingDetector, HeuristicDetector, TextEncoding};
use crate::file_filter::{CompositeFilter, ExtensionFilter, FileFilter, IgnoreFilter, create_default_filter};
use crate::inserter::{InsertError, MacroInserter};
use crate::report::{FileAction, FileReport};
use crate::verbose_log;

/// Errors that stop a single file from being processed.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
  #[error("failed to read '{path}': {source}")]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to write '{path}': {source}")]
  Write { path: PathBuf, source: std::io::Error },

  #[error("cannot decode as {encoding}: {source}")]
  Decode { encoding: TextEncoding, source: CodecError },

  #[error("cannot encode as {encoding}: {source}")]
  Encode { encoding: TextEncoding, source: CodecError },

  #[error(transparent)]
  Insert(#[from] InsertError),
}

/// Whether a file carried the marker and what was done about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStatus {
  /// The marker was already there; the file was not touched
  Present,
  /// The block was inserted and the file rewritten
  Inserted,
  /// The block is missing; nothing was written (dry run)
  Missing,
}

/// Result of [`Processor::ensure_has_marker`] for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOutcome {
  pub encoding: TextEncoding,
  pub status: MarkerStatus,
}

/// Configuration for creating a Processor instance.
pub struct ProcessorConfig {
  pub inserter: MacroInserter,
  pub workspace_root: PathBuf,

  /// Report missing blocks without writing anything
  pub check_only: bool,

  // Filtering
  pub ignore_patterns: Vec<String>,
  pub exclude_paths: Vec<String>,
  pub extension_filter: ExtensionFilter,

  // Optional components
  pub diff_manager: Option<DiffManager>,
  pub detector: Option<Box<dyn EncodingDetector>>,
}

impl ProcessorConfig {
  /// Creates a new ProcessorConfig with required fields and sensible defaults.
  ///
  /// Use struct update syntax to override specific fields:
  /// ```ignore
  /// ProcessorConfig {
  ///     check_only: true,
  ///     ..ProcessorConfig::new(inserter, workspace_root)
  /// }
  /// ```
  pub fn new(inserter: MacroInserter, workspace_root: PathBuf) -> Self {
    Self {
      inserter,
      workspace_root,
      check_only: false,
      ignore_patterns: Vec::new(),
      exclude_paths: Vec::new(),
      extension_filter: ExtensionFilter::default(),
      diff_manager: None,
      detector: None,
    }
  }
}

/// Processor for ensuring files carry the debug-allocation macro block.
///
/// The `Processor` is responsible for:
/// - Expanding patterns into a sorted list of files
/// - Filtering out symlinks, ignored files, excluded paths and extensions
/// - Running the per-file pipeline in modify or dry-run mode
/// - Showing diffs of pending insertions
/// - Collecting report data about processed files
pub struct Processor {
  workspace_root: PathBuf,

  inserter: MacroInserter,

  /// CLI ignore globs, path fragments and extension rules
  file_filter: CompositeFilter,

  /// Template for per-directory `.crtdebugignore` matchers
  ignore_filter: IgnoreFilter,

  check_only: bool,

  diff_manager: DiffManager,

  detector: Box<dyn EncodingDetector>,

  /// Reports for every file seen by the last [`Processor::process`] call
  file_reports: Vec<FileReport>,
}

impl Processor {
  /// Creates a new processor with the specified configuration.
  ///
  /// # Errors
  ///
  /// Returns an error if any of the ignore patterns are invalid.
  pub fn new(config: ProcessorConfig) -> Result<Self> {
    let file_filter = create_default_filter(config.ignore_patterns, config.exclude_paths, config.extension_filter)?;
    let ignore_filter = IgnoreFilter::from_patterns(Vec::new())?;

    Ok(Self {
      workspace_root: config.workspace_root,
      inserter: config.inserter,
      file_filter,
      ignore_filter,
      check_only: config.check_only,
      diff_manager: config.diff_manager.unwrap_or_else(|| DiffManager::new(false, None)),
      detector: config.detector.unwrap_or_else(|| Box::new(HeuristicDetector::new())),
      file_reports: Vec::new(),
    })
  }

  /// Reports collected by the last [`Processor::process`] call.
  pub fn file_reports(&self) -> &[FileReport] {
    &self.file_reports
  }

  /// Takes ownership of the collected reports, leaving none behind.
  pub fn take_file_reports(&mut self) -> Vec<FileReport> {
    std::mem::take(&mut self.file_reports)
  }

  /// Processes a list of file, directory or glob patterns.
  ///
  /// # Returns
  ///
  /// `true` if the run found a problem: any file failed, or, in check-only
  /// mode, any file is missing the block.
  ///
  /// # Errors
  ///
  /// Returns an error if pattern expansion or ignore-file loading fails.
  /// Per-file failures never surface here; they land in the reports.
  pub fn process(&mut self, patterns: &[String]) -> Result<bool> {
    let files = FileCollector::collect(patterns)?;
    self.process_files(files)
  }

  /// Processes already-collected files in the given order.
  pub fn process_files(&mut self, files: Vec<PathBuf>) -> Result<bool> {
    self.file_reports = Vec::with_capacity(files.len());

    if files.is_empty() {
      debug!("No files to process");
      return Ok(false);
    }

    let process_start = std::time::Instant::now();
    let mut ignore_filters: HashMap<PathBuf, IgnoreFilter> = HashMap::new();
    let mut has_issues = false;

    for path in files {
      if let Some(reason) = self.skip_reason(&path, &mut ignore_filters)? {
        trace!("Skipping: {} ({})", path.display(), reason);
        let display = self.display_path(&path);
        self.file_reports.push(FileReport::skipped(display, reason));
        continue;
      }

      let report = self.process_single_file(&path);
      if matches!(report.action, FileAction::Failed | FileAction::Missing) {
        has_issues = true;
      }
      self.file_reports.push(report);
    }

    debug!(
      "Processed {} files in {}ms",
      self.file_reports.len(),
      process_start.elapsed().as_millis()
    );

    Ok(has_issues)
  }

  /// Returns why `path` should be skipped, or `None` to process it.
  fn skip_reason(&self, path: &Path, ignore_filters: &mut HashMap<PathBuf, IgnoreFilter>) -> Result<Option<String>> {
    match std::fs::symlink_metadata(path) {
      Ok(metadata) if metadata.file_type().is_symlink() => return Ok(Some("Symlink".to_string())),
      Ok(_) => {}
      Err(e) => return Ok(Some(format!("Cannot stat file: {}", e))),
    }

    let relative = normalize_relative_path(path, &self.workspace_root);
    let result = self.file_filter.should_process(&relative)?;
    if !result.should_process {
      return Ok(result.reason.or_else(|| Some("Filtered".to_string())));
    }

    if let Some(parent) = path.parent() {
      if !ignore_filters.contains_key(parent) {
        let filter = self.ignore_filter.with_ignore_files(parent, &self.workspace_root)?;
        ignore_filters.insert(parent.to_path_buf(), filter);
      }

      if let Some(filter) = ignore_filters.get(parent) {
        let result = filter.should_process(path)?;
        if !result.should_process {
          return Ok(result.reason.or_else(|| Some("Filtered".to_string())));
        }
      }
    }

    Ok(None)
  }

  /// Runs the pipeline on one file and turns the outcome into a report.
  fn process_single_file(&self, path: &Path) -> FileReport {
    let encoding = self.detector.detect(path);
    verbose_log!("Detected {} for {}", encoding, path.display());

    let display = self.display_path(path);
    match self.ensure_has_marker_as(path, encoding) {
      Ok(status) => FileReport {
        path: display,
        encoding: Some(encoding),
        has_marker: status == MarkerStatus::Present,
        action: match status {
          MarkerStatus::Present => FileAction::NoActionNeeded,
          MarkerStatus::Inserted => FileAction::Inserted,
          MarkerStatus::Missing => FileAction::Missing,
        },
        reason: None,
      },
      Err(e) => {
        debug!("{}: {}", path.display(), e);
        FileReport::failed(display, Some(encoding), e.to_string())
      }
    }
  }

  /// Ensures the file at `path` carries the marker.
  ///
  /// Detects the encoding, decodes the whole file with it, and if the marker
  /// is missing inserts the block and writes the file back in the same
  /// encoding. In check-only mode nothing is written and the pending change
  /// is only shown as a diff.
  ///
  /// # Errors
  ///
  /// Fails without touching the file if it cannot be read, is not valid in
  /// the detected encoding, has no anchor line, or the new text cannot be
  /// represented in the detected encoding.
  pub fn ensure_has_marker(&self, path: &Path) -> Result<FileOutcome, ProcessError> {
    let encoding = self.detector.detect(path);
    let status = self.ensure_has_marker_as(path, encoding)?;
    Ok(FileOutcome { encoding, status })
  }

  fn ensure_has_marker_as(&self, path: &Path, encoding: TextEncoding) -> Result<MarkerStatus, ProcessError> {
    let Some(pending) = plan_insertion(path, encoding, &self.inserter)? else {
      trace!("{}: marker already present", path.display());
      return Ok(MarkerStatus::Present);
    };

    if self.check_only {
      let display = self.display_path(path);
      if let Err(e) = self.diff_manager.display_diff(&display, &pending.original, &pending.updated) {
        warn!("Failed to render diff for {}: {:#}", path.display(), e);
      }
      return Ok(MarkerStatus::Missing);
    }

    pending.write(path)?;
    Ok(MarkerStatus::Inserted)
  }

  /// Path shown to the user: relative to the current directory when possible.
  fn display_path(&self, path: &Path) -> PathBuf {
    let base = std::env::current_dir().unwrap_or_else(|_| self.workspace_root.clone());
    normalize_relative_path(path, &base)
  }
}

/// A computed but not yet written insertion.
struct PendingInsertion {
  original: String,
  updated: String,
  encoded: Vec<u8>,
}

impl PendingInsertion {
  fn write(&self, path: &Path) -> Result<(), ProcessError> {
    FileIO::write_bytes(path, &self.encoded)?;
    debug!("{}: inserted block ({} bytes written)", path.display(), self.encoded.len());
    Ok(())
  }
}

/// Reads `path` as `encoding` and computes the insertion, if one is needed.
///
/// Returns `None` when the marker is already present. The new text is
/// encoded up front so an unrepresentable character fails before anything
/// is written.
fn plan_insertion(
  path: &Path,
  encoding: TextEncoding,
  inserter: &MacroInserter,
) -> Result<Option<PendingInsertion>, ProcessError> {
  let bytes = FileIO::read_bytes(path)?;
  let original = encoding
    .decode(&bytes)
    .map_err(|source| ProcessError::Decode { encoding, source })?;

  let updated = match inserter.ensure_marker(&original)? {
    Cow::Borrowed(_) => return Ok(None),
    Cow::Owned(updated) => updated,
  };

  let encoded = encoding
    .encode(&updated)
    .map_err(|source| ProcessError::Encode { encoding, source })?;

  Ok(Some(PendingInsertion {
    original,
    updated,
    encoded,
  }))
}

/// Ensures the file at `path` carries the default `DEBUG_NEW` block,
/// rewriting it in place if needed.
///
/// Uses the heuristic detector and the default marker, anchor and block.
pub fn ensure_has_marker(path: &Path) -> Result<FileOutcome, ProcessError> {
  let encoding = HeuristicDetector::new().detect(path);

  let status = match plan_insertion(path, encoding, &MacroInserter::default())? {
    Some(pending) => {
      pending.write(path)?;
      MarkerStatus::Inserted
    }
    None => MarkerStatus::Present,
  };

  Ok(FileOutcome { encoding, status })
}
