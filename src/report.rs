//! # Report Module
//!
//! Machine-readable reports of a run, in JSON or CSV.
//!
//! Each processed file becomes a [`FileReport`] recording its detected
//! encoding, whether it already carried the marker and what was done to it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use crate::encoding::TextEncoding;

/// Information about a processed file for reporting
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
  /// Path to the file
  #[serde(serialize_with = "serialize_path")]
  pub path: PathBuf,
  /// Encoding detected for the file, if detection ran
  #[serde(serialize_with = "serialize_encoding")]
  pub encoding: Option<TextEncoding>,
  /// Whether the file already contained the marker
  pub has_marker: bool,
  /// What happened to the file
  pub action: FileAction,
  /// Ignore reason or failure message
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason: Option<String>,
}

impl FileReport {
  /// Report for a file the filters rejected before it was opened.
  pub fn skipped(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      encoding: None,
      has_marker: false,
      action: FileAction::Skipped,
      reason: Some(reason.into()),
    }
  }

  /// Report for a file that could not be processed.
  pub fn failed(path: impl Into<PathBuf>, encoding: Option<TextEncoding>, reason: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      encoding,
      has_marker: false,
      action: FileAction::Failed,
      reason: Some(reason.into()),
    }
  }

  pub fn is_ignored(&self) -> bool {
    self.action == FileAction::Skipped
  }
}

fn serialize_path<S: serde::Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(&path.to_string_lossy())
}

fn serialize_encoding<S: serde::Serializer>(
  encoding: &Option<TextEncoding>,
  serializer: S,
) -> Result<S::Ok, S::Error> {
  match encoding {
    Some(enc) => serializer.collect_str(enc),
    None => serializer.serialize_none(),
  }
}

/// Possible outcomes for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
  /// The block was inserted and the file rewritten
  Inserted,
  /// The block is missing (dry run; nothing written)
  Missing,
  /// The file already carried the marker
  #[serde(rename = "none")]
  NoActionNeeded,
  /// The file was filtered out
  Skipped,
  /// The file could not be decoded, had no anchor line, or failed I/O
  Failed,
}

impl FileAction {
  /// Human-readable label, as written to CSV reports.
  pub const fn label(self) -> &'static str {
    match self {
      FileAction::Inserted => "Inserted",
      FileAction::Missing => "Missing",
      FileAction::NoActionNeeded => "None",
      FileAction::Skipped => "Ignored",
      FileAction::Failed => "Failed",
    }
  }
}

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
  /// JSON format for machine readability
  Json,
  /// CSV format for spreadsheet compatibility
  Csv,
}

impl std::fmt::Display for ReportFormat {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ReportFormat::Json => write!(f, "JSON"),
      ReportFormat::Csv => write!(f, "CSV"),
    }
  }
}

/// Error returned when parsing a string into a ReportFormat fails
#[derive(Debug, thiserror::Error)]
#[error("Invalid report format: {0}")]
pub struct ParseReportFormatError(pub String);

impl std::str::FromStr for ReportFormat {
  type Err = ParseReportFormatError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "json" => Ok(ReportFormat::Json),
      "csv" => Ok(ReportFormat::Csv),
      _ => Err(ParseReportFormatError(s.to_string())),
    }
  }
}

/// Writes a report of a run to disk.
pub struct ReportGenerator<'a> {
  format: ReportFormat,
  output_path: &'a Path,
}

impl<'a> ReportGenerator<'a> {
  pub const fn new(format: ReportFormat, output_path: &'a Path) -> Self {
    Self { format, output_path }
  }

  /// Renders `files` and `summary` in this generator's format and writes the
  /// result to the output path.
  pub fn generate(&self, files: &[FileReport], summary: &ProcessingSummary) -> Result<()> {
    let content = self.render(files, summary)?;

    fs::write(self.output_path, content)
      .with_context(|| format!("Failed to write report to {}", self.output_path.display()))
  }

  /// Renders the report without writing it.
  pub fn render(&self, files: &[FileReport], summary: &ProcessingSummary) -> Result<String> {
    match self.format {
      ReportFormat::Json => render_json(files, summary),
      ReportFormat::Csv => Ok(render_csv(files, summary)),
    }
  }
}

fn render_json(files: &[FileReport], summary: &ProcessingSummary) -> Result<String> {
  let report = serde_json::json!({
    "summary": summary,
    "files": files,
  });

  serde_json::to_string_pretty(&report).context("Failed to serialize JSON report")
}

/// Quotes a CSV field when it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
  if value.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", value.replace('"', "\"\""))
  } else {
    value.to_string()
  }
}

fn render_csv(files: &[FileReport], summary: &ProcessingSummary) -> String {
  let mut csv = String::from("file_path,encoding,has_marker,action,notes\n");

  for file in files {
    let encoding = file.encoding.map(|e| e.to_string()).unwrap_or_default();
    csv.push_str(&format!(
      "{},{},{},{},{}\n",
      csv_field(&file.path.to_string_lossy()),
      csv_field(&encoding),
      file.has_marker,
      file.action.label(),
      csv_field(file.reason.as_deref().unwrap_or_default()),
    ));
  }

  csv.push_str("\n# Summary\n");
  csv.push_str(&format!("Total files,{}\n", summary.total_files));
  csv.push_str(&format!("Files with marker,{}\n", summary.files_with_marker));
  csv.push_str(&format!("Files missing marker,{}\n", summary.files_missing_marker));
  csv.push_str(&format!("Blocks inserted,{}\n", summary.blocks_inserted));
  csv.push_str(&format!("Files failed,{}\n", summary.files_failed));
  csv.push_str(&format!("Files ignored,{}\n", summary.files_ignored));
  csv.push_str(&format!("Processing time (seconds),{:.2}\n", summary.processing_time_secs));
  csv.push_str(&format!("Generated on,{}\n", Local::now().format("%Y-%m-%d %H:%M:%S")));

  csv
}

/// Summary of the processing results
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingSummary {
  /// Total number of files seen, ignored ones included
  pub total_files: usize,
  /// Files that already carried the marker
  pub files_with_marker: usize,
  /// Files without the marker, whether or not the block was inserted
  pub files_missing_marker: usize,
  /// Files rewritten with the block
  pub blocks_inserted: usize,
  /// Files that failed to process
  pub files_failed: usize,
  /// Files the filters rejected
  pub files_ignored: usize,
  #[serde(skip_serializing)]
  pub processing_time: Duration,
  #[serde(rename = "processing_time_seconds")]
  pub processing_time_secs: f64,
  /// Unix timestamp when the summary was built
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timestamp: Option<i64>,
}

impl ProcessingSummary {
  /// Create a new ProcessingSummary initialized to zero
  pub fn new(processing_time: Duration) -> Self {
    Self {
      total_files: 0,
      files_with_marker: 0,
      files_missing_marker: 0,
      blocks_inserted: 0,
      files_failed: 0,
      files_ignored: 0,
      processing_time,
      processing_time_secs: processing_time.as_secs_f64(),
      timestamp: Some(Local::now().timestamp()),
    }
  }

  /// Create a ProcessingSummary from a collection of FileReports
  pub fn from_reports(files: &[FileReport], processing_time: Duration) -> Self {
    let mut summary = Self::new(processing_time);
    summary.total_files = files.len();

    for file in files {
      match file.action {
        FileAction::Skipped => summary.files_ignored += 1,
        FileAction::Failed => summary.files_failed += 1,
        FileAction::NoActionNeeded => summary.files_with_marker += 1,
        FileAction::Missing => summary.files_missing_marker += 1,
        FileAction::Inserted => {
          summary.files_missing_marker += 1;
          summary.blocks_inserted += 1;
        }
      }
    }

    summary
  }
}
