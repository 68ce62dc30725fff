//! # Output Module
//!
//! This module centralizes all user-facing output for crtdebug.
//!
//! - stdout carries progress, file lists and the summary; `-q` reduces it to
//!   the bare paths of files missing the block, for piping into other tools
//! - failures always go to stderr
//! - `-v` lifts the file-list limit and adds per-file detail

use owo_colors::{OwoColorize, Stream};

use crate::logging::{is_quiet, is_verbose};
use crate::report::{FileAction, FileReport, ProcessingSummary};

/// Symbols used in output
pub mod symbols {
  /// Success/has the marker
  pub const SUCCESS: &str = "\u{2713}"; // ✓
  /// Missing marker/failure
  pub const FAILURE: &str = "\u{2717}"; // ✗
  /// Ignored/skipped
  pub const IGNORED: &str = "-";
}

/// Maximum number of files to show in the default output before truncating
const DEFAULT_FILE_LIST_LIMIT: usize = 20;

const fn plural(count: usize) -> &'static str {
  if count == 1 { "file" } else { "files" }
}

/// Print the initial "Checking N files..." or "Processing N files..." message.
pub fn print_start_message(file_count: usize, modify_mode: bool) {
  if is_quiet() {
    return;
  }

  let verb = if modify_mode { "Processing" } else { "Checking" };
  println!("{} {} {}...", verb, file_count, plural(file_count));
}

/// Print a blank line for visual separation (respects quiet mode).
pub fn print_blank_line() {
  if !is_quiet() {
    println!();
  }
}

/// Prints up to the default limit of `files` under `header`, or all of them
/// in verbose mode.
fn print_file_list(header: &str, files: &[&FileReport]) {
  println!("{}", header);

  let count = files.len();
  let limit = if is_verbose() { count } else { DEFAULT_FILE_LIST_LIMIT };

  for file in files.iter().take(limit) {
    println!("  {}", file.path.display());
  }

  if count > limit {
    println!(
      "  {}",
      format!("... and {} more (use -v to see all)", count - limit).if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }
}

/// Print the list of files missing the macro block.
///
/// In quiet mode only the bare paths are printed, one per line.
pub fn print_missing_files(files: &[&FileReport], marker: &str) {
  if files.is_empty() {
    return;
  }

  if is_quiet() {
    for file in files {
      println!("{}", file.path.display());
    }
    return;
  }

  let header = format!(
    "{} {} {} missing the {} block:",
    symbols::FAILURE.if_supports_color(Stream::Stdout, |s| s.red()),
    files.len(),
    plural(files.len()),
    marker
  );
  print_file_list(&header, files);
}

/// Print the list of files that received the macro block.
pub fn print_inserted_files(files: &[&FileReport], marker: &str) {
  if is_quiet() || files.is_empty() {
    return;
  }

  let header = format!(
    "{} Inserted the {} block into {} {}:",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    marker,
    files.len(),
    plural(files.len())
  );
  print_file_list(&header, files);
}

/// Print files that could not be processed, with the reason, to stderr.
///
/// Failures are printed in full even in quiet mode.
pub fn print_failed_files(files: &[&FileReport]) {
  if files.is_empty() {
    return;
  }

  eprintln!(
    "{} {} {} could not be processed:",
    symbols::FAILURE.if_supports_color(Stream::Stderr, |s| s.red()),
    files.len(),
    plural(files.len())
  );

  for file in files {
    let reason = file.reason.as_deref().unwrap_or("unknown error");
    eprintln!("  {}: {}", file.path.display(), reason);
  }
}

/// Print per-file detail for files that needed nothing or were ignored.
/// Only shown in verbose mode.
pub fn print_verbose_details(categorized: &CategorizedReports<'_>) {
  if !is_verbose() {
    return;
  }

  for file in &categorized.ok {
    let encoding = file.encoding.map(|e| e.to_string()).unwrap_or_default();
    println!(
      "  {} {} ({})",
      symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
      file.path.display(),
      encoding
    );
  }

  for file in &categorized.ignored {
    println!(
      "  {} {} (ignored: {})",
      symbols::IGNORED.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      file.path.display().if_supports_color(Stream::Stdout, |s| s.dimmed()),
      file.reason.as_deref().unwrap_or("filtered")
    );
  }
}

/// Print the success message when every file already has the block.
pub fn print_all_files_ok(marker: &str) {
  if is_quiet() {
    return;
  }

  println!(
    "{} All files have the {} block.",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    marker
  );
}

/// Print the processing summary.
///
/// Format: "Summary: X OK, Y missing, Z failed, W ignored"
/// In verbose mode, also shows timing.
pub fn print_summary(summary: &ProcessingSummary) {
  if is_quiet() {
    return;
  }

  let ok_str = summary.files_with_marker.if_supports_color(Stream::Stdout, |s| s.cyan());

  // Inserted files count as missing in the summary but are fixed now.
  let missing = summary.files_missing_marker.saturating_sub(summary.blocks_inserted);
  let missing_str = if missing > 0 {
    missing.if_supports_color(Stream::Stdout, |s| s.red()).to_string()
  } else {
    missing.if_supports_color(Stream::Stdout, |s| s.cyan()).to_string()
  };

  let failed_str = if summary.files_failed > 0 {
    summary.files_failed.if_supports_color(Stream::Stdout, |s| s.red()).to_string()
  } else {
    summary.files_failed.if_supports_color(Stream::Stdout, |s| s.cyan()).to_string()
  };

  let ignored_str = summary.files_ignored.if_supports_color(Stream::Stdout, |s| s.dimmed());

  let mut summary_line = format!(
    "Summary: {} OK, {} missing, {} failed, {} ignored",
    ok_str, missing_str, failed_str, ignored_str
  );

  if summary.blocks_inserted > 0 {
    summary_line.push_str(&format!(", {} inserted", summary.blocks_inserted));
  }

  if is_verbose() {
    summary_line.push_str(&format!(" ({:.2}s)", summary.processing_time.as_secs_f64()));
  }

  println!("{}", summary_line);
}

/// Print a hint for the user about what to do next.
pub fn print_hint(message: &str) {
  if is_quiet() {
    return;
  }

  println!("{}", message.if_supports_color(Stream::Stdout, |s| s.yellow()));
}

/// File reports grouped by outcome, in processing order.
pub struct CategorizedReports<'a> {
  /// Files missing the block (dry run)
  pub missing: Vec<&'a FileReport>,
  /// Files that received the block
  pub inserted: Vec<&'a FileReport>,
  /// Files that could not be processed
  pub failed: Vec<&'a FileReport>,
  /// Files that already had the marker
  pub ok: Vec<&'a FileReport>,
  /// Files that were filtered out
  pub ignored: Vec<&'a FileReport>,
}

impl<'a> CategorizedReports<'a> {
  /// Categorize a slice of file reports.
  pub fn from_reports(reports: &'a [FileReport]) -> Self {
    let mut categorized = Self {
      missing: Vec::new(),
      inserted: Vec::new(),
      failed: Vec::new(),
      ok: Vec::new(),
      ignored: Vec::new(),
    };

    for report in reports {
      let bucket = match report.action {
        FileAction::Missing => &mut categorized.missing,
        FileAction::Inserted => &mut categorized.inserted,
        FileAction::Failed => &mut categorized.failed,
        FileAction::NoActionNeeded => &mut categorized.ok,
        FileAction::Skipped => &mut categorized.ignored,
      };
      bucket.push(report);
    }

    categorized
  }

  /// Number of files that were actually opened.
  pub fn processed_count(&self) -> usize {
    self.missing.len() + self.inserted.len() + self.failed.len() + self.ok.len()
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;
  use crate::encoding::TextEncoding;

  fn create_test_report(path: &str, action: FileAction) -> FileReport {
    FileReport {
      path: PathBuf::from(path),
      encoding: Some(TextEncoding::Ascii),
      has_marker: action == FileAction::NoActionNeeded,
      action,
      reason: None,
    }
  }

  #[test]
  fn test_categorize_reports_mixed() {
    let reports = vec![
      create_test_report("src/ok.cpp", FileAction::NoActionNeeded),
      create_test_report("src/missing.cpp", FileAction::Missing),
      create_test_report("src/inserted.cpp", FileAction::Inserted),
      create_test_report("src/failed.cpp", FileAction::Failed),
      FileReport::skipped("src/stdafx.cpp", "Path contains 'stdafx'"),
    ];

    let categorized = CategorizedReports::from_reports(&reports);

    assert_eq!(categorized.ok.len(), 1);
    assert_eq!(categorized.missing.len(), 1);
    assert_eq!(categorized.inserted.len(), 1);
    assert_eq!(categorized.failed.len(), 1);
    assert_eq!(categorized.ignored.len(), 1);
    assert_eq!(categorized.processed_count(), 4);
  }

  #[test]
  fn test_categorize_keeps_processing_order() {
    let reports = vec![
      create_test_report("b.cpp", FileAction::Missing),
      create_test_report("a.cpp", FileAction::Missing),
    ];

    let categorized = CategorizedReports::from_reports(&reports);
    let paths: Vec<_> = categorized.missing.iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths, vec![PathBuf::from("b.cpp"), PathBuf::from("a.cpp")]);
  }

  #[test]
  fn test_plural() {
    assert_eq!(plural(1), "file");
    assert_eq!(plural(0), "files");
    assert_eq!(plural(2), "files");
  }
}
