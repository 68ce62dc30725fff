//! # Diff Module
//!
//! Renders the pending insertion for a file as a unified diff, for
//! `--show-diff` (stderr) and `--save-diff` (appended to one file per run).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use similar::TextDiff;

/// Lines of unchanged context around each hunk.
const CONTEXT_RADIUS: usize = 3;

/// Manages diff creation and rendering for pending insertions.
pub struct DiffManager {
  /// Whether to print diffs to stderr
  pub show_diff: bool,

  /// File the diffs of this run are appended to
  pub save_diff_path: Option<PathBuf>,
}

impl DiffManager {
  pub const fn new(show_diff: bool, save_diff_path: Option<PathBuf>) -> Self {
    Self {
      show_diff,
      save_diff_path,
    }
  }

  /// Returns `true` if diffs are shown or saved.
  pub const fn is_enabled(&self) -> bool {
    self.show_diff || self.save_diff_path.is_some()
  }

  /// Truncates the save file so a run starts from an empty diff.
  pub fn prepare(&self) -> Result<()> {
    if let Some(ref diff_path) = self.save_diff_path {
      File::create(diff_path).with_context(|| format!("Failed to create diff file: {}", diff_path.display()))?;
    }
    Ok(())
  }

  /// Renders the unified diff between `original` and `new` for `path`.
  pub fn render(path: &Path, original: &str, new: &str) -> String {
    let name = path.display().to_string();
    let mut rendered = TextDiff::from_lines(original, new)
      .unified_diff()
      .context_radius(CONTEXT_RADIUS)
      .header(&name, &name)
      .to_string();

    if !rendered.ends_with('\n') {
      rendered.push('\n');
    }
    rendered
  }

  /// Prints and/or saves the diff for `path`.
  ///
  /// Diffs from successive files are appended to the save file, producing
  /// one consolidated diff for the run.
  pub fn display_diff(&self, path: &Path, original: &str, new: &str) -> Result<()> {
    if !self.is_enabled() {
      return Ok(());
    }

    let rendered = Self::render(path, original, new);

    if self.show_diff {
      for line in rendered.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
          eprintln!("{}", line.if_supports_color(Stream::Stderr, |l| l.bold()));
        } else if line.starts_with('+') {
          eprintln!("{}", line.if_supports_color(Stream::Stderr, |l| l.green()));
        } else if line.starts_with('-') {
          eprintln!("{}", line.if_supports_color(Stream::Stderr, |l| l.red()));
        } else if line.starts_with("@@") {
          eprintln!("{}", line.if_supports_color(Stream::Stderr, |l| l.cyan()));
        } else {
          eprintln!("{}", line);
        }
      }
    }

    if let Some(ref diff_path) = self.save_diff_path {
      let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(diff_path)
        .with_context(|| format!("Failed to open diff file: {}", diff_path.display()))?;
      file
        .write_all(rendered.as_bytes())
        .with_context(|| format!("Failed to write diff file: {}", diff_path.display()))?;
    }

    Ok(())
  }
}
