//! # Macro Inserter Module
//!
//! Pure text transformation that places the debug-allocation macro block
//! after the last include directive of a source file.
//!
//! Lines are split on `\n` only. A trailing `\r` stays part of its line, so
//! CRLF files keep their line endings without a normalization pass. Every
//! inserted line is given a trailing `\r` of its own.

use std::borrow::Cow;

/// Sentinel whose presence means the block is already there.
pub const DEFAULT_MARKER: &str = "DEBUG_NEW";

/// Substring that identifies an include directive.
pub const DEFAULT_ANCHOR: &str = "#include";

/// The block inserted after the anchor line.
pub const DEFAULT_BLOCK: &[&str] = &["", "#ifdef _DEBUG", "#define new DEBUG_NEW", "#endif"];

/// Errors raised while computing an insertion.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InsertError {
  /// No line contains the anchor, so there is no safe insertion point.
  #[error("no line contains '{anchor}'; refusing to guess an insertion point")]
  NoAnchor { anchor: String },
}

/// Inserts a fixed block of lines after the last anchor line unless a marker
/// is already present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroInserter {
  marker: String,
  anchor: String,
  block: Vec<String>,
}

impl Default for MacroInserter {
  fn default() -> Self {
    Self::new(
      DEFAULT_MARKER,
      DEFAULT_ANCHOR,
      DEFAULT_BLOCK.iter().map(|line| (*line).to_string()).collect(),
    )
  }
}

impl MacroInserter {
  /// Creates an inserter with a custom marker, anchor and block.
  ///
  /// Each block line is normalized to end with `\r`.
  pub fn new(marker: impl Into<String>, anchor: impl Into<String>, block: Vec<String>) -> Self {
    let block = block
      .into_iter()
      .map(|mut line| {
        if !line.ends_with('\r') {
          line.push('\r');
        }
        line
      })
      .collect();

    Self {
      marker: marker.into(),
      anchor: anchor.into(),
      block,
    }
  }

  pub fn marker(&self) -> &str {
    &self.marker
  }

  pub fn anchor(&self) -> &str {
    &self.anchor
  }

  /// Returns `true` if `contents` already contains the marker.
  pub fn has_marker(&self, contents: &str) -> bool {
    contents.contains(&self.marker)
  }

  /// Ensures `contents` carries the marker.
  ///
  /// Returns the input unchanged (borrowed) if the marker is present,
  /// otherwise the contents with the block spliced in after the last line
  /// containing the anchor.
  ///
  /// # Errors
  ///
  /// Returns [`InsertError::NoAnchor`] if no line contains the anchor.
  pub fn ensure_marker<'a>(&self, contents: &'a str) -> Result<Cow<'a, str>, InsertError> {
    if self.has_marker(contents) {
      return Ok(Cow::Borrowed(contents));
    }

    let mut lines: Vec<&str> = contents.split('\n').collect();

    let anchor_index = lines
      .iter()
      .rposition(|line| line.contains(self.anchor.as_str()))
      .ok_or_else(|| InsertError::NoAnchor {
        anchor: self.anchor.clone(),
      })?;

    let at = anchor_index + 1;
    lines.splice(at..at, self.block.iter().map(String::as_str));

    Ok(Cow::Owned(lines.join("\n")))
  }
}

/// Ensures `contents` contains `marker`, inserting `block` after the last
/// `#include` line if it does not.
///
/// `block` is split on `\n`; each of its lines is given a trailing `\r`.
///
/// # Errors
///
/// Returns [`InsertError::NoAnchor`] if no line contains `#include`.
pub fn ensure_marker<'a>(contents: &'a str, marker: &str, block: &str) -> Result<Cow<'a, str>, InsertError> {
  let block = block.split('\n').map(str::to_string).collect();
  MacroInserter::new(marker, DEFAULT_ANCHOR, block).ensure_marker(contents)
}
