//! # Encoding Detection
//!
//! Heuristic detection of a file's text encoding from its raw bytes.
//!
//! Detection runs in priority order:
//! 1. Files shorter than four bytes are ASCII.
//! 2. A byte order mark (or the UTF-7 signature) is definitive.
//! 3. Null-byte distribution over the first 32 KiB picks BOM-less UTF-16.
//! 4. Otherwise the file is counted as ASCII (one character per byte) and as
//!    UTF-8 (one U+FFFD per malformed sequence); UTF-8 wins only if it yields
//!    strictly fewer characters, else the legacy code page is used.

use std::fs::File;
use std::io::Read as _;
use std::path::Path;

use tracing::{debug, trace};

use super::{TextEncoding, UTF7_SIGNATURE, UTF8_BOM, UTF16BE_BOM, UTF16LE_BOM, UTF32_BOM};

/// Number of leading bytes sampled by the null-byte heuristic.
pub const HEURISTIC_SAMPLE_LEN: usize = 32 * 1024;

/// Files shorter than this cannot carry a byte order mark probe.
const BOM_PROBE_LEN: usize = 4;

/// Share of null bytes on one parity that marks a UTF-16 candidate.
const NULL_MAJORITY_RATIO: f64 = 0.4;

/// Share of null bytes on the other parity that a UTF-16 candidate may not exceed.
const NULL_MINORITY_RATIO: f64 = 0.1;

/// A decode that failed, or a file that could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unbounded;

/// Character count of a candidate decoding.
///
/// `Unbounded` compares greater than every finite length, so a candidate
/// that could not be decoded is never preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CharLength {
  Finite(usize),
  Unbounded,
}

impl From<Result<usize, Unbounded>> for CharLength {
  fn from(result: Result<usize, Unbounded>) -> Self {
    match result {
      Ok(len) => Self::Finite(len),
      Err(Unbounded) => Self::Unbounded,
    }
  }
}

/// Counts the characters `bytes` decode to in `encoding`.
///
/// ASCII, UTF-8 and the legacy code page are counted the way a replacing
/// decoder reads them: every byte outside ASCII is one character, and every
/// malformed UTF-8 sequence is one U+FFFD. Those candidates always yield a
/// length. The remaining encodings are decoded strictly.
///
/// # Errors
///
/// Returns [`Unbounded`] if the bytes are not valid in a strictly decoded
/// `encoding`.
pub fn try_decode(bytes: &[u8], encoding: TextEncoding) -> Result<usize, Unbounded> {
  match encoding {
    TextEncoding::Ascii | TextEncoding::LegacyCodepage => Ok(bytes.len()),
    TextEncoding::Utf8 => Ok(encoding_rs::UTF_8.decode_with_bom_removal(bytes).0.chars().count()),
    TextEncoding::Utf8NoBom => Ok(encoding_rs::UTF_8.decode_without_bom_handling(bytes).0.chars().count()),
    _ => encoding.decode(bytes).map(|text| text.chars().count()).map_err(|e| {
      trace!("Candidate decoding rejected: {}", e);
      Unbounded
    }),
  }
}

/// Trait for encoding detectors.
///
/// Implementations decide which [`TextEncoding`] a file should be read and
/// written with. Detection never fails: every file gets a concrete guess.
pub trait EncodingDetector: Send + Sync {
  /// Returns the best-guess encoding for the file at `path`.
  fn detect(&self, path: &Path) -> TextEncoding;
}

/// Default detector: BOM probe, UTF-16 null-byte heuristic, then the
/// ASCII/UTF-8 character-count comparison.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicDetector;

impl HeuristicDetector {
  pub const fn new() -> Self {
    Self
  }

  /// Runs the same heuristic over an in-memory buffer.
  pub fn detect_bytes(&self, bytes: &[u8]) -> TextEncoding {
    if bytes.len() < BOM_PROBE_LEN {
      return TextEncoding::Ascii;
    }

    if let Some(encoding) = detect_bom(bytes) {
      return encoding;
    }

    let sample = &bytes[..bytes.len().min(HEURISTIC_SAMPLE_LEN)];
    if let Some(encoding) = detect_utf16_by_nulls(sample) {
      return encoding;
    }

    choose_by_char_length(
      try_decode(bytes, TextEncoding::Ascii).into(),
      try_decode(bytes, TextEncoding::Utf8NoBom).into(),
    )
  }

  /// Reads the BOM probe and the heuristic sample from the start of the file.
  ///
  /// Returns `None` when the file cannot be opened or read.
  fn read_sample(path: &Path) -> Option<(u64, Vec<u8>)> {
    let file = File::open(path)
      .inspect_err(|e| debug!("Cannot open {} for detection: {}", path.display(), e))
      .ok()?;
    let file_len = file.metadata().map(|m| m.len()).ok()?;

    let mut sample = Vec::with_capacity(HEURISTIC_SAMPLE_LEN);
    file
      .take(HEURISTIC_SAMPLE_LEN as u64)
      .read_to_end(&mut sample)
      .inspect_err(|e| debug!("Cannot read {} for detection: {}", path.display(), e))
      .ok()?;

    Some((file_len, sample))
  }
}

impl EncodingDetector for HeuristicDetector {
  fn detect(&self, path: &Path) -> TextEncoding {
    if let Some((file_len, sample)) = Self::read_sample(path) {
      if file_len < BOM_PROBE_LEN as u64 {
        return TextEncoding::Ascii;
      }

      if let Some(encoding) = detect_bom(&sample) {
        trace!("{}: byte order mark indicates {}", path.display(), encoding);
        return encoding;
      }

      if let Some(encoding) = detect_utf16_by_nulls(&sample) {
        trace!("{}: null-byte distribution indicates {}", path.display(), encoding);
        return encoding;
      }
    }

    let ascii = char_length(path, TextEncoding::Ascii);
    let utf8 = char_length(path, TextEncoding::Utf8NoBom);
    trace!(
      "{}: character lengths ascii={:?} utf8={:?}",
      path.display(),
      ascii,
      utf8
    );
    choose_by_char_length(ascii, utf8)
  }
}

/// Reads the whole file and counts its characters in `encoding`.
///
/// Read failures are swallowed and reported as [`CharLength::Unbounded`].
fn char_length(path: &Path, encoding: TextEncoding) -> CharLength {
  match std::fs::read(path) {
    Ok(bytes) => try_decode(&bytes, encoding).into(),
    Err(e) => {
      debug!("Cannot read {} as {}: {}", path.display(), encoding, e);
      CharLength::Unbounded
    }
  }
}

/// Matches the leading bytes against the known signatures.
pub fn detect_bom(bytes: &[u8]) -> Option<TextEncoding> {
  if bytes.starts_with(UTF7_SIGNATURE) {
    Some(TextEncoding::Utf7)
  } else if bytes.starts_with(UTF8_BOM) {
    Some(TextEncoding::Utf8)
  } else if bytes.starts_with(UTF16LE_BOM) {
    Some(TextEncoding::Utf16Le { bom: true })
  } else if bytes.starts_with(UTF16BE_BOM) {
    Some(TextEncoding::Utf16Be { bom: true })
  } else if bytes.starts_with(UTF32_BOM) {
    Some(TextEncoding::Utf32)
  } else {
    None
  }
}

/// Guesses BOM-less UTF-16 from where the null bytes fall in `sample`.
///
/// Offsets are counted from the start of the sample.
pub fn detect_utf16_by_nulls(sample: &[u8]) -> Option<TextEncoding> {
  let (evens, odds) = sample
    .iter()
    .enumerate()
    .filter(|&(_, &b)| b == 0)
    .fold((0usize, 0usize), |(evens, odds), (i, _)| {
      if i % 2 == 0 { (evens + 1, odds) } else { (evens, odds + 1) }
    });

  let len = sample.len() as f64;
  let (evens, odds) = (evens as f64, odds as f64);

  if evens > NULL_MAJORITY_RATIO * len && odds < NULL_MINORITY_RATIO * len {
    Some(TextEncoding::Utf16Le { bom: false })
  } else if odds > NULL_MAJORITY_RATIO * len && evens < NULL_MINORITY_RATIO * len {
    Some(TextEncoding::Utf16Be { bom: false })
  } else {
    None
  }
}

/// Picks UTF-8 only when it decodes to strictly fewer characters than ASCII.
pub fn choose_by_char_length(ascii: CharLength, utf8: CharLength) -> TextEncoding {
  if utf8 < ascii {
    TextEncoding::Utf8NoBom
  } else {
    TextEncoding::LegacyCodepage
  }
}
