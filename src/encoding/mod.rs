//! # Encoding Module
//!
//! This module models the closed set of text encodings that crtdebug can
//! detect and write back, and provides the codec used to turn a file's raw
//! bytes into text and back again without changing its encoding identity.
//!
//! - [`detector`] - Heuristic encoding detection from raw bytes
//! - [`utf7`] - RFC 2152 UTF-7 codec
//!
//! Decoding is strict: malformed input is reported as a [`CodecError`] rather
//! than being replaced, so that a rewrite can never silently corrupt a file.

mod detector;
mod utf7;

use std::fmt;
use std::sync::OnceLock;

pub use detector::{
  CharLength, EncodingDetector, HEURISTIC_SAMPLE_LEN, HeuristicDetector, Unbounded, choose_by_char_length, detect_bom,
  detect_utf16_by_nulls, try_decode,
};
use encoding_rs::Encoding;

/// UTF-7 signature prefix (`+/v`).
pub const UTF7_SIGNATURE: &[u8] = &[0x2B, 0x2F, 0x76];
/// UTF-8 byte order mark.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
/// UTF-16 little-endian byte order mark.
pub const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
/// UTF-16 big-endian byte order mark.
pub const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];
/// UTF-32 byte order mark. Files carrying it are big-endian.
pub const UTF32_BOM: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];

/// Label of the legacy code page used when no other label is configured.
pub const DEFAULT_LEGACY_CODEPAGE: &str = "windows-1252";

static LEGACY_CODEPAGE: OnceLock<&'static Encoding> = OnceLock::new();

/// Errors raised while decoding or encoding file content.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
  /// The input bytes are not valid in the requested encoding.
  #[error("malformed {encoding} input at byte {offset}")]
  Malformed { encoding: TextEncoding, offset: usize },

  /// The text contains a character the encoding cannot represent.
  #[error("character {ch:?} cannot be represented in {encoding}")]
  Unmappable { encoding: TextEncoding, ch: char },

  /// The legacy code page label does not name a usable encoding.
  #[error("unknown or multi-byte legacy code page: {0}")]
  UnsupportedCodepage(String),

  /// A different legacy code page was already registered for this process.
  #[error("legacy code page already initialized as {0}")]
  CodepageAlreadyInitialized(&'static str),
}

/// Registers the legacy single-byte code page used as the last-resort guess.
///
/// Must be called once at startup before any detection. Calling it again
/// with the same label is a no-op.
///
/// # Errors
///
/// Returns an error if `label` is not a single-byte encoding known to
/// `encoding_rs`, or if a different code page was registered earlier.
pub fn initialize_codepage_support(label: Option<&str>) -> Result<&'static Encoding, CodecError> {
  let label = label.unwrap_or(DEFAULT_LEGACY_CODEPAGE);
  let encoding = Encoding::for_label(label.as_bytes())
    .filter(|enc| enc.is_single_byte())
    .ok_or_else(|| CodecError::UnsupportedCodepage(label.to_string()))?;

  let registered = *LEGACY_CODEPAGE.get_or_init(|| encoding);
  if registered != encoding {
    return Err(CodecError::CodepageAlreadyInitialized(registered.name()));
  }

  tracing::debug!("Legacy code page support initialized: {}", registered.name());
  Ok(registered)
}

/// Returns the registered legacy code page.
///
/// Library callers that skip [`initialize_codepage_support`] get
/// Windows-1252.
pub fn legacy_codepage() -> &'static Encoding {
  LEGACY_CODEPAGE.get().copied().unwrap_or(encoding_rs::WINDOWS_1252)
}

/// A best-guess text encoding for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
  /// UTF-7, recognized by its `+/v` signature.
  Utf7,
  /// UTF-8 with a byte order mark.
  Utf8,
  /// UTF-16 little-endian; `bom` records whether the file starts with one.
  Utf16Le { bom: bool },
  /// UTF-16 big-endian; `bom` records whether the file starts with one.
  Utf16Be { bom: bool },
  /// UTF-32 big-endian with a byte order mark.
  Utf32,
  /// 7-bit ASCII.
  Ascii,
  /// UTF-8 without a byte order mark.
  Utf8NoBom,
  /// The legacy single-byte code page (Windows-1252 unless configured).
  LegacyCodepage,
}

impl fmt::Display for TextEncoding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Utf7 => write!(f, "UTF-7"),
      Self::Utf8 => write!(f, "UTF-8 (BOM)"),
      Self::Utf16Le { bom: true } => write!(f, "UTF-16LE (BOM)"),
      Self::Utf16Le { bom: false } => write!(f, "UTF-16LE"),
      Self::Utf16Be { bom: true } => write!(f, "UTF-16BE (BOM)"),
      Self::Utf16Be { bom: false } => write!(f, "UTF-16BE"),
      Self::Utf32 => write!(f, "UTF-32BE (BOM)"),
      Self::Ascii => write!(f, "ASCII"),
      Self::Utf8NoBom => write!(f, "UTF-8"),
      Self::LegacyCodepage => write!(f, "{}", legacy_codepage().name()),
    }
  }
}

impl TextEncoding {
  /// The byte order mark this encoding's writer emits, if any.
  pub const fn bom(self) -> &'static [u8] {
    match self {
      Self::Utf8 => UTF8_BOM,
      Self::Utf16Le { bom: true } => UTF16LE_BOM,
      Self::Utf16Be { bom: true } => UTF16BE_BOM,
      Self::Utf32 => UTF32_BOM,
      _ => &[],
    }
  }

  /// Decodes raw file bytes into text.
  ///
  /// A leading BOM belonging to this encoding is stripped. UTF-7 has no
  /// separate preamble: its signature decodes to U+FEFF and stays in the
  /// text so that [`encode`](Self::encode) reproduces it.
  ///
  /// # Errors
  ///
  /// Returns [`CodecError::Malformed`] if the bytes are not valid in this
  /// encoding.
  pub fn decode(self, bytes: &[u8]) -> Result<String, CodecError> {
    let body = bytes.strip_prefix(self.bom()).unwrap_or(bytes);
    let offset = bytes.len() - body.len();

    match self {
      Self::Utf7 => utf7::decode(body).map_err(|at| self.malformed(offset + at)),
      Self::Ascii => match body.iter().position(|b| !b.is_ascii()) {
        Some(at) => Err(self.malformed(offset + at)),
        None => Ok(body.iter().map(|&b| char::from(b)).collect()),
      },
      Self::Utf8 | Self::Utf8NoBom => std::str::from_utf8(body)
        .map(str::to_owned)
        .map_err(|e| self.malformed(offset + e.valid_up_to())),
      Self::Utf16Le { .. } => decode_with(encoding_rs::UTF_16LE, body).ok_or_else(|| self.malformed(offset)),
      Self::Utf16Be { .. } => decode_with(encoding_rs::UTF_16BE, body).ok_or_else(|| self.malformed(offset)),
      Self::Utf32 => decode_utf32_be(body).map_err(|at| self.malformed(offset + at)),
      Self::LegacyCodepage => decode_with(legacy_codepage(), body).ok_or_else(|| self.malformed(offset)),
    }
  }

  /// Encodes text with this encoding's canonical writer.
  ///
  /// BOM-bearing encodings emit their BOM first.
  ///
  /// # Errors
  ///
  /// Returns [`CodecError::Unmappable`] if a character cannot be represented.
  pub fn encode(self, text: &str) -> Result<Vec<u8>, CodecError> {
    let bom = self.bom();
    let mut out = Vec::with_capacity(bom.len() + text.len() * 2);
    out.extend_from_slice(bom);

    match self {
      Self::Utf7 => out.extend_from_slice(utf7::encode(text).as_bytes()),
      Self::Ascii => {
        if let Some(ch) = text.chars().find(|c| !c.is_ascii()) {
          return Err(CodecError::Unmappable { encoding: self, ch });
        }
        out.extend_from_slice(text.as_bytes());
      }
      Self::Utf8 | Self::Utf8NoBom => out.extend_from_slice(text.as_bytes()),
      Self::Utf16Le { .. } => text.encode_utf16().for_each(|unit| out.extend_from_slice(&unit.to_le_bytes())),
      Self::Utf16Be { .. } => text.encode_utf16().for_each(|unit| out.extend_from_slice(&unit.to_be_bytes())),
      Self::Utf32 => text.chars().for_each(|c| out.extend_from_slice(&u32::from(c).to_be_bytes())),
      Self::LegacyCodepage => {
        let codepage = legacy_codepage();
        // Single-byte encoders report unmappable characters as numeric
        // character references, so each character is checked on its own.
        let mut buf = [0u8; 4];
        for ch in text.chars() {
          let (bytes, _, unmappable) = codepage.encode(ch.encode_utf8(&mut buf));
          if unmappable || bytes.len() != 1 {
            return Err(CodecError::Unmappable { encoding: self, ch });
          }
          out.push(bytes[0]);
        }
      }
    }

    Ok(out)
  }

  const fn malformed(self, offset: usize) -> CodecError {
    CodecError::Malformed { encoding: self, offset }
  }
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
  encoding
    .decode_without_bom_handling_and_without_replacement(bytes)
    .map(|text| text.into_owned())
}

fn decode_utf32_be(bytes: &[u8]) -> Result<String, usize> {
  let chunks = bytes.chunks_exact(4);
  if !chunks.remainder().is_empty() {
    return Err(bytes.len() - chunks.remainder().len());
  }

  chunks
    .enumerate()
    .map(|(i, chunk)| {
      let scalar = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
      char::from_u32(scalar).ok_or(i * 4)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL: [TextEncoding; 10] = [
    TextEncoding::Utf7,
    TextEncoding::Utf8,
    TextEncoding::Utf16Le { bom: true },
    TextEncoding::Utf16Le { bom: false },
    TextEncoding::Utf16Be { bom: true },
    TextEncoding::Utf16Be { bom: false },
    TextEncoding::Utf32,
    TextEncoding::Ascii,
    TextEncoding::Utf8NoBom,
    TextEncoding::LegacyCodepage,
  ];

  #[test]
  fn test_ascii_text_survives_every_encoding() {
    let text = "#include \"stdafx.h\"\r\n#include <vector>\r\nint main() { return 0; }\r\n";
    for encoding in ALL {
      let bytes = encoding.encode(text).unwrap();
      assert_eq!(encoding.decode(&bytes).unwrap(), text, "{encoding}");
    }
  }

  #[test]
  fn test_bom_is_emitted_and_stripped() {
    let bytes = TextEncoding::Utf8.encode("ab").unwrap();
    assert_eq!(bytes, b"\xEF\xBB\xBFab");
    assert_eq!(TextEncoding::Utf8.decode(&bytes).unwrap(), "ab");

    let bytes = TextEncoding::Utf16Le { bom: true }.encode("a").unwrap();
    assert_eq!(bytes, [0xFF, 0xFE, b'a', 0x00]);

    let bytes = TextEncoding::Utf16Be { bom: false }.encode("a").unwrap();
    assert_eq!(bytes, [0x00, b'a']);

    let bytes = TextEncoding::Utf32.encode("a").unwrap();
    assert_eq!(bytes, [0x00, 0x00, 0xFE, 0xFF, 0x00, 0x00, 0x00, b'a']);
  }

  #[test]
  fn test_legacy_codepage_round_trips_high_bytes() {
    // "café €" in Windows-1252
    let bytes = [0x63, 0x61, 0x66, 0xE9, 0x20, 0x80];
    let text = TextEncoding::LegacyCodepage.decode(&bytes).unwrap();
    assert_eq!(text, "café €");
    assert_eq!(TextEncoding::LegacyCodepage.encode(&text).unwrap(), bytes);
  }

  #[test]
  fn test_legacy_codepage_rejects_unmappable() {
    let err = TextEncoding::LegacyCodepage.encode("漢").unwrap_err();
    assert!(matches!(err, CodecError::Unmappable { ch: '漢', .. }));
  }

  #[test]
  fn test_ascii_rejects_high_bytes() {
    let err = TextEncoding::Ascii.decode(b"ab\xE9").unwrap_err();
    assert_eq!(
      err,
      CodecError::Malformed {
        encoding: TextEncoding::Ascii,
        offset: 2
      }
    );
    assert!(TextEncoding::Ascii.encode("é").is_err());
  }

  #[test]
  fn test_utf8_reports_offset_of_invalid_sequence() {
    let err = TextEncoding::Utf8.decode(b"\xEF\xBB\xBFok\xFF").unwrap_err();
    assert_eq!(
      err,
      CodecError::Malformed {
        encoding: TextEncoding::Utf8,
        offset: 5
      }
    );
  }

  #[test]
  fn test_utf16_rejects_odd_length() {
    assert!(TextEncoding::Utf16Le { bom: false }.decode(&[b'a', 0x00, b'b']).is_err());
  }

  #[test]
  fn test_utf32_rejects_invalid_scalar() {
    let bytes = [0x00, 0x00, 0xFE, 0xFF, 0x00, 0x00, 0xD8, 0x00];
    let err = TextEncoding::Utf32.decode(&bytes).unwrap_err();
    assert_eq!(
      err,
      CodecError::Malformed {
        encoding: TextEncoding::Utf32,
        offset: 4
      }
    );
  }

  #[test]
  fn test_initialize_codepage_support_is_idempotent() {
    let first = initialize_codepage_support(None).unwrap();
    let second = initialize_codepage_support(Some("windows-1252")).unwrap();
    assert_eq!(first, second);
    assert_eq!(legacy_codepage(), encoding_rs::WINDOWS_1252);
  }

  #[test]
  fn test_initialize_codepage_support_rejects_multi_byte() {
    let err = initialize_codepage_support(Some("shift_jis")).unwrap_err();
    assert_eq!(err, CodecError::UnsupportedCodepage("shift_jis".to_string()));
  }
}
