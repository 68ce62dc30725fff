//! RFC 2152 UTF-7.
//!
//! The encoder writes directly only the RFC's "Set D" characters plus space,
//! tab, CR and LF; everything else, including the optional direct characters
//! such as `#` and `<`, goes through modified base64. Shifted runs are always
//! closed with an explicit `-`.

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const fn is_direct(c: char) -> bool {
  matches!(c,
    'A'..='Z' | 'a'..='z' | '0'..='9'
    | '\'' | '(' | ')' | ',' | '-' | '.' | '/' | ':' | '?'
    | ' ' | '\t' | '\r' | '\n')
}

const fn base64_value(b: u8) -> Option<u32> {
  match b {
    b'A'..=b'Z' => Some((b - b'A') as u32),
    b'a'..=b'z' => Some((b - b'a') as u32 + 26),
    b'0'..=b'9' => Some((b - b'0') as u32 + 52),
    b'+' => Some(62),
    b'/' => Some(63),
    _ => None,
  }
}

/// Encodes text as UTF-7.
pub fn encode(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut bits: u32 = 0;
  let mut nbits: u32 = 0;
  let mut shifted = false;

  for c in text.chars() {
    if is_direct(c) {
      if shifted {
        if nbits > 0 {
          out.push(char::from(BASE64[((bits << (6 - nbits)) & 0x3F) as usize]));
        }
        out.push('-');
        bits = 0;
        nbits = 0;
        shifted = false;
      }
      out.push(c);
      continue;
    }

    if c == '+' && !shifted {
      out.push_str("+-");
      continue;
    }

    if !shifted {
      out.push('+');
      shifted = true;
    }

    let mut units = [0u16; 2];
    for &unit in c.encode_utf16(&mut units).iter() {
      bits = (bits << 16) | u32::from(unit);
      nbits += 16;
      while nbits >= 6 {
        nbits -= 6;
        out.push(char::from(BASE64[((bits >> nbits) & 0x3F) as usize]));
      }
      bits &= (1 << nbits) - 1;
    }
  }

  if shifted {
    if nbits > 0 {
      out.push(char::from(BASE64[((bits << (6 - nbits)) & 0x3F) as usize]));
    }
    out.push('-');
  }

  out
}

/// Decodes UTF-7 bytes, returning the byte offset of the first malformed
/// sequence on failure.
pub fn decode(bytes: &[u8]) -> Result<String, usize> {
  let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
  let mut i = 0;

  while i < bytes.len() {
    let b = bytes[i];
    if !b.is_ascii() {
      return Err(i);
    }

    if b != b'+' {
      units.push(u16::from(b));
      i += 1;
      continue;
    }

    let start = i;
    i += 1;
    if bytes.get(i) == Some(&b'-') {
      units.push(u16::from(b'+'));
      i += 1;
      continue;
    }

    let mut bits: u32 = 0;
    let mut nbits: u32 = 0;
    while let Some(value) = bytes.get(i).and_then(|&b| base64_value(b)) {
      bits = (bits << 6) | value;
      nbits += 6;
      if nbits >= 16 {
        nbits -= 16;
        units.push(((bits >> nbits) & 0xFFFF) as u16);
      }
      bits &= (1 << nbits) - 1;
      i += 1;
    }

    // Leftover padding must be fewer than six zero bits.
    if nbits >= 6 || bits != 0 {
      return Err(start);
    }

    if bytes.get(i) == Some(&b'-') {
      i += 1;
    }
  }

  String::from_utf16(&units).map_err(|_| bytes.len())
}
