#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use assert_cmd::prelude::*;
use crtdebug::encoding::TextEncoding;

/// A typical MFC translation unit without the block, with CRLF line endings.
pub const VIEW_SOURCE: &str = "// view.cpp : implementation of the view class\r\n\
#include \"stdafx.h\"\r\n\
#include \"App.h\"\r\n\
#include \"View.h\"\r\n\
\r\n\
IMPLEMENT_DYNCREATE(CView, CScrollView)\r\n";

/// The same file after insertion.
pub const VIEW_SOURCE_FIXED: &str = "// view.cpp : implementation of the view class\r\n\
#include \"stdafx.h\"\r\n\
#include \"App.h\"\r\n\
#include \"View.h\"\r\n\
\r\n\
#ifdef _DEBUG\r\n\
#define new DEBUG_NEW\r\n\
#endif\r\n\
\r\n\
IMPLEMENT_DYNCREATE(CView, CScrollView)\r\n";

/// A file that already carries the block.
pub const DONE_SOURCE: &str = "#include \"stdafx.h\"\n\n#ifdef _DEBUG\n#define new DEBUG_NEW\n#endif\n\nint x;\n";

/// Writes `text` to `path` in `encoding`, creating parent directories.
pub fn write_encoded(path: &Path, encoding: TextEncoding, text: &str) -> Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  let bytes = encoding
    .encode(text)
    .with_context(|| format!("Failed to encode test fixture as {}", encoding))?;
  fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// Writes a UTF-8 fixture, creating parent directories.
pub fn write_file(root: &Path, relative: &str, text: &str) -> Result<PathBuf> {
  let path = root.join(relative);
  write_encoded(&path, TextEncoding::Utf8NoBom, text)?;
  Ok(path)
}

/// A `crtdebug` command run from `dir`, isolated from the caller's
/// environment and without colors.
pub fn crtdebug_cmd(dir: &Path) -> Result<Command> {
  let mut cmd = Command::cargo_bin("crtdebug")?;
  cmd
    .current_dir(dir)
    .env_remove("CRTDEBUG_CONFIG")
    .env_remove("CRTDEBUG_GLOBAL_IGNORE")
    .env_remove("RUST_LOG")
    .arg("--colors=never");
  Ok(cmd)
}
