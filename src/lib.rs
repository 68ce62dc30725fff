//! # crtdebug
//!
//! A tool that ensures C++ source files carry the MFC debug-allocation macro block:
//!
//! ```text
//!
//! #ifdef _DEBUG
//! #define new DEBUG_NEW
//! #endif
//! ```
//!
//! The block is inserted directly after the last `#include` line of every file that does not already mention
//! `DEBUG_NEW`. Files are rewritten in the text encoding they were found in, byte order mark included, so legacy
//! Windows code bases with a mix of UTF-16, UTF-8 and code-page files come out of a run with only the block added.
//!
//! ## Features
//!
//! * Heuristic encoding detection: byte order marks, then a null-byte test for BOM-less UTF-16, then a character
//!   count of the file as ASCII and as UTF-8, falling back to the legacy code page unless UTF-8 is shorter
//! * Dry-run mode that lists files missing the block, with optional unified diffs
//! * Idempotent: a second run never changes a file
//! * Ignore globs, `.crtdebugignore` files, path-substring exclusions and extension filters
//! * JSON and CSV reports of each file's encoding and outcome
//!
//! ## Usage as a Library
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! use crtdebug::inserter::MacroInserter;
//! use crtdebug::processor::{Processor, ProcessorConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut processor = Processor::new(ProcessorConfig {
//!         check_only: true,
//!         ..ProcessorConfig::new(MacroInserter::default(), PathBuf::from("."))
//!     })?;
//!
//!     let has_issues = processor.process(&["src".to_string()])?;
//!     if has_issues {
//!         for report in processor.file_reports() {
//!             println!("{}: {}", report.path.display(), report.action.label());
//!         }
//!     }
//!
//!     // Or fix a single file in place
//!     let outcome = crtdebug::ensure_has_marker(std::path::Path::new("src/view.cpp"))?;
//!     println!("{} ({:?})", outcome.encoding, outcome.status);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! * [`encoding`] - Encoding detection and strict decoding/encoding
//! * [`inserter`] - Marker check and block insertion on decoded text
//! * [`processor`] - The per-file pipeline and batch driver
//! * [`logging`] - Output modes and tracing setup
//!
//! [`encoding`]: crate::encoding
//! [`inserter`]: crate::inserter
//! [`processor`]: crate::processor
//! [`logging`]: crate::logging

pub mod cli;
pub mod config;
pub mod diff;
pub mod encoding;
pub mod file_filter;
pub mod ignore;
pub mod inserter;
pub mod logging;
pub mod output;
pub mod processor;
pub mod report;
pub mod workspace;

pub use processor::ensure_has_marker;
