//! # crtdebug
//!
//! Ensures C++ source files carry the `DEBUG_NEW` debug-allocation macro
//! block, preserving each file's text encoding.

use anyhow::Result;
use crtdebug::cli::{Cli, run_check};

fn main() -> Result<()> {
  let cli = Cli::parse_args();
  run_check(cli.check_args)
}
