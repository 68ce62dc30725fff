//! # CLI Module
//!
//! This module contains the command-line interface implementation.
//! It uses clap for argument parsing; the check/modify run is the only
//! command, so its arguments sit at the top level.

mod check;

pub use check::{CheckArgs, run_check};
use clap::Parser;
use clap::builder::styling::{AnsiColor, Color, Style, Styles};

const CUSTOM_STYLES: Styles = Styles::styled()
  .header(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .usage(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))).bold())
  .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
  .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))).bold())
  .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
  .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))));

/// Top-level CLI arguments
#[derive(Parser, Debug)]
#[command(
  name = "crtdebug",
  author,
  version,
  about,
  styles = CUSTOM_STYLES,
  after_help = "Examples:
  # List .cpp files missing the DEBUG_NEW block without modifying them
  crtdebug src/

  # Insert the block after the last #include of every file that lacks it
  crtdebug --modify src/ lib/

  # Show the pending insertions as a diff
  crtdebug --show-diff src/**/*.cpp

  # Save the diff to a file
  crtdebug --save-diff changes.diff src/

  # Also handle .cxx files and skip a vendored tree
  crtdebug --include-ext cpp --include-ext cxx --exclude-path third_party --modify .

  # Pipe the bare paths of files missing the block into another tool
  crtdebug -q src/ | xargs -r git add -N

  # Write a JSON report of every file's encoding and outcome
  crtdebug --report-json report.json src/
",
  help_template = "{before-help}{name} v{version}
{about-section}
{usage-heading} {usage}

{all-args}{after-help}
"
)]
pub struct Cli {
  #[command(flatten)]
  pub check_args: CheckArgs,
}

impl Cli {
  /// Parse CLI arguments and return the Cli struct
  pub fn parse_args() -> Self {
    Self::parse()
  }
}
