use std::sync::atomic::{AtomicU8, Ordering};

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Global output mode shared by the logging macros.
///
/// Starts out as [`OutputMode::Normal`] until [`set_verbose`] or
/// [`set_quiet`] is called.
static OUTPUT_MODE: AtomicU8 = AtomicU8::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
  Normal = 0,
  Quiet = 1,
  Verbose = 2,
}

impl OutputMode {
  const fn from_u8(value: u8) -> Self {
    match value {
      1 => OutputMode::Quiet,
      2 => OutputMode::Verbose,
      _ => OutputMode::Normal,
    }
  }

  fn current() -> Self {
    Self::from_u8(OUTPUT_MODE.load(Ordering::SeqCst))
  }
}

/// Enum representing the color mode options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
  /// Use colors when the output stream is a terminal
  #[default]
  Auto,
  /// Never use colors
  Never,
  /// Always use colors
  Always,
}

impl ColorMode {
  /// Applies this mode to every `if_supports_color` call in the process.
  pub fn apply(self) {
    match self {
      ColorMode::Auto => owo_colors::unset_override(),
      ColorMode::Never => owo_colors::set_override(false),
      ColorMode::Always => owo_colors::set_override(true),
    }
  }
}

/// Sets the global verbose logging flag.
///
/// When verbose logging is enabled, the [`verbose_log!`](crate::verbose_log)
/// macro writes its messages to stderr.
pub fn set_verbose() {
  OUTPUT_MODE.store(OutputMode::Verbose as u8, Ordering::SeqCst);
}

/// Suppresses everything except errors and the final exit status.
pub fn set_quiet() {
  OUTPUT_MODE.store(OutputMode::Quiet as u8, Ordering::SeqCst);
}

/// Returns `true` if verbose logging is enabled.
pub fn is_verbose() -> bool {
  OutputMode::current() == OutputMode::Verbose
}

/// Returns `true` if quiet mode is enabled.
pub fn is_quiet() -> bool {
  OutputMode::current() == OutputMode::Quiet
}

/// Maps the `-v` count to a default tracing filter.
fn default_filter(quiet: bool, verbosity: u8) -> &'static str {
  if quiet {
    return "crtdebug=error";
  }
  match verbosity {
    0 | 1 => "crtdebug=warn",
    2 => "crtdebug=debug",
    _ => "crtdebug=trace",
  }
}

/// Installs the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the level derived from `quiet` and
/// `verbosity`. Calling this more than once is harmless; later calls are
/// ignored.
pub fn init_tracing(quiet: bool, verbosity: u8) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(quiet, verbosity)));

  if let Err(e) = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .try_init()
  {
    tracing::debug!("Tracing subscriber already installed: {}", e);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_filter_levels() {
    assert_eq!(default_filter(false, 0), "crtdebug=warn");
    assert_eq!(default_filter(false, 2), "crtdebug=debug");
    assert_eq!(default_filter(false, 7), "crtdebug=trace");
    assert_eq!(default_filter(true, 3), "crtdebug=error");
  }

  #[test]
  fn test_init_tracing_twice_keeps_the_first_subscriber() {
    init_tracing(false, 2);
    init_tracing(true, 0);
    assert!(tracing::dispatcher::has_been_set());
  }

  #[test]
  fn test_output_mode_from_u8_defaults_to_normal() {
    assert_eq!(OutputMode::from_u8(9), OutputMode::Normal);
  }
}
