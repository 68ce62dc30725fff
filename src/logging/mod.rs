//! # Logging Module
//!
//! Output plumbing for crtdebug:
//! - `verbose_log!` for per-file chatter on stderr, shown with `-v`
//! - `info_log!` for user-facing progress on stdout, hidden with `-q`
//! - a `tracing` subscriber for diagnostics, tuned by `-vv`/`-vvv` or
//!   `RUST_LOG`
//!
//! ## Example
//!
//! ```rust
//! use crtdebug::logging::{ColorMode, set_verbose};
//! use crtdebug::{info_log, verbose_log};
//!
//! set_verbose();
//! ColorMode::Never.apply();
//!
//! verbose_log!("Detected {} for {}", "UTF-8", "view.cpp");
//! info_log!("Inserted DEBUG_NEW block: {}", "view.cpp");
//! ```

mod modes;

pub use modes::{ColorMode, init_tracing, is_quiet, is_verbose, set_quiet, set_verbose};
use owo_colors::{OwoColorize, Stream};

/// Logs a message to stderr if verbose mode is enabled.
///
/// Uses the same format string syntax as [`eprintln!`].
#[macro_export]
macro_rules! verbose_log {
    ($($arg:tt)*) => {
        if $crate::logging::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}

/// Logs a message to stdout unless quiet mode is enabled.
///
/// Uses the same format string syntax as [`println!`].
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        if !$crate::logging::is_quiet() {
            $crate::logging::print_info_log(&format!($($arg)*));
        }
    };
}

/// Prints an info message, in yellow when stdout supports color.
///
/// Used by [`info_log!`](crate::info_log).
pub fn print_info_log(message: &str) {
  println!("{}", message.if_supports_color(Stream::Stdout, |m| m.yellow()));
}
