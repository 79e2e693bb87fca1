//! ## Features
//!
//! - Prefixed, colored log levels (info, warn, error, success, verbose)
//! - Multi-line message support with consistent formatting
//! - Process-wide verbosity gate set once from CLI flags
//! - Rules and banners for section headers
//! - All output to stderr so stdout stays clean for answers and data
//!
//! ## Usage
//!
//! Functions take `&str`: `info()`, `warn()`, `error()`, `success()`, `verbose()`.
//!
//! Macros take format arguments: `info!("saved {}", path.display())`.

use colored::*;
use std::sync::atomic::{AtomicU8, Ordering};

/// How much output the tools should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
  /// Only warnings and errors
  Quiet = 0,
  #[default]
  Normal = 1,
  /// Everything, including `verbose()` diagnostics
  Verbose = 2,
}

impl Verbosity {
  /// Map `-q` / `-v` style flags onto a verbosity
  pub fn from_flags(quiet: bool, verbose: bool) -> Self {
    if quiet {
      Verbosity::Quiet
    } else if verbose {
      Verbosity::Verbose
    } else {
      Verbosity::Normal
    }
  }

  fn from_u8(value: u8) -> Self {
    match value {
      0 => Verbosity::Quiet,
      2 => Verbosity::Verbose,
      _ => Verbosity::Normal,
    }
  }
}

/// Severity of a single log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Verbose,
  Info,
  Success,
  Warn,
  Error,
}

static VERBOSITY: AtomicU8 = AtomicU8::new(Verbosity::Normal as u8);

/// Set the process-wide verbosity
pub fn set_verbosity(verbosity: Verbosity) {
  VERBOSITY.store(verbosity as u8, Ordering::Relaxed);
}

/// Current process-wide verbosity
pub fn verbosity() -> Verbosity {
  Verbosity::from_u8(VERBOSITY.load(Ordering::Relaxed))
}

/// Whether a line at `level` should be printed under `verbosity`
pub fn is_enabled(level: Level, verbosity: Verbosity) -> bool {
  match level {
    Level::Warn | Level::Error => true,
    Level::Info | Level::Success => verbosity >= Verbosity::Normal,
    Level::Verbose => verbosity >= Verbosity::Verbose,
  }
}

/// Core output function, one stderr line per message line
pub fn log(message: &str) {
  for line in message.lines() {
    eprintln!("{line}");
  }
}

fn format_prefix(color: Color, prefix: &str) -> String {
  format!("[{}]{:<width$}", prefix.color(color).bold(), "", width = 7 - prefix.len() - 2)
}

fn emit(level: Level, message: &str) {
  if !is_enabled(level, verbosity()) {
    return;
  }

  let prefix = match level {
    Level::Verbose => format_prefix(Color::Cyan, "verb"),
    Level::Info => format_prefix(Color::Blue, "info"),
    Level::Success => format_prefix(Color::Green, "sccs"),
    Level::Warn => format_prefix(Color::Yellow, "warn"),
    Level::Error => format_prefix(Color::Red, "error"),
  };

  for line in message.lines() {
    log(&format!("{prefix} {line}"));
  }
}

pub fn verbose(message: &str) {
  emit(Level::Verbose, message);
}

/// General progress information
pub fn info(message: &str) {
  emit(Level::Info, message);
}

/// Something went wrong with one item, the run goes on
pub fn warn(message: &str) {
  emit(Level::Warn, message);
}

pub fn error(message: &str) {
  emit(Level::Error, message);
}

/// Something completed successfully
pub fn success(message: &str) {
  emit(Level::Success, message);
}

/// A horizontal rule of `length` copies of `ch`
pub fn rule(length: usize, ch: char) -> String {
  ch.to_string().repeat(length)
}

/// Display a message between two rules
pub fn as_banner<F>(log_fn: F, message: &str, width: Option<usize>, border_char: Option<char>)
where
  F: Fn(&str),
{
  let banner = rule(width.unwrap_or(50), border_char.unwrap_or('='));

  log_fn(&banner);
  log_fn(message);
  log_fn(&banner);
}

/// Section header for the start of a run
pub fn announce(message: &str) {
  if !is_enabled(Level::Info, verbosity()) {
    return;
  }
  as_banner(|msg| log(&msg.blue().bold().to_string()), message, Some(70), Some('='));
}

#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => {
    $crate::info(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! warn {
  ($($arg:tt)*) => {
    $crate::warn(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => {
    $crate::error(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => {
    $crate::success(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! verbose {
  ($($arg:tt)*) => {
    $crate::verbose(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! announce {
  ($($arg:tt)*) => {
    $crate::announce(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}
