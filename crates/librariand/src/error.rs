//! Error types for the command line interface.

use thiserror::Error;

use super::*;

/// Errors that can occur while running a command.
#[derive(Error, Debug)]
pub enum LibrariandError {
  /// The library itself failed.
  #[error(transparent)]
  Librarian(#[from] LibrarianError),

  /// Reading the user's answer to a prompt failed.
  #[error(transparent)]
  Dialoguer(#[from] dialoguer::Error),

  /// File system operations failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// Rendering JSON output failed.
  #[error(transparent)]
  Serde(#[from] serde_json::Error),

  /// Globbing for catalog files failed.
  #[error(transparent)]
  Glob(#[from] glob::PatternError),

  /// No configuration exists yet.
  #[error("No configuration found in {}. Run `librarian init` first.", .0.display())]
  NotInitialized(PathBuf),
}

/// Type alias for Result with [`LibrariandError`] as the error type.
pub type Result<T> = core::result::Result<T, LibrariandError>;
