//! Error types for the librarian library.
//!
//! Failures fall into a handful of families:
//! - Missing entities (unknown record ids, files that vanished from disk)
//! - Catalog storage (SQLite and its async wrapper)
//! - PDF decoding
//! - The external analysis call (network, malformed output, misconfiguration)
//!
//! Insufficient metadata evidence is never an error: resolver tiers degrade to empty
//! values or sentinels instead.
//!
//! # Examples
//!
//! ```no_run
//! use librarian::{error::LibrarianError, Librarian};
//!
//! # async fn example(librarian: &Librarian) -> Result<(), LibrarianError> {
//! match librarian.analyze(42, false).await {
//!   Err(LibrarianError::NotFound(id)) => println!("No paper with id {id}"),
//!   Err(LibrarianError::MalformedAnalysis(reason)) => println!("Bad analysis output: {reason}"),
//!   Err(e) => println!("Other error: {e}"),
//!   Ok(result) => println!("Analyzed (cached: {})", result.from_cache),
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Error type alias used for the [`librarian`](crate) crate.
pub type Result<T> = core::result::Result<T, LibrarianError>;

/// Errors that can occur when working with the librarian library.
#[derive(Error, Debug)]
pub enum LibrarianError {
  /// No catalog record exists with the given id.
  ///
  /// Surfaced to the boundary layer as a typed "missing entity" condition.
  #[error("No paper with id {0}")]
  NotFound(i64),

  /// A record refers to a file that is not on disk, or has no file at all.
  #[error("PDF file is missing: {}", .0.display())]
  MissingFile(PathBuf),

  /// The folder that should be scanned for PDFs does not exist.
  ///
  /// Reconciling against a missing folder would remove every record, so this is
  /// reported instead unless the caller explicitly opts into that behavior.
  #[error("Library folder does not exist: {}", .0.display())]
  LibraryFolderMissing(PathBuf),

  /// The record has no usable stored analysis.
  #[error("Paper {0} has not been analyzed")]
  NotAnalyzed(i64),

  /// Another active record already claims this storage path.
  #[error("A paper is already stored at \"{0}\"")]
  DuplicatePath(String),

  /// An uploaded file was rejected before it touched the library.
  #[error("Invalid upload: {0}")]
  InvalidUpload(String),

  /// A SQLite operation failed.
  #[error(transparent)]
  Sqlite(#[from] rusqlite::Error),

  /// An async SQLite operation failed.
  #[error(transparent)]
  AsyncSqlite(#[from] tokio_rusqlite::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// The PDF could not be decoded.
  ///
  /// This covers malformed or encrypted files, missing objects and undecodable
  /// content streams. Metadata resolution catches it and falls back to the filename.
  #[error(transparent)]
  Lopdf(#[from] lopdf::Error),

  /// A network request to the analysis endpoint failed, including timeouts.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// The PDF has no extractable text to analyze, as with scanned pages.
  #[error("No extractable text in {}", .0.display())]
  NoText(PathBuf),

  /// The analysis endpoint answered with an error status.
  #[error("API error: {0}")]
  Api(String),

  /// The analysis response could not be validated as structured data.
  #[error("Malformed analysis response: {0}")]
  MalformedAnalysis(String),

  /// A model was not specified for the LLM request.
  #[error("No model was chosen for the LLM.")]
  LLMMissingModel,

  /// No messages were provided in the LLM request.
  #[error("No messages were supplied to send to the LLM.")]
  LLMMissingMessage,

  /// JSON (de)serialization of a stored value failed.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// The configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// The configuration could not be written out.
  #[error(transparent)]
  TomlSer(#[from] toml::ser::Error),

  /// A glob pattern built from the library folder was invalid.
  #[error(transparent)]
  Glob(#[from] glob::PatternError),

  /// A blocking task panicked or was cancelled.
  #[error(transparent)]
  Join(#[from] tokio::task::JoinError),

  /// A stored or user-supplied value does not name a known variant.
  #[error("Invalid value: {0}")]
  InvalidValue(String),

  /// Invalid or incomplete configuration.
  #[error("{0}")]
  Config(String),
}

impl LibrarianError {
  /// Whether the error came from producing an analysis: the PDF's text, the external call
  /// or its output.
  ///
  /// These are the failures a caller may replace with a degraded result.
  pub fn is_analysis_failure(&self) -> bool {
    matches!(
      self,
      Self::Network(_)
        | Self::Api(_)
        | Self::MalformedAnalysis(_)
        | Self::LLMMissingModel
        | Self::LLMMissingMessage
        | Self::NoText(_)
        | Self::Lopdf(_)
    )
  }
}
