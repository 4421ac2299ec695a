//! Subcommands of the `librarian` executable, one module per area.

use super::*;

pub mod analyze;
pub mod clean;
pub mod init;
pub mod papers;
pub mod sync;
pub mod trash;

pub use analyze::{analyze, snapshot, AnalyzeOptions, SnapshotOptions};
pub use clean::clean;
pub use init::{init, InitOptions};
pub use papers::{list, pdf, read, show, ListOptions, ReadOptions};
pub use sync::{import, sync, upload, SyncOptions, UploadOptions};
pub use trash::{empty_trash, purge, restore, trash};

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Write a configuration and create an empty library
  Init(InitOptions),

  /// Make the catalog match the PDFs in the papers folder
  Sync(SyncOptions),

  /// Catalog new PDFs in the papers folder without removing anything
  Import,

  /// Copy a PDF into the papers folder and catalog it
  Upload(UploadOptions),

  /// List the papers in the catalog
  List(ListOptions),

  /// Display every detail of a paper
  Show(PaperOptions),

  /// Set or toggle the reading status of a paper
  Read(ReadOptions),

  /// Print the location of a paper's PDF
  Pdf(PaperOptions),

  /// Analyze a paper with the configured model, or show its stored analysis
  Analyze(AnalyzeOptions),

  /// Display the sections of a paper's stored analysis
  Snapshot(SnapshotOptions),

  /// Move a paper to the trash
  Trash(PaperOptions),

  /// Bring a paper back from the trash
  Restore(PaperOptions),

  /// Delete a paper and its PDF for good
  Purge(PaperOptions),

  /// Purge every paper in the trash
  EmptyTrash,

  /// Removes the catalog database after confirmation
  Clean,
}

/// Selects a single paper.
#[derive(Args, Clone)]
pub struct PaperOptions {
  /// Paper id, as shown by `librarian list`
  pub id: i64,
}
