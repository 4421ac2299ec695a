//! A personal library of research papers.
//!
//! `librarian` keeps a catalog of the PDFs in a folder and maintains, per paper:
//!
//! - Bibliographic metadata recovered from unreliable evidence (file names, first-page
//!   layout) with an explicit confidence level
//! - Reading progress and a trash that can be restored from or emptied
//! - A cached, versioned structured analysis produced by an external language model
//!
//! # Features
//!
//! - **Tiered metadata resolution**: file-name heuristics first, then font-size and
//!   position cues on the first page; confidence only ever goes up
//! - **Reconciliation**: one atomic pass makes the catalog match the folder, removing
//!   records whose file is gone and adding records for new files
//! - **Analysis cache**: the expensive model call runs once per paper unless a refresh is
//!   forced, and its bibliographic facts are copied onto the record
//! - **Snapshots**: display-ready sections rebuilt from a stored analysis, versioned by a
//!   content hash, without calling the model again
//!
//! # Getting Started
//!
//! ```no_run
//! use librarian::{reconcile::ReconcileOptions, Config, Librarian};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let config = Config::default().with_library_root("/home/me/Documents/librarian");
//!   let librarian = Librarian::builder().with_config(config).build().await?;
//!
//!   let report = librarian.sync(ReconcileOptions::default()).await?;
//!   println!("{} new papers", report.added);
//!
//!   for paper in librarian.papers().await? {
//!     println!("[{}] {} ({})", paper.id, paper.title, paper.parse_confidence);
//!   }
//!
//!   let analysis = librarian.analyze(1, false).await?;
//!   let snapshot = librarian.snapshot(analysis.paper_id).await?;
//!   println!("{} sections, version {}", snapshot.snapshot.sections.len(), snapshot.snapshot.version);
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`resolver`]: Title and author resolution from file names and first-page layout
//! - [`reconcile`]: Folder scanning, sync, import and upload
//! - [`analysis`]: Analysis payloads, the cache, snapshots and the analyzer
//! - [`database`]: The SQLite catalog and its instructions
//! - [`record`]: Catalog record types
//! - [`pdf`]: PDF text extraction
//! - [`llm`]: Chat endpoint client
//! - [`config`]: Library configuration
//! - [`prelude`]: Common traits and types for ergonomic imports

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  fmt::Display,
  path::{Path, PathBuf},
  str::FromStr,
  sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod analysis;
pub mod config;
pub mod database;
pub mod error;
pub mod llm;
pub mod lock;
pub mod pdf;
pub mod reconcile;
pub mod record;
pub mod resolver;

use crate::{
  analysis::*, database::*, error::*, llm::*, lock::*, pdf::*, reconcile::*, record::*, resolver::*,
};
pub use crate::config::{AnalysisConfig, Config, CONFIG_FILE};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use librarian::{database::Query, prelude::*, Librarian};
///
/// async fn example(librarian: &Librarian) -> Result<(), LibrarianError> {
///   // `execute` comes from `DatabaseInstruction`
///   let trashed = Query::trashed().execute(&librarian.database).await?;
///   println!("{} papers in the trash", trashed.len());
///   Ok(())
/// }
/// ```
pub mod prelude {
  pub use crate::{database::DatabaseInstruction, error::LibrarianError};
}

/// An analysis as handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
  /// Paper the analysis belongs to
  pub paper_id:   i64,
  /// The paper's title after the analysis was applied
  pub title:      String,
  /// The analysis
  pub payload:    AnalysisPayload,
  /// Whether the stored analysis was served without calling the model
  pub from_cache: bool,
}

/// A snapshot of a paper's stored analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSnapshot {
  /// Paper the snapshot belongs to
  pub paper_id: i64,
  /// The paper's title
  pub title:    String,
  /// Sections and version
  pub snapshot: AnalysisSnapshot,
}

/// Counters over the visible catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
  /// Papers outside the trash
  pub total:            usize,
  /// Papers marked read
  pub read:             usize,
  /// Papers with a stored analysis
  pub ai_analyzed:      usize,
  /// Papers whose analysis includes an experiment plan
  pub experiment_plans: usize,
}

/// Entry point to a library: the catalog, its folder and the analyzer.
///
/// Every method takes `&self`. Analyses of the same paper are serialized, as are passes
/// that scan the papers folder; everything else runs concurrently.
pub struct Librarian {
  /// Settings the library was built with
  pub config:     Config,
  /// The catalog
  pub database:   Database,
  /// Sync, import and upload
  reconciler:     CatalogReconciler,
  /// Stored analyses
  cache:          AnalysisCache,
  /// Producer of fresh analyses
  analyzer:       Arc<dyn Analyzer>,
  /// At most one analysis in flight per paper
  analysis_locks: KeyedLocks<i64>,
  /// At most one scan per papers folder
  folder_locks:   KeyedLocks<PathBuf>,
}

/// Builder for [`Librarian`].
#[derive(Default)]
pub struct LibrarianBuilder {
  /// Directory holding `config.toml`
  config_dir: Option<PathBuf>,
  /// Explicit configuration
  config:     Option<Config>,
  /// PDF reader override
  extractor:  Option<Arc<dyn PdfTextExtractor>>,
  /// Analyzer override
  analyzer:   Option<Arc<dyn Analyzer>>,
}

impl LibrarianBuilder {
  /// Reads the configuration from `config.toml` in `dir`, or writes it there when a
  /// configuration is also given.
  pub fn with_path(mut self, dir: impl AsRef<Path>) -> Self {
    self.config_dir = Some(dir.as_ref().to_path_buf());
    self
  }

  /// Uses this configuration.
  pub fn with_config(mut self, config: Config) -> Self {
    self.config = Some(config);
    self
  }

  /// Reads PDFs through `extractor` instead of `lopdf`.
  pub fn with_extractor(mut self, extractor: Arc<dyn PdfTextExtractor>) -> Self {
    self.extractor = Some(extractor);
    self
  }

  /// Produces analyses with `analyzer` instead of the configured chat endpoint.
  pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
    self.analyzer = Some(analyzer);
    self
  }

  /// Opens the catalog and assembles the library.
  pub async fn build(self) -> Result<Librarian> {
    let config = match (self.config, &self.config_dir) {
      (Some(config), Some(dir)) => {
        config.save(dir.join(CONFIG_FILE))?;
        config
      },
      (Some(config), None) => config,
      (None, Some(dir)) => Config::load(dir.join(CONFIG_FILE))?,
      (None, None) => Config::default(),
    };

    let database = Database::open(&config.database_path).await?;
    let extractor = self.extractor.unwrap_or_else(|| Arc::new(LopdfExtractor::new()));
    let analyzer = self.analyzer.unwrap_or_else(|| {
      let completion = Arc::new(ChatClient::new(config.analysis.clone()));
      Arc::new(PaperAnalyzer::new(Arc::clone(&extractor), completion, &config.analysis))
    });

    debug!("Library at {} with catalog {}", config.papers_dir().display(), config.database_path.display());
    Ok(Librarian {
      reconciler: CatalogReconciler::new(extractor),
      cache: AnalysisCache::new(database.clone()),
      analyzer,
      analysis_locks: KeyedLocks::new(),
      folder_locks: KeyedLocks::new(),
      database,
      config,
    })
  }
}

impl Librarian {
  /// Starts building a library.
  pub fn builder() -> LibrarianBuilder { LibrarianBuilder::default() }

  /// Opens the library configured in `config_dir`.
  pub async fn from_path(config_dir: impl AsRef<Path>) -> Result<Self> {
    Self::builder().with_path(config_dir).build().await
  }

  /// Aligns the catalog with the papers folder.
  pub async fn sync(&self, options: ReconcileOptions) -> Result<ReconcileReport> {
    let _guard = self.folder_locks.lock(self.config.papers_dir()).await;
    self
      .reconciler
      .reconcile(&self.database, &self.config.library_root, &self.config.papers_folder, options)
      .await
  }

  /// Adds records for PDFs in the papers folder that have none, removing nothing.
  pub async fn import(&self) -> Result<ImportReport> {
    let _guard = self.folder_locks.lock(self.config.papers_dir()).await;
    self.reconciler.import(&self.database, &self.config.library_root, &self.config.papers_folder).await
  }

  /// Copies a PDF into the papers folder and catalogs it.
  pub async fn upload(&self, source: impl AsRef<Path>) -> Result<CatalogRecord> {
    let _guard = self.folder_locks.lock(self.config.papers_dir()).await;
    self
      .reconciler
      .upload(&self.database, &self.config.library_root, &self.config.papers_folder, source.as_ref())
      .await
  }

  /// Papers outside the trash, most recently imported first.
  pub async fn papers(&self) -> Result<Vec<CatalogRecord>> {
    Query::active().order_by(OrderField::ImportedAt).descending().execute(&self.database).await
  }

  /// Papers in the trash, most recently trashed first.
  pub async fn trashed(&self) -> Result<Vec<CatalogRecord>> {
    Query::trashed().order_by(OrderField::DeletedAt).descending().execute(&self.database).await
  }

  /// Counters over the papers outside the trash.
  pub async fn stats(&self) -> Result<CatalogStats> {
    let papers = Query::active().execute(&self.database).await?;
    Ok(CatalogStats {
      total:            papers.len(),
      read:             papers.iter().filter(|p| p.is_read()).count(),
      ai_analyzed:      papers.iter().filter(|p| p.ai_analyzed).count(),
      experiment_plans: papers.iter().filter(|p| p.has_experiment_plan).count(),
    })
  }

  /// The record with `id`, trashed or not.
  pub async fn get(&self, id: i64) -> Result<CatalogRecord> {
    Query::by_id(id).execute(&self.database).await?.pop().ok_or(LibrarianError::NotFound(id))
  }

  /// Sets the reading progress of a paper.
  pub async fn set_read_status(&self, id: i64, status: ReadStatus) -> Result<CatalogRecord> {
    let mut record = self.get(id).await?;
    record.read_status = status;
    Update::read_status(&record).execute(&self.database).await?;
    Ok(record)
  }

  /// Marks an unfinished paper read, or a read paper unread.
  pub async fn toggle_read(&self, id: i64) -> Result<CatalogRecord> {
    let record = self.get(id).await?;
    self.set_read_status(id, record.read_status.toggled()).await
  }

  /// Absolute path of a paper's PDF.
  ///
  /// Fails with [`LibrarianError::MissingFile`] when the record has no file or the file is
  /// gone.
  pub async fn pdf_path(&self, id: i64) -> Result<PathBuf> { self.locate(&self.get(id).await?) }

  /// Returns a paper's analysis, running the analyzer unless one is stored.
  ///
  /// With `force_refresh` a stored analysis is replaced. Concurrent calls for the same
  /// paper wait for each other; the catalog is not locked while the analyzer runs.
  pub async fn analyze(&self, id: i64, force_refresh: bool) -> Result<AnalysisResult> {
    let _guard = self.analysis_locks.lock(id).await;
    let mut record = self.get(id).await?;

    // a stored analysis outlives its file
    if !force_refresh {
      if let Some(payload) = AnalysisCache::cached(&record) {
        debug!("Using stored analysis of paper {id}");
        return Ok(AnalysisResult { paper_id: id, title: record.title, payload, from_cache: true });
      }
    }

    let pdf_path = self.locate(&record)?;
    let outcome =
      self.cache.get_or_analyze(&mut record, force_refresh, self.analyzer.as_ref(), &pdf_path).await?;
    Ok(AnalysisResult {
      paper_id:   id,
      title:      record.title,
      payload:    outcome.payload,
      from_cache: outcome.from_cache,
    })
  }

  /// Like [`Librarian::analyze`], but an analysis failure yields a degraded payload built
  /// from the record instead of an error.
  ///
  /// Nothing is stored for a degraded result and the record stays unanalyzed.
  pub async fn analyze_or_degrade(&self, id: i64, force_refresh: bool) -> Result<AnalysisResult> {
    match self.analyze(id, force_refresh).await {
      Err(e) if e.is_analysis_failure() => {
        warn!("Analysis of paper {id} failed, returning a degraded result: {e}");
        let record = self.get(id).await?;
        Ok(AnalysisResult {
          paper_id:   id,
          payload:    AnalysisPayload::degraded(&record, &e.to_string()),
          title:      record.title,
          from_cache: false,
        })
      },
      result => result,
    }
  }

  /// Rebuilds the display snapshot of a paper's stored analysis.
  ///
  /// Never calls the analyzer. Fails with [`LibrarianError::NotAnalyzed`] when no readable
  /// analysis is stored.
  pub async fn snapshot(&self, id: i64) -> Result<PaperSnapshot> {
    let record = self.get(id).await?;
    let payload = AnalysisCache::cached(&record).ok_or(LibrarianError::NotAnalyzed(id))?;
    Ok(PaperSnapshot { paper_id: id, title: record.title, snapshot: SnapshotBuilder::build(&payload)? })
  }

  /// Moves a paper to the trash. Trashing a trashed paper changes nothing.
  pub async fn trash(&self, id: i64) -> Result<CatalogRecord> {
    let mut record = self.get(id).await?;
    if record.is_deleted() {
      return Ok(record);
    }
    record.lifecycle = Lifecycle::Trashed { deleted_at: Utc::now() };
    Update::lifecycle(&record).execute(&self.database).await?;
    info!("Moved paper {id} to the trash");
    Ok(record)
  }

  /// Takes a paper out of the trash. Restoring an active paper changes nothing.
  ///
  /// Fails with [`LibrarianError::DuplicatePath`] if another paper has claimed the file's
  /// path in the meantime.
  pub async fn restore(&self, id: i64) -> Result<CatalogRecord> {
    let mut record = self.get(id).await?;
    if !record.is_deleted() {
      return Ok(record);
    }
    record.lifecycle = Lifecycle::Active;
    Update::lifecycle(&record).execute(&self.database).await?;
    info!("Restored paper {id}");
    Ok(record)
  }

  /// Deletes a paper and, if no other record uses it, its PDF.
  ///
  /// The record is removed first. Failing to remove the file is logged and does not undo
  /// the removal.
  pub async fn purge(&self, id: i64) -> Result<CatalogRecord> {
    let record =
      Remove::by_id(id).execute(&self.database).await?.pop().ok_or(LibrarianError::NotFound(id))?;
    self.delete_unused_file(&record).await?;
    info!("Purged paper {id}");
    Ok(record)
  }

  /// Purges every paper in the trash and returns how many there were.
  ///
  /// All records go in one transaction, so a failure leaves the trash as it was. Their
  /// files are deleted afterwards on the same terms as [`Librarian::purge`].
  pub async fn empty_trash(&self) -> Result<usize> {
    let purged = Remove::from_query(Query::trashed()).execute(&self.database).await?;
    for record in &purged {
      if let Err(e) = self.delete_unused_file(record).await {
        warn!("Could not clean up the file of purged paper {}: {e}", record.id);
      }
    }
    info!("Emptied the trash ({} papers)", purged.len());
    Ok(purged.len())
  }

  /// Deletes the PDF of a removed record unless another record still uses its path.
  ///
  /// A file that cannot be deleted is logged and skipped.
  async fn delete_unused_file(&self, record: &CatalogRecord) -> Result<()> {
    let Some(storage_path) = record.normalized_path() else { return Ok(()) };
    if !Query::by_path(&storage_path).execute(&self.database).await?.is_empty() {
      debug!("Keeping {storage_path}, another record still uses it");
      return Ok(());
    }

    let path = self.config.library_root.join(&storage_path);
    match tokio::fs::remove_file(&path).await {
      Ok(()) => debug!("Deleted {}", path.display()),
      Err(e) => warn!("Could not delete {} for purged paper {}: {e}", path.display(), record.id),
    }
    Ok(())
  }

  /// Absolute path of an existing PDF backing `record`.
  fn locate(&self, record: &CatalogRecord) -> Result<PathBuf> {
    let storage_path =
      record.normalized_path().ok_or_else(|| LibrarianError::MissingFile(PathBuf::new()))?;
    let path = self.config.library_root.join(storage_path);
    if path.is_file() {
      Ok(path)
    } else {
      Err(LibrarianError::MissingFile(path))
    }
  }
}
