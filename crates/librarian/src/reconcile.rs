//! Keeping the catalog in step with the papers folder.
//!
//! [`CatalogReconciler::reconcile`] makes the catalog's set of storage paths equal to the
//! set of PDFs on disk: records whose file is gone are removed, files without a record get
//! one. [`CatalogReconciler::import`] is the add-only variant and
//! [`CatalogReconciler::upload`] brings in a single file from elsewhere.
//!
//! Trashed records take part like any other: while their file exists they keep their
//! claim on its path, so the file is neither imported a second time nor replaced by an
//! upload.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use librarian::{
//!   database::Database,
//!   pdf::LopdfExtractor,
//!   reconcile::{CatalogReconciler, ReconcileOptions},
//! };
//!
//! # async fn example() -> Result<(), librarian::error::LibrarianError> {
//! let db = Database::open(Database::default_path()).await?;
//! let reconciler = CatalogReconciler::new(Arc::new(LopdfExtractor::new()));
//! let report = reconciler
//!   .reconcile(&db, "/home/me/Documents/librarian".as_ref(), "papers".as_ref(), ReconcileOptions::default())
//!   .await?;
//! println!("{} added, {} removed, {} kept", report.added, report.removed_invalid, report.kept);
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeSet, HashSet};

use glob::{MatchOptions, Pattern};
use tokio::io::AsyncWriteExt;

use super::*;

/// Knobs for a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
  /// Treat a missing papers folder as empty instead of failing.
  ///
  /// This removes every record that has a storage path.
  pub allow_missing_folder: bool,
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
  /// Records created for files that had none
  pub added:           usize,
  /// Records removed because their file is gone, or duplicated another's path
  pub removed_invalid: usize,
  /// Records left in place
  pub kept:            usize,
}

/// What an import did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
  /// Files that got a new record
  pub imported: usize,
  /// Files already claimed by a record
  pub skipped:  usize,
}

/// Catalog changes computed by [`CatalogReconciler::plan`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
  /// Ids of records to remove
  pub removals:   Vec<i64>,
  /// Records to create
  pub insertions: Vec<NewRecord>,
  /// Number of records left in place
  pub kept:       usize,
}

impl ReconcilePlan {
  /// The plan as one atomic batch.
  pub fn into_batch(self) -> Batch {
    let mut batch = self.removals.into_iter().fold(Batch::new(), Batch::remove);
    batch.extend(self.insertions);
    batch
  }
}

/// Computes and commits catalog changes from the contents of the papers folder.
#[derive(Clone)]
pub struct CatalogReconciler {
  /// Metadata for new records
  resolver:  MetadataResolver,
  /// First-page reader handed to the resolver
  extractor: Arc<dyn PdfTextExtractor>,
}

impl CatalogReconciler {
  /// Creates a reconciler reading PDFs through `extractor`.
  pub fn new(extractor: Arc<dyn PdfTextExtractor>) -> Self {
    Self { resolver: MetadataResolver::new(), extractor }
  }

  /// Aligns the catalog with the PDFs in `root/papers_folder`.
  ///
  /// All removals and insertions are committed in one transaction. A missing folder fails
  /// with [`LibrarianError::LibraryFolderMissing`] unless
  /// [`ReconcileOptions::allow_missing_folder`] is set.
  pub async fn reconcile(
    &self,
    db: &Database,
    root: &Path,
    papers_folder: &Path,
    options: ReconcileOptions,
  ) -> Result<ReconcileReport> {
    let on_disk = scan(root, papers_folder, options.allow_missing_folder)?;
    let records = Query::all().execute(db).await?;

    let plan = {
      let reconciler = self.clone();
      let root = root.to_path_buf();
      tokio::task::spawn_blocking(move || reconciler.plan(&records, &on_disk, &root)).await?
    };
    let kept = plan.kept;

    let outcome = plan.into_batch().execute(db).await?;
    let report =
      ReconcileReport { added: outcome.inserted.len(), removed_invalid: outcome.removed, kept };
    info!(
      "Synced {}: {} added, {} removed, {} kept",
      root.join(papers_folder).display(),
      report.added,
      report.removed_invalid,
      report.kept
    );
    Ok(report)
  }

  /// Computes the changes that make `records` match `on_disk`.
  ///
  /// `on_disk` holds paths relative to `root`. When two records normalize to the same
  /// path, an active record keeps it over a trashed one, then the older one wins.
  pub fn plan(&self, records: &[CatalogRecord], on_disk: &[String], root: &Path) -> ReconcilePlan {
    let on_disk: BTreeSet<String> = on_disk.iter().map(|path| normalize_path(path)).collect();

    let mut records: Vec<&CatalogRecord> = records.iter().collect();
    records.sort_by_key(|record| (record.is_deleted(), record.id));

    let mut plan = ReconcilePlan::default();
    let mut claimed = HashSet::new();
    for record in records {
      match record.normalized_path() {
        Some(path) if on_disk.contains(&path) =>
          if claimed.insert(path) {
            plan.kept += 1;
          } else {
            debug!("Removing record {}: duplicate of an older record's path", record.id);
            plan.removals.push(record.id);
          },
        Some(path) => {
          debug!("Removing record {}: {path} is missing", record.id);
          plan.removals.push(record.id);
        },
        None => {
          debug!("Removing record {}: no storage path", record.id);
          plan.removals.push(record.id);
        },
      }
    }

    plan.insertions = on_disk
      .iter()
      .filter(|path| !claimed.contains(*path))
      .map(|path| NewRecord::from_resolved(path, self.resolve(root, path)))
      .collect();
    plan
  }

  /// Adds a record for every PDF in `root/papers_folder` that no record claims yet.
  ///
  /// Nothing is removed.
  pub async fn import(&self, db: &Database, root: &Path, papers_folder: &Path) -> Result<ImportReport> {
    let on_disk = scan(root, papers_folder, false)?;
    let claimed: HashSet<String> =
      Query::all().execute(db).await?.iter().filter_map(CatalogRecord::normalized_path).collect();

    let (skipped, new): (Vec<String>, Vec<String>) =
      on_disk.into_iter().partition(|path| claimed.contains(path));

    let insertions = {
      let reconciler = self.clone();
      let root = root.to_path_buf();
      tokio::task::spawn_blocking(move || {
        new
          .iter()
          .map(|path| NewRecord::from_resolved(path, reconciler.resolve(&root, path)))
          .collect::<Vec<_>>()
      })
      .await?
    };

    let mut batch = Batch::new();
    batch.extend(insertions);
    let outcome = batch.execute(db).await?;

    let report = ImportReport { imported: outcome.inserted.len(), skipped: skipped.len() };
    info!(
      "Imported from {}: {} new, {} already known",
      root.join(papers_folder).display(),
      report.imported,
      report.skipped
    );
    Ok(report)
  }

  /// Copies the PDF at `source` into `root/papers_folder` and catalogs it.
  ///
  /// Fails with [`LibrarianError::InvalidUpload`] for anything but a `.pdf` file or when a
  /// different file already sits at the destination, and with
  /// [`LibrarianError::DuplicatePath`] if any record, trashed or not, claims the
  /// destination. Nothing is copied in these cases. A `source` that already is the
  /// destination is cataloged in place.
  pub async fn upload(
    &self,
    db: &Database,
    root: &Path,
    papers_folder: &Path,
    source: &Path,
  ) -> Result<CatalogRecord> {
    if !has_pdf_extension(source) {
      return Err(LibrarianError::InvalidUpload(format!(
        "{} is not a PDF file",
        source.display()
      )));
    }
    let file_name = source
      .file_name()
      .ok_or_else(|| LibrarianError::InvalidUpload(format!("{} has no file name", source.display())))?;
    if !source.is_file() {
      return Err(LibrarianError::InvalidUpload(format!("{} does not exist", source.display())));
    }

    let storage_path = normalize_path(&papers_folder.join(file_name).to_string_lossy());
    if !Query::by_path(&storage_path).execute(db).await?.is_empty() {
      return Err(LibrarianError::DuplicatePath(storage_path));
    }

    let destination = root.join(&storage_path);
    if is_same_file(source, &destination).await? {
      debug!("{} is already in the papers folder, cataloging it in place", source.display());
    } else {
      copy_new(source, &destination).await?;
    }

    let metadata = {
      let reconciler = self.clone();
      let root = root.to_path_buf();
      let storage_path = storage_path.clone();
      tokio::task::spawn_blocking(move || reconciler.resolve(&root, &storage_path)).await?
    };

    let record = Add::record(NewRecord::from_resolved(&storage_path, metadata)).execute(db).await?;
    info!("Uploaded {} as paper {} ({})", source.display(), record.id, record.title);
    Ok(record)
  }

  /// Metadata for the file at `root/path`, degrading to the file name if resolution fails.
  fn resolve(&self, root: &Path, path: &str) -> ResolvedMetadata {
    self.resolver.resolve(&root.join(path), self.extractor.as_ref()).unwrap_or_else(|e| {
      warn!("Could not resolve metadata for {path}, using its file name: {e}");
      ResolvedMetadata::filename_only(Path::new(path))
    })
  }
}

/// Lists the PDFs directly inside `root/papers_folder` as sorted, forward-slash paths
/// relative to `root`.
///
/// The extension match is case-insensitive and subfolders are not descended into.
pub fn scan(root: &Path, papers_folder: &Path, allow_missing_folder: bool) -> Result<Vec<String>> {
  let folder = root.join(papers_folder);
  if !folder.is_dir() {
    if allow_missing_folder {
      warn!("{} does not exist, treating it as empty", folder.display());
      return Ok(Vec::new());
    }
    return Err(LibrarianError::LibraryFolderMissing(folder));
  }

  let pattern = format!("{}/*.pdf", Pattern::escape(&folder.to_string_lossy()));
  let options = MatchOptions { case_sensitive: false, ..MatchOptions::new() };

  let mut paths = BTreeSet::new();
  for entry in glob::glob_with(&pattern, options)? {
    let path = match entry {
      Ok(path) => path,
      Err(e) => {
        warn!("Skipping unreadable entry while scanning {}: {e}", folder.display());
        continue;
      },
    };
    if !path.is_file() {
      continue;
    }
    let relative = path.strip_prefix(root).unwrap_or(&path);
    paths.insert(normalize_path(&relative.to_string_lossy()));
  }

  trace!("Found {} PDFs in {}", paths.len(), folder.display());
  Ok(paths.into_iter().collect())
}

/// Whether both paths name the same existing file.
async fn is_same_file(a: &Path, b: &Path) -> Result<bool> {
  if !b.exists() {
    return Ok(false);
  }
  Ok(tokio::fs::canonicalize(a).await? == tokio::fs::canonicalize(b).await?)
}

/// Copies `source` to a `destination` that must not exist yet.
///
/// A partially written destination is removed again.
async fn copy_new(source: &Path, destination: &Path) -> Result<()> {
  if let Some(parent) = destination.parent() {
    tokio::fs::create_dir_all(parent).await?;
  }
  let mut target =
    match tokio::fs::OpenOptions::new().write(true).create_new(true).open(destination).await {
      Ok(file) => file,
      Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists =>
        return Err(LibrarianError::InvalidUpload(format!(
          "{} already exists, sync the library to catalog it",
          destination.display()
        ))),
      Err(e) => return Err(e.into()),
    };

  let copied = async {
    let mut reader = tokio::fs::File::open(source).await?;
    tokio::io::copy(&mut reader, &mut target).await?;
    target.flush().await
  }
  .await;
  if let Err(e) = copied {
    if let Err(cleanup) = tokio::fs::remove_file(destination).await {
      warn!("Could not remove partial copy {}: {cleanup}", destination.display());
    }
    return Err(e.into());
  }
  Ok(())
}

fn has_pdf_extension(path: &Path) -> bool {
  path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
