//! Local SQLite catalog of paper records.
//!
//! The catalog is a single `records` table holding one row per [`CatalogRecord`]. The
//! schema is applied from `migrations/init.sql` every time the database is opened, so
//! opening is idempotent. Storage-path uniqueness among records outside the trash is
//! enforced by a partial unique index, and a violation surfaces as
//! [`LibrarianError::DuplicatePath`].
//!
//! Operations are expressed as instructions implementing [`DatabaseInstruction`]:
//!
//! - [`Add`] inserts one record
//! - [`Query`] reads records by id, path or lifecycle state
//! - [`Update`] writes back all or a scoped set of the mutable fields of one record
//! - [`Remove`] hard-deletes records
//! - [`Batch`] commits removals and insertions in a single transaction
//!
//! # Examples
//!
//! ```no_run
//! use librarian::{database::*, prelude::*};
//!
//! # async fn example() -> Result<(), LibrarianError> {
//! let db = Database::open(Database::default_path()).await?;
//! for record in Query::active().execute(&db).await? {
//!   println!("{}: {}", record.id, record.title);
//! }
//! # Ok(())
//! # }
//! ```

use tokio_rusqlite::Connection;

use super::*;

pub mod instruction;
mod models;

pub use self::instruction::{
  add::Add,
  batch::{Batch, BatchOutcome},
  query::{OrderField, Query, QueryCriteria},
  remove::{Remove, RemoveOptions},
  update::{Update, UpdateColumns},
  DatabaseInstruction,
};

/// Handle to the catalog database.
///
/// The underlying connection is shared and every instruction borrows the handle
/// immutably, so independent operations can be issued concurrently.
#[derive(Clone)]
pub struct Database {
  /// Async SQLite connection handle
  pub conn: Connection,
}

impl Database {
  /// Opens the catalog at `path`, creating the file and schema if needed.
  ///
  /// Parent directories are created as required.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path).await?;
    conn
      .call(|conn| {
        conn.execute_batch(include_str!(concat!(
          env!("CARGO_MANIFEST_DIR"),
          "/migrations/init.sql"
        )))?;
        Ok(())
      })
      .await?;

    debug!("Opened catalog at {}", path.display());
    Ok(Self { conn })
  }

  /// Returns the default path for the catalog file.
  ///
  /// - On Unix: `~/.local/share/librarian/librarian.db`
  /// - On macOS: `~/Library/Application Support/librarian/librarian.db`
  /// - On Windows: `%APPDATA%\librarian\librarian.db`
  /// - Fallback: `./librarian/librarian.db`
  pub fn default_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("librarian").join("librarian.db")
  }
}

/// Whether `error` is a violation of a `UNIQUE` index.
fn is_unique_violation(error: &rusqlite::Error) -> bool {
  matches!(
    error,
    rusqlite::Error::SqliteFailure(failure, _)
      if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}
