//! Hard deletion of records.
//!
//! Removal deletes catalog rows only. Deleting backing files is the caller's business,
//! see [`Librarian::purge`](crate::Librarian::purge).
//!
//! # Examples
//!
//! ```no_run
//! use librarian::{
//!   database::{Database, Query, Remove},
//!   prelude::*,
//! };
//!
//! # async fn example(db: &Database) -> Result<(), LibrarianError> {
//! // Preview which records would go
//! let doomed = Remove::from_query(Query::trashed()).dry_run().execute(db).await?;
//! println!("Would remove {} records", doomed.len());
//!
//! Remove::by_id(7).execute(db).await?;
//! # Ok(())
//! # }
//! ```

use super::*;

/// Configuration options for removal.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoveOptions {
  /// When true, reports what would be removed without modifying the catalog.
  pub dry_run: bool,
}

/// Removes every record selected by a [`Query`] and returns them.
#[derive(Debug, Clone)]
pub struct Remove {
  /// The query identifying records to remove
  query:   Query,
  /// Configuration options for the removal
  options: RemoveOptions,
}

impl Remove {
  /// Creates a remove instruction from an existing query.
  pub fn from_query(query: Query) -> Self { Self { query, options: RemoveOptions::default() } }

  /// Removes the record with `id`.
  pub fn by_id(id: i64) -> Self { Self::from_query(Query::by_id(id)) }

  /// Only reports what would be removed.
  pub fn dry_run(mut self) -> Self {
    self.options.dry_run = true;
    self
  }
}

#[async_trait]
impl DatabaseInstruction for Remove {
  type Output = Vec<CatalogRecord>;

  async fn execute(&self, db: &Database) -> Result<Self::Output> {
    let records = self.query.execute(db).await?;
    if self.options.dry_run || records.is_empty() {
      return Ok(records);
    }

    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    let removed = db
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut removed = 0;
        {
          let mut stmt = tx.prepare_cached("DELETE FROM records WHERE id = ?1")?;
          for id in &ids {
            removed += stmt.execute([id])?;
          }
        }
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    debug!("Removed {removed} records");
    Ok(records)
  }
}
