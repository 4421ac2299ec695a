//! Write-back of a modified record.

use rusqlite::ToSql;

use super::*;

/// Which columns an [`Update`] writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateColumns {
  /// Every mutable column
  All,
  /// Reading progress only
  ReadStatus,
  /// Trash state only
  Lifecycle,
  /// The stored analysis and the bibliographic fields it propagates to
  Analysis,
}

/// Writes the mutable fields of a record back to the catalog.
///
/// Only the columns selected by [`UpdateColumns`] are written, so writers of unrelated
/// state do not undo each other. The id and import time are never changed. Fails with
/// [`LibrarianError::NotFound`] if the record no longer exists, and with
/// [`LibrarianError::DuplicatePath`] if the write would give two active records the same
/// storage path (for example restoring a trashed record whose path was claimed again in the
/// meantime).
#[derive(Debug, Clone)]
pub struct Update {
  /// Record state to persist
  record:  CatalogRecord,
  /// Columns taken from `record`
  columns: UpdateColumns,
}

impl Update {
  /// Creates an instruction persisting every mutable field of `record`.
  pub fn record(record: &CatalogRecord) -> Self {
    Self { record: record.clone(), columns: UpdateColumns::All }
  }

  /// Persists the reading progress of `record`.
  pub fn read_status(record: &CatalogRecord) -> Self {
    Self { record: record.clone(), columns: UpdateColumns::ReadStatus }
  }

  /// Persists whether `record` is in the trash.
  pub fn lifecycle(record: &CatalogRecord) -> Self {
    Self { record: record.clone(), columns: UpdateColumns::Lifecycle }
  }

  /// Persists the analysis of `record` and its bibliographic fields.
  pub fn analysis(record: &CatalogRecord) -> Self {
    Self { record: record.clone(), columns: UpdateColumns::Analysis }
  }
}

#[async_trait]
impl DatabaseInstruction for Update {
  type Output = ();

  async fn execute(&self, db: &Database) -> Result<Self::Output> {
    let record = self.record.clone();
    let columns = self.columns;
    let id = record.id;
    let path = record.storage_path.clone().unwrap_or_default();

    let changed = db
      .conn
      .call(move |conn| {
        let deleted_at = record.deleted_at();
        let (sql, values): (&str, Vec<&dyn ToSql>) = match columns {
          UpdateColumns::All => (
            "UPDATE records SET
               title = ?2, authors = ?3, journal = ?4, year = ?5, category = ?6,
               storage_path = ?7, source_filename = ?8, parse_method = ?9,
               parse_confidence = ?10, read_status = ?11, ai_analyzed = ?12,
               has_experiment_plan = ?13, analysis_payload = ?14,
               analysis_timestamp = ?15, deleted_at = ?16
             WHERE id = ?1",
            vec![
              &record.id as &dyn ToSql,
              &record.title,
              &record.authors,
              &record.journal,
              &record.year,
              &record.category,
              &record.storage_path,
              &record.source_filename,
              &record.parse_method,
              &record.parse_confidence,
              &record.read_status,
              &record.ai_analyzed,
              &record.has_experiment_plan,
              &record.analysis_payload,
              &record.analysis_timestamp,
              &deleted_at,
            ],
          ),
          UpdateColumns::ReadStatus => (
            "UPDATE records SET read_status = ?2 WHERE id = ?1",
            vec![&record.id as &dyn ToSql, &record.read_status],
          ),
          UpdateColumns::Lifecycle => (
            "UPDATE records SET deleted_at = ?2 WHERE id = ?1",
            vec![&record.id as &dyn ToSql, &deleted_at],
          ),
          UpdateColumns::Analysis => (
            "UPDATE records SET
               title = ?2, authors = ?3, journal = ?4, year = ?5, category = ?6,
               parse_method = ?7, parse_confidence = ?8, ai_analyzed = ?9,
               has_experiment_plan = ?10, analysis_payload = ?11, analysis_timestamp = ?12
             WHERE id = ?1",
            vec![
              &record.id as &dyn ToSql,
              &record.title,
              &record.authors,
              &record.journal,
              &record.year,
              &record.category,
              &record.parse_method,
              &record.parse_confidence,
              &record.ai_analyzed,
              &record.has_experiment_plan,
              &record.analysis_payload,
              &record.analysis_timestamp,
            ],
          ),
        };

        match conn.execute(sql, values.as_slice()) {
          Ok(changed) => Ok(Some(changed)),
          Err(e) if is_unique_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match changed {
      None => Err(LibrarianError::DuplicatePath(path)),
      Some(0) => Err(LibrarianError::NotFound(id)),
      Some(_) => {
        trace!("Updated {columns:?} of record {id}");
        Ok(())
      },
    }
  }
}
