//! Row mapping between the `records` table and [`CatalogRecord`].

use rusqlite::{params, Row};

use super::*;

/// Column list shared by every `SELECT` that builds a [`CatalogRecord`].
pub(crate) const RECORD_COLUMNS: &str = "id, title, authors, journal, year, category, \
                                         storage_path, source_filename, parse_method, \
                                         parse_confidence, read_status, ai_analyzed, \
                                         has_experiment_plan, analysis_payload, \
                                         analysis_timestamp, imported_at, deleted_at";

impl CatalogRecord {
  /// Builds a record from a row selected with [`RECORD_COLUMNS`].
  pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    let deleted_at: Option<DateTime<Utc>> = row.get(16)?;
    Ok(Self {
      id:                  row.get(0)?,
      title:               row.get(1)?,
      authors:             row.get(2)?,
      journal:             row.get(3)?,
      year:                row.get(4)?,
      category:            row.get(5)?,
      storage_path:        row.get(6)?,
      source_filename:     row.get(7)?,
      parse_method:        row.get(8)?,
      parse_confidence:    row.get(9)?,
      read_status:         row.get(10)?,
      ai_analyzed:         row.get(11)?,
      has_experiment_plan: row.get(12)?,
      analysis_payload:    row.get(13)?,
      analysis_timestamp:  row.get(14)?,
      imported_at:         row.get(15)?,
      lifecycle:           match deleted_at {
        Some(deleted_at) => Lifecycle::Trashed { deleted_at },
        None => Lifecycle::Active,
      },
    })
  }
}

/// Inserts `record` and returns its new id.
pub(crate) fn insert_record(
  conn: &rusqlite::Connection,
  record: &NewRecord,
  imported_at: DateTime<Utc>,
) -> rusqlite::Result<i64> {
  let mut stmt = conn.prepare_cached(
    "INSERT INTO records (
       title, authors, year, category, storage_path, source_filename,
       parse_method, parse_confidence, imported_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
  )?;
  stmt.execute(params![
    record.title,
    record.authors,
    record.year,
    record.category,
    record.storage_path,
    record.source_filename,
    record.parse_method,
    record.parse_confidence,
    imported_at,
  ])?;
  Ok(conn.last_insert_rowid())
}

/// Loads one record by id.
pub(crate) fn select_record(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Option<CatalogRecord>> {
  let mut stmt = conn.prepare_cached(&format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"))?;
  let mut rows = stmt.query_map([id], CatalogRecord::from_row)?;
  rows.next().transpose()
}
