//! Insertion of a single record.

use super::*;

/// Inserts one new record.
///
/// Fails with [`LibrarianError::DuplicatePath`] when an active record already claims the
/// storage path.
///
/// # Examples
///
/// ```no_run
/// use librarian::{
///   database::{Add, Database},
///   prelude::*,
///   record::NewRecord,
///   resolver::ResolvedMetadata,
/// };
///
/// # async fn example(db: &Database) -> Result<(), LibrarianError> {
/// let metadata = ResolvedMetadata::filename_only("papers/attention.pdf".as_ref());
/// let record = Add::record(NewRecord::from_resolved("papers/attention.pdf", metadata))
///   .execute(db)
///   .await?;
/// println!("Stored as {}", record.id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Add {
  /// The record to insert
  record: NewRecord,
}

impl Add {
  /// Creates an instruction inserting `record`.
  pub fn record(record: NewRecord) -> Self { Self { record } }
}

#[async_trait]
impl DatabaseInstruction for Add {
  type Output = CatalogRecord;

  async fn execute(&self, db: &Database) -> Result<Self::Output> {
    let record = self.record.clone();
    let path = record.storage_path.clone();

    let inserted = db
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let id = match models::insert_record(&tx, &record, Utc::now()) {
          Ok(id) => id,
          Err(e) if is_unique_violation(&e) => return Ok(None),
          Err(e) => return Err(e.into()),
        };
        let inserted = models::select_record(&tx, id)?;
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    let inserted = inserted.ok_or(LibrarianError::DuplicatePath(path))?;
    debug!("Added record {} for {:?}", inserted.id, inserted.storage_path);
    Ok(inserted)
  }
}
