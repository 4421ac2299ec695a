//! Atomic multi-record changes.

use super::*;

/// Removals and insertions committed in one transaction.
///
/// Removals run first, so a path freed by a removal may be claimed by an insertion in the
/// same batch. If any statement fails the whole batch is rolled back; a path conflict is
/// reported as [`LibrarianError::DuplicatePath`].
///
/// # Examples
///
/// ```no_run
/// use librarian::{
///   database::{Batch, Database},
///   prelude::*,
///   record::NewRecord,
///   resolver::ResolvedMetadata,
/// };
///
/// # async fn example(db: &Database) -> Result<(), LibrarianError> {
/// let metadata = ResolvedMetadata::filename_only("papers/new_paper.pdf".as_ref());
/// let outcome = Batch::new()
///   .remove(3)
///   .insert(NewRecord::from_resolved("papers/new_paper.pdf", metadata))
///   .execute(db)
///   .await?;
/// println!("removed {}, inserted {:?}", outcome.removed, outcome.inserted);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Batch {
  /// Ids to hard-delete
  removals:   Vec<i64>,
  /// Records to insert
  insertions: Vec<NewRecord>,
}

/// What a committed [`Batch`] did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchOutcome {
  /// Number of rows deleted
  pub removed:  usize,
  /// Ids of the inserted records, in insertion order
  pub inserted: Vec<i64>,
}

impl Batch {
  /// Creates an empty batch.
  pub fn new() -> Self { Self::default() }

  /// Adds a removal.
  pub fn remove(mut self, id: i64) -> Self {
    self.removals.push(id);
    self
  }

  /// Adds an insertion.
  pub fn insert(mut self, record: NewRecord) -> Self {
    self.insertions.push(record);
    self
  }

  /// Whether the batch would change nothing.
  pub fn is_empty(&self) -> bool { self.removals.is_empty() && self.insertions.is_empty() }
}

impl Extend<NewRecord> for Batch {
  fn extend<T: IntoIterator<Item = NewRecord>>(&mut self, iter: T) { self.insertions.extend(iter) }
}

#[async_trait]
impl DatabaseInstruction for Batch {
  type Output = BatchOutcome;

  async fn execute(&self, db: &Database) -> Result<Self::Output> {
    if self.is_empty() {
      return Ok(BatchOutcome::default());
    }

    let removals = self.removals.clone();
    let insertions = self.insertions.clone();

    let committed = db
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut outcome = BatchOutcome::default();

        {
          let mut stmt = tx.prepare_cached("DELETE FROM records WHERE id = ?1")?;
          for id in &removals {
            outcome.removed += stmt.execute([id])?;
          }
        }

        let imported_at = Utc::now();
        for record in &insertions {
          match models::insert_record(&tx, record, imported_at) {
            Ok(id) => outcome.inserted.push(id),
            // dropping the transaction rolls everything back
            Err(e) if is_unique_violation(&e) => return Ok(Err(record.storage_path.clone())),
            Err(e) => return Err(e.into()),
          }
        }

        tx.commit()?;
        Ok(Ok(outcome))
      })
      .await?;

    let outcome = committed.map_err(LibrarianError::DuplicatePath)?;
    debug!("Committed batch: {} removed, {} inserted", outcome.removed, outcome.inserted.len());
    Ok(outcome)
  }
}
