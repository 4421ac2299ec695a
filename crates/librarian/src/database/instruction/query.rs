//! Record lookups.

use super::*;

/// Which records a [`Query`] selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryCriteria {
  /// The record with this id, trashed or not
  Id(i64),
  /// Records whose normalized storage path equals this one, trashed or not
  Path(String),
  /// Every record
  All,
  /// Records outside the trash
  Active,
  /// Records in the trash
  Trashed,
}

/// Available fields for ordering query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
  /// Creation order
  Id,
  /// Title, case-insensitive
  Title,
  /// Import time
  ImportedAt,
  /// Publication year
  Year,
  /// Time of trashing
  DeletedAt,
}

impl OrderField {
  fn as_sql_str(&self) -> &'static str {
    match self {
      OrderField::Id => "id",
      OrderField::Title => "title COLLATE NOCASE",
      OrderField::ImportedAt => "imported_at",
      OrderField::Year => "year",
      OrderField::DeletedAt => "deleted_at",
    }
  }
}

/// A query for retrieving records from the catalog.
///
/// Results are ordered by id unless another [`OrderField`] is chosen.
#[derive(Debug, Clone)]
pub struct Query {
  criteria:   QueryCriteria,
  order_by:   OrderField,
  descending: bool,
}

impl Query {
  /// Creates a query with the given criteria.
  pub fn new(criteria: QueryCriteria) -> Self {
    Self { criteria, order_by: OrderField::Id, descending: false }
  }

  /// Selects the record with `id`.
  pub fn by_id(id: i64) -> Self { Self::new(QueryCriteria::Id(id)) }

  /// Selects records stored at `path`, compared in normalized form.
  pub fn by_path(path: impl AsRef<str>) -> Self {
    Self::new(QueryCriteria::Path(normalize_path(path.as_ref())))
  }

  /// Selects every record.
  pub fn all() -> Self { Self::new(QueryCriteria::All) }

  /// Selects records outside the trash.
  pub fn active() -> Self { Self::new(QueryCriteria::Active) }

  /// Selects records in the trash.
  pub fn trashed() -> Self { Self::new(QueryCriteria::Trashed) }

  /// Sets the field to order results by.
  pub fn order_by(mut self, field: OrderField) -> Self {
    self.order_by = field;
    self
  }

  /// Sets the order to descending (default is ascending).
  pub fn descending(mut self) -> Self {
    self.descending = true;
    self
  }

  fn build_sql(&self) -> (String, Vec<rusqlite::types::Value>) {
    use rusqlite::types::Value;

    let (filter, params) = match &self.criteria {
      QueryCriteria::Id(id) => ("WHERE id = ?1", vec![Value::Integer(*id)]),
      QueryCriteria::Path(path) =>
        ("WHERE REPLACE(storage_path, '\\', '/') = ?1", vec![Value::Text(path.clone())]),
      QueryCriteria::All => ("", Vec::new()),
      QueryCriteria::Active => ("WHERE deleted_at IS NULL", Vec::new()),
      QueryCriteria::Trashed => ("WHERE deleted_at IS NOT NULL", Vec::new()),
    };
    let direction = if self.descending { "DESC" } else { "ASC" };
    let sql = format!(
      "SELECT {} FROM records {} ORDER BY {} {}, id {}",
      models::RECORD_COLUMNS,
      filter,
      self.order_by.as_sql_str(),
      direction,
      direction
    );
    (sql, params)
  }
}

#[async_trait]
impl DatabaseInstruction for Query {
  type Output = Vec<CatalogRecord>;

  async fn execute(&self, db: &Database) -> Result<Self::Output> {
    let (sql, params) = self.build_sql();
    trace!("Running query {:?}", self.criteria);

    let records = db
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&sql)?;
        let records = stmt
          .query_map(params_from_iter(params), CatalogRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
      })
      .await?;

    Ok(records)
  }
}
