//! Reuse of stored analyses and write-back of fresh ones.

use super::*;

/// A payload and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
  /// The analysis
  pub payload:    AnalysisPayload,
  /// Whether the stored payload was returned without calling the analyzer
  pub from_cache: bool,
}

/// Serves analyses from the catalog, calling the analyzer only when needed.
///
/// A record is only ever marked analyzed together with a well-formed payload, and an
/// analyzer failure leaves both the in-memory record and the catalog row exactly as they
/// were.
#[derive(Clone)]
pub struct AnalysisCache {
  /// Catalog the fresh payloads are written to
  db: Database,
}

impl AnalysisCache {
  /// Creates a cache writing to `db`.
  pub fn new(db: Database) -> Self { Self { db } }

  /// Returns the stored analysis of `record`, or runs `analyzer` on `pdf_path` and stores
  /// the result.
  ///
  /// With `force_refresh` the stored payload is ignored. The payload is applied to the
  /// catalog row as it is after the analyzer returns and only the analysis and
  /// bibliographic columns are written. On success `record` is that row as persisted.
  pub async fn get_or_analyze(
    &self,
    record: &mut CatalogRecord,
    force_refresh: bool,
    analyzer: &dyn Analyzer,
    pdf_path: &Path,
  ) -> Result<AnalysisOutcome> {
    if !force_refresh {
      if let Some(payload) = Self::cached(record) {
        debug!("Using stored analysis of paper {}", record.id);
        return Ok(AnalysisOutcome { payload, from_cache: true });
      }
    }

    let payload = analyzer.analyze(pdf_path).await?;

    // the call can take minutes; trash and reading progress may have changed meanwhile
    let mut updated =
      Query::by_id(record.id).execute(&self.db).await?.pop().ok_or(LibrarianError::NotFound(record.id))?;
    Self::store(&mut updated, &payload, Utc::now())?;
    Update::analysis(&updated).execute(&self.db).await?;
    *record = updated;

    info!("Stored analysis of paper {} ({})", record.id, record.title);
    Ok(AnalysisOutcome { payload, from_cache: false })
  }

  /// The stored payload of an analyzed record.
  ///
  /// A stored payload that no longer parses is logged and treated as absent.
  pub fn cached(record: &CatalogRecord) -> Option<AnalysisPayload> {
    if !record.ai_analyzed {
      return None;
    }
    let json = record.analysis_payload.as_deref()?;
    match AnalysisPayload::from_json(json) {
      Ok(payload) => Some(payload),
      Err(e) => {
        warn!("Stored analysis of paper {} is unreadable: {e}", record.id);
        None
      },
    }
  }

  /// Writes `payload` onto `record` and copies its bibliographic facts over the record's.
  ///
  /// The payload is serialized before anything is touched, so a failure leaves `record`
  /// unchanged.
  pub fn store(
    record: &mut CatalogRecord,
    payload: &AnalysisPayload,
    analyzed_at: DateTime<Utc>,
  ) -> Result<()> {
    let json = payload.to_json()?;

    record.analysis_payload = Some(json);
    record.ai_analyzed = true;
    record.analysis_timestamp = Some(analyzed_at);
    record.has_experiment_plan = payload.has_experiment_plan();

    let Some(basic) = &payload.basic_info else { return Ok(()) };
    if !basic.title.trim().is_empty() {
      record.title = basic.title.trim().to_string();
      record.parse_method = ParseMethod::Ai;
      record.parse_confidence.escalate(ParseConfidence::High);
    }
    if !basic.authors.trim().is_empty() {
      record.authors = basic.authors.trim().to_string();
    }
    if !basic.journal.trim().is_empty() {
      record.journal = Some(basic.journal.trim().to_string());
    }
    if !basic.category.trim().is_empty() {
      record.category = basic.category.trim().to_string();
    }
    if let Some(year) = parse_year(&basic.publish_date) {
      record.year = Some(year);
    }
    Ok(())
  }
}

/// Year of a `YYYY` or `YYYY-MM` date string.
pub fn parse_year(date: &str) -> Option<i32> {
  let year = date.split('-').next().unwrap_or(date).trim();
  year.parse().ok()
}
