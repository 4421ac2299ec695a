use super::*;

async fn library_with_paper(analyzer: Arc<MockAnalyzer>) -> (Librarian, TempDir, i64) {
  let (librarian, root) = create_test_librarian(analyzer).await;
  write_paper(root.path(), "sparse_attention.pdf", &typical_first_page());
  librarian.sync(ReconcileOptions::default()).await.unwrap();
  let id = librarian.papers().await.unwrap()[0].id;
  (librarian, root, id)
}

#[tokio::test]
async fn test_analyze_then_serve_from_cache() -> TestResult<()> {
  let analyzer = MockAnalyzer::answering(sample_payload());
  let (librarian, _root, id) = library_with_paper(Arc::clone(&analyzer)).await;

  let fresh = librarian.analyze(id, false).await?;
  assert!(!fresh.from_cache);
  assert_eq!(fresh.title, "Sparse Attention Networks for Long Documents");
  assert_eq!(analyzer.calls(), 1);

  let record = librarian.get(id).await?;
  assert!(record.ai_analyzed);
  assert!(record.has_experiment_plan);
  assert_eq!(record.year, Some(2023));
  assert_eq!(record.journal.as_deref(), Some("Journal of Machine Learning Research"));
  assert_eq!(record.category, "machine learning");
  assert_eq!(record.parse_method, ParseMethod::Ai);
  assert_eq!(record.parse_confidence, ParseConfidence::High);

  let cached = librarian.analyze(id, false).await?;
  assert!(cached.from_cache);
  assert_eq!(cached.payload, fresh.payload);
  assert_eq!(analyzer.calls(), 1);

  let stats = librarian.stats().await?;
  assert_eq!((stats.ai_analyzed, stats.experiment_plans), (1, 1));
  Ok(())
}

#[tokio::test]
async fn test_force_refresh_replaces_analysis() -> TestResult<()> {
  let analyzer = MockAnalyzer::answering(sample_payload());
  let (librarian, _root, id) = library_with_paper(Arc::clone(&analyzer)).await;
  librarian.analyze(id, false).await?;

  let mut revised = sample_payload();
  revised.experiment_extension = None;
  revised.basic_info.as_mut().unwrap().publish_date = "2024".into();
  analyzer.set_answer(Some(revised.clone()));

  let refreshed = librarian.analyze(id, true).await?;
  assert!(!refreshed.from_cache);
  assert_eq!(refreshed.payload, revised);
  assert_eq!(analyzer.calls(), 2);

  let record = librarian.get(id).await?;
  assert_eq!(record.year, Some(2024));
  assert!(!record.has_experiment_plan);
  Ok(())
}

#[tokio::test]
async fn test_failed_analysis_is_visible_and_harmless() -> TestResult<()> {
  let (librarian, _root, id) = library_with_paper(MockAnalyzer::failing()).await;
  let before = librarian.get(id).await?;

  let err = librarian.analyze(id, false).await.unwrap_err();
  assert!(matches!(err, LibrarianError::Api(_)));
  assert_eq!(librarian.get(id).await?, before);
  assert!(matches!(librarian.snapshot(id).await, Err(LibrarianError::NotAnalyzed(_))));
  Ok(())
}

#[tokio::test]
async fn test_degraded_result_is_not_stored() -> TestResult<()> {
  let (librarian, _root, id) = library_with_paper(MockAnalyzer::failing()).await;

  let result = librarian.analyze_or_degrade(id, false).await?;
  assert!(result.payload.is_degraded());
  assert!(!result.from_cache);
  assert_eq!(result.title, "Sparse Attention Networks");
  let basic = result.payload.basic_info.unwrap();
  assert_eq!(basic.authors, "Jane Doe, John Roe");

  let record = librarian.get(id).await?;
  assert!(!record.ai_analyzed);
  assert!(record.analysis_payload.is_none());

  // unknown papers are still an error
  assert!(matches!(librarian.analyze_or_degrade(id + 1, false).await, Err(LibrarianError::NotFound(_))));
  Ok(())
}

#[tokio::test]
async fn test_snapshot_of_stored_analysis() -> TestResult<()> {
  let analyzer = MockAnalyzer::answering(sample_payload());
  let (librarian, _root, id) = library_with_paper(Arc::clone(&analyzer)).await;
  librarian.analyze(id, false).await?;

  let first = librarian.snapshot(id).await?;
  let second = librarian.snapshot(id).await?;
  assert_eq!(analyzer.calls(), 1);
  assert_eq!(first.paper_id, id);
  assert_eq!(first.title, "Sparse Attention Networks for Long Documents");
  assert!(first.snapshot.version.starts_with("v1.0-"));
  assert_eq!(first.snapshot.version, second.snapshot.version);

  let ids: Vec<&str> = first.snapshot.sections.iter().map(|s| s.id.as_str()).collect();
  assert_eq!(ids.len(), 3);
  assert_eq!(first.snapshot.metadata.total_sections, 3);
  assert!(first.snapshot.metadata.has_experiment_plan);
  assert_eq!(first.snapshot.metadata.refresh_type, "snapshot_rebuild");

  // the stored payload is untouched by snapshotting
  let record = librarian.get(id).await?;
  let stored = AnalysisPayload::from_json(record.analysis_payload.as_deref().unwrap())?;
  assert_eq!(stored, sample_payload());
  Ok(())
}

#[tokio::test]
async fn test_cached_analysis_outlives_its_file() -> TestResult<()> {
  let analyzer = MockAnalyzer::answering(sample_payload());
  let (librarian, _root, id) = library_with_paper(Arc::clone(&analyzer)).await;
  librarian.analyze(id, false).await?;
  std::fs::remove_file(librarian.pdf_path(id).await?)?;

  assert!(librarian.analyze(id, false).await?.from_cache);
  assert!(matches!(librarian.analyze(id, true).await, Err(LibrarianError::MissingFile(_))));
  assert_eq!(analyzer.calls(), 1);
  Ok(())
}

#[tokio::test]
async fn test_concurrent_analyses_of_one_paper_call_once() -> TestResult<()> {
  let analyzer = MockAnalyzer::answering(sample_payload());
  let (librarian, _root, id) = library_with_paper(Arc::clone(&analyzer)).await;

  let (a, b) = tokio::join!(librarian.analyze(id, false), librarian.analyze(id, false));
  let (a, b) = (a?, b?);
  assert_eq!(analyzer.calls(), 1);
  assert!(a.from_cache != b.from_cache);
  Ok(())
}

/// Trashes the paper and marks it read through its own connection while it "analyzes".
struct TrashingAnalyzer {
  catalog: PathBuf,
}

#[async_trait]
impl Analyzer for TrashingAnalyzer {
  async fn analyze(&self, _pdf_path: &Path) -> librarian::error::Result<AnalysisPayload> {
    use librarian::database::{Database, Query, Update};

    let db = Database::open(&self.catalog).await?;
    for mut record in Query::active().execute(&db).await? {
      record.read_status = ReadStatus::Read;
      Update::read_status(&record).execute(&db).await?;
      record.lifecycle = librarian::record::Lifecycle::Trashed { deleted_at: chrono::Utc::now() };
      Update::lifecycle(&record).execute(&db).await?;
    }
    Ok(sample_payload())
  }
}

#[tokio::test]
async fn test_analysis_keeps_trash_and_read_status_set_meanwhile() -> TestResult<()> {
  let root = tempdir()?;
  std::fs::create_dir_all(root.path().join("papers"))?;
  let catalog = root.path().join("catalog.db");
  let config = Config::default()
    .with_database_path(&catalog)
    .with_library_root(root.path())
    .with_papers_folder("papers");
  let librarian = Librarian::builder()
    .with_config(config)
    .with_analyzer(Arc::new(TrashingAnalyzer { catalog }))
    .build()
    .await?;
  write_paper(root.path(), "sparse_attention.pdf", &typical_first_page());
  librarian.sync(ReconcileOptions::default()).await?;
  let id = librarian.papers().await?[0].id;

  let result = librarian.analyze(id, false).await?;
  assert!(!result.from_cache);

  let record = librarian.get(id).await?;
  assert!(record.is_deleted());
  assert_eq!(record.read_status, ReadStatus::Read);
  assert!(record.ai_analyzed);
  assert_eq!(record.title, "Sparse Attention Networks for Long Documents");
  assert_eq!(librarian.trashed().await?[0].id, id);
  Ok(())
}
