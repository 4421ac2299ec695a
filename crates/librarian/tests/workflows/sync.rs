use super::*;

#[traced_test]
#[tokio::test]
async fn test_sync_is_idempotent() -> TestResult<()> {
  let (librarian, root) = create_test_librarian(MockAnalyzer::failing()).await;
  write_paper(root.path(), "sparse_attention.pdf", &typical_first_page());
  write_paper(root.path(), "graph_neural_networks_survey.pdf", &[(10, "short")]);
  std::fs::write(root.path().join("papers").join("broken_download.pdf"), b"not a pdf at all")?;

  let first = librarian.sync(ReconcileOptions::default()).await?;
  assert_eq!((first.added, first.removed_invalid, first.kept), (3, 0, 0));
  let expected = vec![
    "papers/broken_download.pdf".to_string(),
    "papers/graph_neural_networks_survey.pdf".to_string(),
    "papers/sparse_attention.pdf".to_string(),
  ];
  assert_eq!(active_paths(&librarian).await, expected);

  let second = librarian.sync(ReconcileOptions::default()).await?;
  assert_eq!((second.added, second.removed_invalid, second.kept), (0, 0, 3));
  assert_eq!(active_paths(&librarian).await, expected);
  Ok(())
}

#[tokio::test]
async fn test_sync_removes_orphans_and_adds_new_files() -> TestResult<()> {
  let (librarian, root) = create_test_librarian(MockAnalyzer::failing()).await;
  let doomed = write_paper(root.path(), "to_be_deleted_paper.pdf", &typical_first_page());
  write_paper(root.path(), "staying_around_paper.pdf", &typical_first_page());
  librarian.sync(ReconcileOptions::default()).await?;

  std::fs::remove_file(doomed)?;
  write_paper(root.path(), "freshly_downloaded_paper.pdf", &[(10, "x")]);

  let report = librarian.sync(ReconcileOptions::default()).await?;
  assert_eq!((report.added, report.removed_invalid, report.kept), (1, 1, 1));

  let papers = librarian.papers().await?;
  assert_eq!(papers.len(), 2);
  let new = papers
    .iter()
    .find(|p| p.storage_path.as_deref() == Some("papers/freshly_downloaded_paper.pdf"))
    .unwrap();
  assert!(matches!(new.parse_method, ParseMethod::Filename | ParseMethod::Pdf));
  assert!(!papers.iter().any(|p| p.storage_path.as_deref() == Some("papers/to_be_deleted_paper.pdf")));
  Ok(())
}

#[tokio::test]
async fn test_sync_resolves_layout_metadata() -> TestResult<()> {
  let (librarian, root) = create_test_librarian(MockAnalyzer::failing()).await;
  write_paper(root.path(), "sa.pdf", &typical_first_page());
  librarian.sync(ReconcileOptions::default()).await?;

  let paper = librarian.papers().await?.remove(0);
  assert_eq!(paper.title, "Sparse Attention Networks");
  assert_eq!(paper.authors, "Jane Doe, John Roe");
  assert_eq!(paper.parse_method, ParseMethod::Pdf);
  assert_eq!(paper.parse_confidence, ParseConfidence::High);
  assert_eq!(paper.source_filename.as_deref(), Some("sa.pdf"));
  assert_eq!(paper.category, "uncategorized");
  assert_eq!(paper.read_status, ReadStatus::Unread);
  assert!(!paper.ai_analyzed);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_sync_falls_back_to_filename_for_broken_pdf() -> TestResult<()> {
  let (librarian, root) = create_test_librarian(MockAnalyzer::failing()).await;
  std::fs::write(root.path().join("papers").join("attention_is_all_you_need.pdf"), b"garbage")?;

  let report = librarian.sync(ReconcileOptions::default()).await?;
  assert_eq!(report.added, 1);
  let paper = librarian.papers().await?.remove(0);
  assert_eq!(paper.title, "attention is all you need");
  assert_eq!(paper.authors, "Unknown");
  assert_eq!(paper.parse_method, ParseMethod::Filename);
  assert_eq!(paper.parse_confidence, ParseConfidence::Low);
  Ok(())
}

#[tokio::test]
async fn test_sync_keeps_user_state() -> TestResult<()> {
  let (librarian, root) = create_test_librarian(MockAnalyzer::failing()).await;
  write_paper(root.path(), "first_paper_in_library.pdf", &typical_first_page());
  write_paper(root.path(), "second_paper_in_library.pdf", &typical_first_page());
  librarian.sync(ReconcileOptions::default()).await?;

  let papers = librarian.papers().await?;
  let read = librarian.set_read_status(papers[0].id, ReadStatus::Reading).await?;
  let trashed = librarian.trash(papers[1].id).await?;

  let report = librarian.sync(ReconcileOptions::default()).await?;
  assert_eq!((report.added, report.removed_invalid, report.kept), (0, 0, 2));
  assert_eq!(librarian.get(read.id).await?.read_status, ReadStatus::Reading);
  assert!(librarian.get(trashed.id).await?.is_deleted());
  assert_eq!(librarian.trashed().await?.len(), 1);
  assert_eq!(librarian.papers().await?.len(), 1);
  Ok(())
}

#[tokio::test]
async fn test_sync_refuses_missing_folder() -> TestResult<()> {
  let (librarian, root) = create_test_librarian(MockAnalyzer::failing()).await;
  write_paper(root.path(), "a_paper_that_will_vanish.pdf", &typical_first_page());
  librarian.sync(ReconcileOptions::default()).await?;

  std::fs::remove_dir_all(root.path().join("papers"))?;
  let err = librarian.sync(ReconcileOptions::default()).await.unwrap_err();
  assert!(matches!(err, LibrarianError::LibraryFolderMissing(_)));
  assert_eq!(librarian.papers().await?.len(), 1);

  let report = librarian.sync(ReconcileOptions { allow_missing_folder: true }).await?;
  assert_eq!((report.added, report.removed_invalid, report.kept), (0, 1, 0));
  assert!(librarian.papers().await?.is_empty());
  Ok(())
}

#[tokio::test]
async fn test_import_never_removes() -> TestResult<()> {
  let (librarian, root) = create_test_librarian(MockAnalyzer::failing()).await;
  let gone = write_paper(root.path(), "imported_then_deleted.pdf", &typical_first_page());
  let report = librarian.import().await?;
  assert_eq!((report.imported, report.skipped), (1, 0));

  std::fs::remove_file(gone)?;
  write_paper(root.path(), "imported_second_time.pdf", &typical_first_page());
  let report = librarian.import().await?;
  assert_eq!((report.imported, report.skipped), (1, 0));
  assert_eq!(librarian.papers().await?.len(), 2);

  let report = librarian.import().await?;
  assert_eq!((report.imported, report.skipped), (0, 1));
  Ok(())
}

#[tokio::test]
async fn test_concurrent_syncs_do_not_duplicate() -> TestResult<()> {
  let (librarian, root) = create_test_librarian(MockAnalyzer::failing()).await;
  for i in 0..5 {
    write_paper(root.path(), &format!("concurrent_paper_{i}.pdf"), &typical_first_page());
  }

  let (a, b) = tokio::join!(
    librarian.sync(ReconcileOptions::default()),
    librarian.sync(ReconcileOptions::default())
  );
  assert_eq!(a?.added + b?.added, 5);
  assert_eq!(active_paths(&librarian).await.len(), 5);
  Ok(())
}
