use super::*;

#[tokio::test]
async fn test_upload_copies_and_catalogs() -> TestResult<()> {
  let (librarian, root) = create_test_librarian(MockAnalyzer::failing()).await;
  let downloads = tempdir()?;
  let source = downloads.path().join("sparse_attention_networks.pdf");
  write_pdf(&source, &typical_first_page());

  let record = librarian.upload(&source).await?;
  assert_eq!(record.storage_path.as_deref(), Some("papers/sparse_attention_networks.pdf"));
  assert_eq!(record.source_filename.as_deref(), Some("sparse_attention_networks.pdf"));
  assert_eq!(record.title, "Sparse Attention Networks");
  assert_eq!(record.parse_method, ParseMethod::Pdf);
  assert!(root.path().join("papers/sparse_attention_networks.pdf").is_file());
  assert!(source.is_file());

  // the uploaded file is already claimed, so a sync adds nothing
  let report = librarian.sync(ReconcileOptions::default()).await?;
  assert_eq!((report.added, report.kept), (0, 1));
  Ok(())
}

#[tokio::test]
async fn test_upload_rejects_duplicates() -> TestResult<()> {
  let (librarian, _root) = create_test_librarian(MockAnalyzer::failing()).await;
  let downloads = tempdir()?;
  let source = downloads.path().join("uploaded_twice.pdf");
  write_pdf(&source, &typical_first_page());

  librarian.upload(&source).await?;
  let err = librarian.upload(&source).await.unwrap_err();
  assert!(matches!(err, LibrarianError::DuplicatePath(path) if path == "papers/uploaded_twice.pdf"));
  assert_eq!(librarian.papers().await?.len(), 1);
  Ok(())
}

#[tokio::test]
async fn test_upload_rejects_non_pdfs() -> TestResult<()> {
  let (librarian, root) = create_test_librarian(MockAnalyzer::failing()).await;
  let downloads = tempdir()?;
  let notes = downloads.path().join("notes.txt");
  std::fs::write(&notes, "reading notes")?;

  assert!(matches!(librarian.upload(&notes).await, Err(LibrarianError::InvalidUpload(_))));
  assert!(matches!(
    librarian.upload(downloads.path().join("missing.pdf")).await,
    Err(LibrarianError::InvalidUpload(_))
  ));
  assert!(librarian.papers().await?.is_empty());
  assert_eq!(std::fs::read_dir(root.path().join("papers"))?.count(), 0);
  Ok(())
}

#[tokio::test]
async fn test_upload_of_unreadable_pdf_uses_file_name() -> TestResult<()> {
  let (librarian, _root) = create_test_librarian(MockAnalyzer::failing()).await;
  let downloads = tempdir()?;
  let source = downloads.path().join("scanned_conference_paper.PDF");
  std::fs::write(&source, b"%PDF-1.4 truncated")?;

  let record = librarian.upload(&source).await?;
  assert_eq!(record.title, "scanned conference paper");
  assert_eq!(record.parse_method, ParseMethod::Filename);
  assert_eq!(record.parse_confidence, ParseConfidence::Low);
  Ok(())
}

#[tokio::test]
async fn test_upload_of_file_already_in_papers_folder() -> TestResult<()> {
  let (librarian, root) = create_test_librarian(MockAnalyzer::failing()).await;
  let path = write_paper(root.path(), "not_synced_yet.pdf", &typical_first_page());
  let bytes = std::fs::read(&path)?;

  let record = librarian.upload(&path).await?;
  assert_eq!(record.storage_path.as_deref(), Some("papers/not_synced_yet.pdf"));
  assert_eq!(record.title, "Sparse Attention Networks");
  assert_eq!(std::fs::read(&path)?, bytes);

  let report = librarian.sync(ReconcileOptions::default()).await?;
  assert_eq!((report.added, report.removed_invalid, report.kept), (0, 0, 1));
  Ok(())
}

#[tokio::test]
async fn test_upload_never_overwrites_a_file() -> TestResult<()> {
  let (librarian, root) = create_test_librarian(MockAnalyzer::failing()).await;
  let existing = write_paper(root.path(), "same_name_paper.pdf", &typical_first_page());
  let bytes = std::fs::read(&existing)?;

  let downloads = tempdir()?;
  let source = downloads.path().join("same_name_paper.pdf");
  write_pdf(&source, &[(24, "A Different Paper Entirely")]);

  let err = librarian.upload(&source).await.unwrap_err();
  assert!(matches!(err, LibrarianError::InvalidUpload(reason) if reason.contains("already exists")));
  assert_eq!(std::fs::read(&existing)?, bytes);
  assert!(librarian.papers().await?.is_empty());
  Ok(())
}
