use super::*;

async fn library_with_papers(names: &[&str]) -> (Librarian, TempDir) {
  let (librarian, root) = create_test_librarian(MockAnalyzer::failing()).await;
  for name in names {
    write_paper(root.path(), name, &typical_first_page());
  }
  librarian.sync(ReconcileOptions::default()).await.unwrap();
  (librarian, root)
}

#[tokio::test]
async fn test_trash_and_restore() -> TestResult<()> {
  let (librarian, _root) = library_with_papers(&["trash_me_please.pdf"]).await;
  let id = librarian.papers().await?[0].id;

  let trashed = librarian.trash(id).await?;
  assert!(trashed.is_deleted());
  let deleted_at = trashed.deleted_at();
  assert!(deleted_at.is_some());
  assert!(librarian.papers().await?.is_empty());
  assert_eq!(librarian.trashed().await?[0].id, id);

  // trashing twice keeps the first timestamp
  assert_eq!(librarian.trash(id).await?.deleted_at(), deleted_at);

  let restored = librarian.restore(id).await?;
  assert!(!restored.is_deleted());
  assert_eq!(librarian.papers().await?[0].id, id);
  assert!(librarian.trashed().await?.is_empty());

  // restoring an active paper is a no-op
  assert!(!librarian.restore(id).await?.is_deleted());
  Ok(())
}

#[tokio::test]
async fn test_upload_cannot_replace_trashed_paper() -> TestResult<()> {
  let (librarian, root) = library_with_papers(&["contested_paper_name.pdf"]).await;
  let original = librarian.papers().await?[0].id;
  librarian.trash(original).await?;
  let file = root.path().join("papers/contested_paper_name.pdf");
  let bytes = std::fs::read(&file)?;

  // a different paper with the same file name
  let upload_dir = tempdir()?;
  let source = upload_dir.path().join("contested_paper_name.pdf");
  write_pdf(&source, &[(24, "Another Paper With The Same Name")]);
  let err = librarian.upload(&source).await.unwrap_err();
  assert!(matches!(err, LibrarianError::DuplicatePath(path) if path == "papers/contested_paper_name.pdf"));
  assert_eq!(std::fs::read(&file)?, bytes);

  let report = librarian.sync(ReconcileOptions::default()).await?;
  assert_eq!((report.added, report.removed_invalid, report.kept), (0, 0, 1));

  assert!(!librarian.restore(original).await?.is_deleted());
  assert_eq!(librarian.papers().await?[0].id, original);
  Ok(())
}

#[tokio::test]
async fn test_empty_trash_keeps_file_still_in_use() -> TestResult<()> {
  let (librarian, root) = library_with_papers(&["shared_paper_file.pdf"]).await;
  let original = librarian.papers().await?[0].id;
  librarian.trash(original).await?;

  // a second record on the same path, written straight to the catalog
  let path = "papers/shared_paper_file.pdf";
  let copy = Add::record(NewRecord::from_resolved(path, ResolvedMetadata::filename_only(Path::new(path))))
    .execute(&librarian.database)
    .await?;

  assert_eq!(librarian.empty_trash().await?, 1);
  assert!(root.path().join(path).is_file());
  assert_eq!(librarian.papers().await?[0].id, copy.id);
  assert!(matches!(librarian.get(original).await, Err(LibrarianError::NotFound(_))));
  Ok(())
}

#[tokio::test]
async fn test_purge_removes_record_and_file() -> TestResult<()> {
  let (librarian, root) = library_with_papers(&["purge_this_paper.pdf"]).await;
  let id = librarian.papers().await?[0].id;
  let file = librarian.pdf_path(id).await?;
  assert_eq!(file, root.path().join("papers/purge_this_paper.pdf"));

  librarian.purge(id).await?;
  assert!(!file.exists());
  assert!(matches!(librarian.get(id).await, Err(LibrarianError::NotFound(missing)) if missing == id));
  assert!(matches!(librarian.purge(id).await, Err(LibrarianError::NotFound(_))));
  Ok(())
}

#[tokio::test]
async fn test_purge_survives_missing_file() -> TestResult<()> {
  let (librarian, _root) = library_with_papers(&["already_gone_paper.pdf"]).await;
  let id = librarian.papers().await?[0].id;
  std::fs::remove_file(librarian.pdf_path(id).await?)?;

  librarian.purge(id).await?;
  assert!(librarian.papers().await?.is_empty());
  Ok(())
}

#[tokio::test]
async fn test_empty_trash() -> TestResult<()> {
  let (librarian, root) =
    library_with_papers(&["keep_this_paper.pdf", "drop_paper_one.pdf", "drop_paper_two.pdf"]).await;
  for paper in librarian.papers().await? {
    if paper.storage_path.as_deref() != Some("papers/keep_this_paper.pdf") {
      librarian.trash(paper.id).await?;
    }
  }

  assert_eq!(librarian.empty_trash().await?, 2);
  assert!(librarian.trashed().await?.is_empty());
  assert_eq!(active_paths(&librarian).await, ["papers/keep_this_paper.pdf"]);
  assert!(!root.path().join("papers/drop_paper_one.pdf").exists());
  assert!(root.path().join("papers/keep_this_paper.pdf").exists());

  // the purged files are gone, so a sync changes nothing
  let report = librarian.sync(ReconcileOptions::default()).await?;
  assert_eq!((report.added, report.removed_invalid, report.kept), (0, 0, 1));
  assert_eq!(librarian.empty_trash().await?, 0);
  Ok(())
}

#[tokio::test]
async fn test_ids_are_never_reused() -> TestResult<()> {
  let (librarian, root) = library_with_papers(&["first_paper_ever.pdf"]).await;
  let first = librarian.papers().await?[0].id;
  librarian.purge(first).await?;

  write_paper(root.path(), "first_paper_ever.pdf", &typical_first_page());
  librarian.sync(ReconcileOptions::default()).await?;
  assert!(librarian.papers().await?[0].id > first);
  Ok(())
}

#[tokio::test]
async fn test_read_status() -> TestResult<()> {
  let (librarian, _root) = library_with_papers(&["reading_material.pdf"]).await;
  let id = librarian.papers().await?[0].id;

  let record = librarian.toggle_read(id).await?;
  assert_eq!(record.read_status, ReadStatus::Read);
  assert!(record.is_read());
  assert_eq!(librarian.toggle_read(id).await?.read_status, ReadStatus::Unread);

  librarian.set_read_status(id, ReadStatus::Reading).await?;
  assert_eq!(librarian.toggle_read(id).await?.read_status, ReadStatus::Read);

  let stats = librarian.stats().await?;
  assert_eq!((stats.total, stats.read), (1, 1));

  assert!(matches!(librarian.toggle_read(999).await, Err(LibrarianError::NotFound(999))));
  Ok(())
}

#[tokio::test]
async fn test_pdf_path_of_missing_file() -> TestResult<()> {
  let (librarian, _root) = library_with_papers(&["soon_missing_file.pdf"]).await;
  let id = librarian.papers().await?[0].id;
  std::fs::remove_file(librarian.pdf_path(id).await?)?;

  assert!(matches!(librarian.pdf_path(id).await, Err(LibrarianError::MissingFile(_))));
  assert!(matches!(librarian.pdf_path(id + 1).await, Err(LibrarianError::NotFound(_))));
  Ok(())
}
