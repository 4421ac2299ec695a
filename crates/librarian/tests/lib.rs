use std::{
  error::Error,
  path::{Path, PathBuf},
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
  },
};

use async_trait::async_trait;
use librarian::{
  analysis::{AnalysisPayload, Analyzer, BasicInfo, ExperimentExtension, Methodology},
  database::Add,
  error::LibrarianError,
  prelude::*,
  reconcile::ReconcileOptions,
  record::{NewRecord, ParseConfidence, ParseMethod, ReadStatus},
  resolver::ResolvedMetadata,
  Config, Librarian,
};
use lopdf::{
  content::{Content, Operation},
  dictionary, Document, Object, Stream,
};
use tempfile::{tempdir, TempDir};
use tracing_test::traced_test;

mod workflows;

pub type TestResult<T> = Result<T, Box<dyn Error>>;

/// Analyzer answering with a fixed payload, or failing, and counting its calls.
#[derive(Default)]
pub struct MockAnalyzer {
  calls:  AtomicUsize,
  answer: Mutex<Option<AnalysisPayload>>,
}

impl MockAnalyzer {
  pub fn answering(payload: AnalysisPayload) -> Arc<Self> {
    Arc::new(Self { calls: AtomicUsize::new(0), answer: Mutex::new(Some(payload)) })
  }

  pub fn failing() -> Arc<Self> { Arc::new(Self::default()) }

  pub fn set_answer(&self, payload: Option<AnalysisPayload>) {
    *self.answer.lock().unwrap() = payload;
  }

  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
  async fn analyze(&self, pdf_path: &Path) -> librarian::error::Result<AnalysisPayload> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    assert!(pdf_path.is_file(), "analyzer called without a file");
    self
      .answer
      .lock()
      .unwrap()
      .clone()
      .ok_or_else(|| LibrarianError::Api("503 Service Unavailable".into()))
  }
}

/// A library rooted in a fresh temporary directory with an empty `papers` folder.
pub async fn create_test_librarian(analyzer: Arc<MockAnalyzer>) -> (Librarian, TempDir) {
  let root = tempdir().unwrap();
  std::fs::create_dir_all(root.path().join("papers")).unwrap();
  let config = Config::default()
    .with_database_path(root.path().join("catalog.db"))
    .with_library_root(root.path())
    .with_papers_folder("papers");
  let librarian =
    Librarian::builder().with_config(config).with_analyzer(analyzer).build().await.unwrap();
  (librarian, root)
}

/// Writes a one-page PDF at `root/papers/name` whose lines run top to bottom, each with
/// its own font size.
pub fn write_paper(root: &Path, name: &str, lines: &[(i64, &str)]) -> PathBuf {
  let path = root.join("papers").join(name);
  write_pdf(&path, lines);
  path
}

pub fn write_pdf(path: &Path, lines: &[(i64, &str)]) {
  let mut operations = Vec::new();
  for (i, (size, text)) in lines.iter().enumerate() {
    let y = 750 - 40 * i as i64;
    operations.extend([
      Operation::new("BT", vec![]),
      Operation::new("Tf", vec!["F1".into(), (*size).into()]),
      Operation::new("Td", vec![72.into(), y.into()]),
      Operation::new("Tj", vec![Object::string_literal(*text)]),
      Operation::new("ET", vec![]),
    ]);
  }

  let mut doc = Document::with_version("1.5");
  let pages_id = doc.new_object_id();
  let font_id = doc.add_object(dictionary! {
    "Type" => "Font",
    "Subtype" => "Type1",
    "BaseFont" => "Helvetica",
  });
  let resources_id = doc.add_object(dictionary! {
    "Font" => dictionary! { "F1" => font_id },
  });
  let content = Content { operations };
  let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
  let page_id = doc.add_object(dictionary! {
    "Type" => "Page",
    "Parent" => pages_id,
    "Contents" => content_id,
  });
  doc.objects.insert(
    pages_id,
    Object::Dictionary(dictionary! {
      "Type" => "Pages",
      "Kids" => vec![page_id.into()],
      "Count" => 1,
      "Resources" => resources_id,
      "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    }),
  );
  let catalog_id = doc.add_object(dictionary! {
    "Type" => "Catalog",
    "Pages" => pages_id,
  });
  doc.trailer.set("Root", catalog_id);
  doc.save(path).unwrap();
}

/// A typical first page: a large title, an author line and body text.
pub fn typical_first_page() -> Vec<(i64, &'static str)> {
  vec![
    (24, "Sparse Attention Networks"),
    (12, "Jane Doe, John Roe"),
    (10, "Abstract"),
    (10, "We study sparse attention."),
  ]
}

/// An analysis with bibliographic facts and an experiment plan.
pub fn sample_payload() -> AnalysisPayload {
  AnalysisPayload {
    basic_info: Some(BasicInfo {
      title: "Sparse Attention Networks for Long Documents".into(),
      authors: "Jane Doe, John Roe".into(),
      journal: "Journal of Machine Learning Research".into(),
      publish_date: "2023-06".into(),
      category: "machine learning".into(),
      ..BasicInfo::default()
    }),
    methodology: Some(Methodology {
      overall_workflow: "Train sparse models, compare with dense baselines".into(),
      ..Methodology::default()
    }),
    experiment_extension: Some(ExperimentExtension {
      alternative_routes: "Try block-sparse kernels".into(),
      ..ExperimentExtension::default()
    }),
    ..AnalysisPayload::default()
  }
}

/// Storage paths of the records outside the trash, sorted.
pub async fn active_paths(librarian: &Librarian) -> Vec<String> {
  let mut paths: Vec<String> = librarian
    .papers()
    .await
    .unwrap()
    .into_iter()
    .filter_map(|record| record.storage_path)
    .collect();
  paths.sort();
  paths
}
