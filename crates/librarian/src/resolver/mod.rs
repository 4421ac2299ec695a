//! Metadata resolution for newly discovered PDFs.
//!
//! Bibliographic metadata is recovered in tiers, each allowed to replace the previous
//! tier's result only with evidence of equal or higher confidence:
//!
//! 1. **Filename**: [`FilenameHeuristic`] on the file stem, always `low` confidence.
//! 2. **Layout**: [`LayoutTextResolver`] on the first page's spans, `high` confidence.
//! 3. **Fallback**: the raw stem as title when neither tier produced one.
//!
//! A decode failure in the layout tier is logged and otherwise ignored, so a corrupt PDF
//! still gets filename metadata. Analysis-derived metadata is a further tier that is
//! never run here; it is applied by [`AnalysisCache`](crate::analysis::AnalysisCache)
//! when a caller explicitly pays for an analysis.

use super::*;

mod filename;
mod layout;

use self::filename::collapse_whitespace;
pub use self::{
  filename::{FilenameHeuristic, MIN_TITLE_CHARS},
  layout::{LayoutMetadata, LayoutTextResolver},
};

/// Metadata for a file that is about to become a catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMetadata {
  /// Best title found
  pub title:            String,
  /// Author line, or [`UNKNOWN_AUTHORS`]
  pub authors:          String,
  /// File name including extension
  pub source_filename:  String,
  /// Tier that produced the title
  pub parse_method:     ParseMethod,
  /// Trust in the result
  pub parse_confidence: ParseConfidence,
}

impl ResolvedMetadata {
  /// Filename-only metadata, used when resolution as a whole could not run.
  ///
  /// This never touches the file's contents.
  pub fn filename_only(path: &Path) -> Self {
    let source_filename = path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string());
    let stem = path
      .file_stem()
      .map(|stem| stem.to_string_lossy().into_owned())
      .unwrap_or_else(|| source_filename.clone());

    let title = FilenameHeuristic.resolve(&stem);
    Self {
      title: if title.is_empty() { stem } else { title },
      authors: UNKNOWN_AUTHORS.to_string(),
      source_filename,
      parse_method: ParseMethod::Filename,
      parse_confidence: ParseConfidence::Low,
    }
  }
}

/// Composes the filename and layout tiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataResolver {
  /// Filename tier
  filename: FilenameHeuristic,
  /// Layout tier
  layout:   LayoutTextResolver,
}

impl MetadataResolver {
  /// Creates a resolver.
  pub fn new() -> Self { Self::default() }

  /// Resolves metadata for the PDF at `path`, reading its first page through `extractor`.
  ///
  /// Extraction failures never surface here. The only error is a path without a usable
  /// file name, which callers should treat like any other resolution failure and fall
  /// back to [`ResolvedMetadata::filename_only`].
  ///
  /// # Examples
  ///
  /// ```no_run
  /// use std::path::Path;
  ///
  /// use librarian::{pdf::LopdfExtractor, resolver::MetadataResolver};
  ///
  /// # fn main() -> Result<(), librarian::error::LibrarianError> {
  /// let metadata = MetadataResolver::new()
  ///   .resolve(Path::new("papers/graph_neural_networks.pdf"), &LopdfExtractor)?;
  /// println!("{} ({})", metadata.title, metadata.parse_confidence);
  /// # Ok(())
  /// # }
  /// ```
  pub fn resolve(
    &self,
    path: &Path,
    extractor: &dyn PdfTextExtractor,
  ) -> Result<ResolvedMetadata> {
    let (Some(source_filename), Some(stem)) =
      (path.file_name().and_then(|n| n.to_str()), path.file_stem().and_then(|s| s.to_str()))
    else {
      return Err(LibrarianError::InvalidValue(format!(
        "{} has no usable file name",
        path.display()
      )));
    };

    let mut metadata = ResolvedMetadata {
      title:            self.filename.resolve(stem),
      authors:          UNKNOWN_AUTHORS.to_string(),
      source_filename:  source_filename.to_string(),
      parse_method:     ParseMethod::Filename,
      parse_confidence: ParseConfidence::Low,
    };

    match extractor.first_page_spans(path) {
      Ok(spans) => apply_layout(&mut metadata, self.layout.resolve(&spans)),
      Err(e) => warn!("Could not read the first page of {}, using its file name: {e}", path.display()),
    }

    if metadata.title.is_empty() {
      metadata.title = stem.to_string();
    }

    debug!(
      "Resolved {} as \"{}\" by {} ({}, {})",
      path.display(),
      metadata.title,
      metadata.authors,
      metadata.parse_method,
      metadata.parse_confidence
    );
    Ok(metadata)
  }
}

/// Layout tier: a title switches the method to `pdf`; a title or real authors raise the
/// confidence to `high`.
fn apply_layout(metadata: &mut ResolvedMetadata, layout: LayoutMetadata) {
  if !layout.title.is_empty() {
    metadata.title = layout.title;
    metadata.parse_method = ParseMethod::Pdf;
    metadata.parse_confidence.escalate(ParseConfidence::High);
  }
  if layout.authors != UNKNOWN_AUTHORS {
    metadata.authors = layout.authors;
    metadata.parse_confidence.escalate(ParseConfidence::High);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Extractor returning canned spans, or failing like a corrupt file.
  enum FakeExtractor {
    Spans(Vec<Span>),
    Broken,
  }

  impl PdfTextExtractor for FakeExtractor {
    fn first_page_spans(&self, _path: &Path) -> Result<Vec<Span>> {
      match self {
        FakeExtractor::Spans(spans) => Ok(spans.clone()),
        FakeExtractor::Broken =>
          Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "corrupt xref").into()),
      }
    }

    fn page_texts(&self, _path: &Path, _max_pages: usize) -> Result<Vec<String>> { Ok(Vec::new()) }
  }

  fn paper_page() -> Vec<Span> {
    vec![
      Span::new("Sparse Attention Networks", 22.0, 80.0),
      Span::new("Jane Doe and John Roe", 12.0, 120.0),
      Span::new("Stanford University", 10.0, 140.0),
      Span::new("Abstract", 11.0, 200.0),
    ]
  }

  #[test]
  fn test_layout_tier_overrides_filename() {
    let metadata = MetadataResolver::new()
      .resolve(Path::new("papers/some_long_file_name.pdf"), &FakeExtractor::Spans(paper_page()))
      .unwrap();
    assert_eq!(metadata.title, "Sparse Attention Networks");
    assert_eq!(metadata.authors, "Jane Doe and John Roe, Stanford University");
    assert_eq!(metadata.source_filename, "some_long_file_name.pdf");
    assert_eq!(metadata.parse_method, ParseMethod::Pdf);
    assert_eq!(metadata.parse_confidence, ParseConfidence::High);
  }

  #[traced_test]
  #[test]
  fn test_decode_failure_falls_back_to_filename() {
    let metadata = MetadataResolver::new()
      .resolve(Path::new("papers/deep_residual_learning.pdf"), &FakeExtractor::Broken)
      .unwrap();
    assert_eq!(metadata.title, "deep residual learning");
    assert_eq!(metadata.authors, UNKNOWN_AUTHORS);
    assert_eq!(metadata.parse_method, ParseMethod::Filename);
    assert_eq!(metadata.parse_confidence, ParseConfidence::Low);
    assert!(logs_contain("Could not read the first page"));
  }

  #[test]
  fn test_raw_stem_is_the_last_resort() {
    let metadata = MetadataResolver::new()
      .resolve(Path::new("scan_01.pdf"), &FakeExtractor::Spans(Vec::new()))
      .unwrap();
    assert_eq!(metadata.title, "scan_01");
    assert_eq!(metadata.parse_method, ParseMethod::Filename);
    assert_eq!(metadata.parse_confidence, ParseConfidence::Low);
  }

  #[test]
  fn test_confidence_never_drops_below_filename_tier() {
    let extractors = [
      FakeExtractor::Spans(paper_page()),
      FakeExtractor::Spans(Vec::new()),
      FakeExtractor::Broken,
    ];
    for name in ["a.pdf", "quantum_error_correction.pdf"] {
      let path = Path::new(name);
      for extractor in &extractors {
        let filename_tier = ResolvedMetadata::filename_only(path).parse_confidence;
        let resolved = MetadataResolver::new().resolve(path, extractor).unwrap();
        assert!(resolved.parse_confidence >= filename_tier);
      }
    }
  }

  // Authors found without a title still raise confidence to high, although the title
  // itself only came from the file name. Kept deliberately; this test pins it down.
  #[test]
  fn test_authors_alone_escalate_confidence() {
    let mut metadata = ResolvedMetadata::filename_only(Path::new("quantum_error_correction.pdf"));
    apply_layout(&mut metadata, LayoutMetadata {
      title:   String::new(),
      authors: "Jane Doe, Wei Zhang".to_string(),
    });
    assert_eq!(metadata.title, "quantum error correction");
    assert_eq!(metadata.parse_method, ParseMethod::Filename);
    assert_eq!(metadata.authors, "Jane Doe, Wei Zhang");
    assert_eq!(metadata.parse_confidence, ParseConfidence::High);
  }

  #[test]
  fn test_layout_without_evidence_changes_nothing() {
    let mut metadata = ResolvedMetadata::filename_only(Path::new("quantum_error_correction.pdf"));
    let before = metadata.clone();
    apply_layout(&mut metadata, LayoutMetadata {
      title:   String::new(),
      authors: UNKNOWN_AUTHORS.to_string(),
    });
    assert_eq!(metadata, before);
  }

  #[test]
  fn test_unusable_file_name_is_an_error() {
    let result = MetadataResolver::new().resolve(Path::new("/"), &FakeExtractor::Broken);
    assert!(matches!(result, Err(LibrarianError::InvalidValue(_))));
  }

  #[test]
  fn test_filename_only_metadata() {
    let metadata = ResolvedMetadata::filename_only(Path::new("papers/x.pdf"));
    assert_eq!(metadata.title, "x");
    assert_eq!(metadata.source_filename, "x.pdf");
    assert_eq!(metadata.parse_confidence, ParseConfidence::Low);
  }
}
