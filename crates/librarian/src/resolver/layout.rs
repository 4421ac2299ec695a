//! Title and author evidence from the layout of a paper's first page.
//!
//! Title and author blocks are front-loaded and visually dominant, so the resolver only
//! looks at the top of the page: the largest text among the first spans is the title, and
//! a few spans below it are checked for author-like lines. Nothing here can fail; missing
//! cues simply produce an empty title or the [`UNKNOWN_AUTHORS`] sentinel.

use super::*;

/// Spans considered when looking for the title run.
const TITLE_WINDOW: usize = 10;

/// Spans within this fraction of the largest font size count as part of the title.
const TITLE_SIZE_TOLERANCE: f32 = 0.9;

/// Most title candidates joined into the title.
const MAX_TITLE_PARTS: usize = 3;

/// Spans after the title line that are checked for authors.
const AUTHOR_WINDOW: usize = 5;

/// Most author lines joined into the author field.
const MAX_AUTHOR_PARTS: usize = 2;

/// Author detection only runs on pages with more spans than this.
const MIN_SPANS_FOR_AUTHORS: usize = 3;

/// Longest title or author line kept.
const MAX_FIELD_CHARS: usize = 200;

/// Words that mark a line as an author line, matched case-insensitively anywhere in it.
const AUTHOR_MARKERS: [&str; 4] = ["by", "author", "et al", "and"];

lazy_static! {
  /// Two capitalized words in a row, as in "Jane Doe".
  static ref PERSON_NAME: Regex = Regex::new(r"[A-Z][a-z]+\s+[A-Z][a-z]+").unwrap();
}

/// What the first page's layout says about a paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutMetadata {
  /// Title, empty when the page gave no usable cue
  pub title:   String,
  /// Author line, or [`UNKNOWN_AUTHORS`]
  pub authors: String,
}

/// Infers title and authors from first-page spans.
#[derive(Debug, Default, Clone, Copy)]
pub struct LayoutTextResolver;

impl LayoutTextResolver {
  /// Resolves title and authors from the spans of a single page.
  ///
  /// # Examples
  ///
  /// ```
  /// use librarian::{pdf::Span, resolver::LayoutTextResolver};
  ///
  /// let spans = vec![
  ///   Span::new("Long Title Part One", 24.0, 80.0),
  ///   Span::new("Long Title Part Two", 24.0, 110.0),
  ///   Span::new("Body text", 10.0, 300.0),
  /// ];
  /// let layout = LayoutTextResolver.resolve(&spans);
  /// assert_eq!(layout.title, "Long Title Part One Long Title Part Two");
  /// assert_eq!(layout.authors, "Unknown");
  /// ```
  pub fn resolve(&self, spans: &[Span]) -> LayoutMetadata {
    let mut lines: Vec<(&str, f32, f32)> = spans
      .iter()
      .map(|span| (span.text.trim(), span.font_size, span.y))
      .filter(|(text, ..)| !text.is_empty())
      .collect();
    lines.sort_by(|a, b| a.2.total_cmp(&b.2));

    LayoutMetadata { title: title_from(&lines), authors: authors_from(&lines) }
  }
}

fn title_from(lines: &[(&str, f32, f32)]) -> String {
  let window = &lines[..lines.len().min(TITLE_WINDOW)];
  let Some(max_size) = window.iter().map(|(_, size, _)| *size).reduce(f32::max) else {
    return String::new();
  };

  let threshold = max_size * TITLE_SIZE_TOLERANCE;
  let parts: Vec<&str> = window
    .iter()
    .filter(|(_, size, _)| *size >= threshold)
    .take(MAX_TITLE_PARTS)
    .map(|(text, ..)| *text)
    .collect();

  let title = collapse_whitespace(&parts.join(" "));
  if title.chars().count() > MAX_FIELD_CHARS {
    format!("{}...", title.chars().take(MAX_FIELD_CHARS).collect::<String>())
  } else {
    title
  }
}

fn authors_from(lines: &[(&str, f32, f32)]) -> String {
  if lines.len() <= MIN_SPANS_FOR_AUTHORS {
    return UNKNOWN_AUTHORS.to_string();
  }

  let parts: Vec<&str> = lines
    .iter()
    .skip(1)
    .take(AUTHOR_WINDOW)
    .map(|(text, ..)| *text)
    .filter(|text| looks_like_authors(text))
    .take(MAX_AUTHOR_PARTS)
    .collect();

  if parts.is_empty() {
    return UNKNOWN_AUTHORS.to_string();
  }
  collapse_whitespace(&parts.join(", ")).chars().take(MAX_FIELD_CHARS).collect()
}

fn looks_like_authors(text: &str) -> bool {
  let lower = text.to_lowercase();
  AUTHOR_MARKERS.iter().any(|marker| lower.contains(marker)) || PERSON_NAME.is_match(text)
}
