//! Title evidence from a bare file name.

use super::*;

/// Shortest normalized stem accepted as a title.
pub const MIN_TITLE_CHARS: usize = 10;

lazy_static! {
  /// Runs of whitespace, collapsed to a single space.
  static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
  /// A single trailing `(...)` or `[...]` group such as "(draft)" or "[v2]".
  static ref TRAILING_SUFFIX: Regex = Regex::new(r"\s*(\([^()]*\)|\[[^\[\]]*\])\s*$").unwrap();
}

/// Derives a low-confidence title from a file stem (the name without its extension).
#[derive(Debug, Default, Clone, Copy)]
pub struct FilenameHeuristic;

impl FilenameHeuristic {
  /// Normalizes `stem` and returns it as a title, or an empty string when the result is
  /// too short to be believable.
  ///
  /// Underscores become spaces, whitespace is collapsed and one trailing parenthesized or
  /// bracketed suffix is dropped. Anything shorter than [`MIN_TITLE_CHARS`] characters is
  /// treated as no evidence at all.
  ///
  /// # Examples
  ///
  /// ```
  /// use librarian::resolver::FilenameHeuristic;
  ///
  /// assert_eq!(FilenameHeuristic.resolve("graph_neural_networks (draft)"), "graph neural networks");
  /// assert_eq!(FilenameHeuristic.resolve("scan_001"), "");
  /// ```
  pub fn resolve(&self, stem: &str) -> String {
    let title = collapse_whitespace(&stem.replace('_', " "));
    let title = TRAILING_SUFFIX.replace(&title, "").trim().to_string();

    if title.chars().count() >= MIN_TITLE_CHARS {
      title
    } else {
      String::new()
    }
  }
}

/// Collapses whitespace runs to single spaces and trims the ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
  WHITESPACE.replace_all(text, " ").trim().to_string()
}
