//! Turning raw model output into a payload.
//!
//! Models often wrap their JSON in markdown fences, and long answers get cut off when
//! they hit the output limit. Fences are stripped, and truncated output is closed off
//! (an open string is terminated, then every open array and object) before parsing.

use std::borrow::Cow;

use super::*;

/// Removes one leading ```` ```json ```` or ```` ``` ```` fence and one trailing ```` ``` ````.
pub fn strip_fences(text: &str) -> &str {
  let text = text.trim();
  let text = text
    .strip_prefix("```json")
    .or_else(|| text.strip_prefix("```JSON"))
    .or_else(|| text.strip_prefix("```"))
    .unwrap_or(text);
  text.strip_suffix("```").unwrap_or(text).trim()
}

/// Closes whatever a truncated JSON document left open.
///
/// Balanced input is returned unchanged. Otherwise an unterminated string is closed, a
/// dangling `,` is dropped, a dangling `:` gets a `null` value, and the missing `]`/`}`
/// are appended innermost first.
pub fn repair_truncated(text: &str) -> Cow<'_, str> {
  let mut open = Vec::new();
  let mut in_string = false;
  let mut escaped = false;

  for c in text.chars() {
    if in_string {
      match c {
        _ if escaped => escaped = false,
        '\\' => escaped = true,
        '"' => in_string = false,
        _ => {},
      }
      continue;
    }
    match c {
      '"' => in_string = true,
      '{' => open.push('}'),
      '[' => open.push(']'),
      '}' | ']' => {
        open.pop();
      },
      _ => {},
    }
  }

  if open.is_empty() && !in_string {
    return Cow::Borrowed(text);
  }

  let mut repaired = text.trim_end().to_string();
  if in_string {
    if escaped {
      repaired.pop();
    }
    repaired.push('"');
  } else {
    while repaired.ends_with(',') {
      repaired.pop();
      repaired.truncate(repaired.trim_end().len());
    }
    if repaired.ends_with(':') {
      repaired.push_str(" null");
    }
  }
  repaired.extend(open.iter().rev());

  debug!("Repaired truncated analysis output with {} closers", open.len());
  Cow::Owned(repaired)
}

/// Parses raw model output into a payload.
///
/// Fails with [`LibrarianError::MalformedAnalysis`] when the cleaned text is not a JSON
/// object.
pub fn parse_response(raw: &str) -> Result<AnalysisPayload> {
  let cleaned = strip_fences(raw);
  if cleaned.is_empty() {
    return Err(LibrarianError::MalformedAnalysis("empty response".into()));
  }
  AnalysisPayload::from_json(&repair_truncated(cleaned))
}
