//! PDF text extraction.
//!
//! Metadata resolution only needs the first page, broken into [`Span`]s that carry the
//! text, its rendered font size and its vertical position. The analysis path needs plain
//! text for the first few pages. Both are provided by a [`PdfTextExtractor`], so the rest
//! of the crate never touches a PDF decoder directly and tests can substitute canned
//! pages.
//!
//! [`LopdfExtractor`] is the production implementation. It walks the first page's
//! content stream with a reduced text-state machine (`BT`, `Tf`, `Tm`, `Td`, `TD`, `T*`,
//! `TL`, `cm`, `q`/`Q`, and the show operators), which is enough to recover title and
//! author runs on typical papers.

use lopdf::{content::Content, Document, Object, ObjectId};

use super::*;

/// A contiguous run of text sharing font size and baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
  /// Text as shown on the page
  pub text:      String,
  /// Rendered font size in points
  pub font_size: f32,
  /// Distance from the top of the page, so smaller values are higher up
  pub y:         f32,
}

impl Span {
  /// Creates a span.
  pub fn new(text: impl Into<String>, font_size: f32, y: f32) -> Self {
    Self { text: text.into(), font_size, y }
  }
}

/// Source of page text for metadata resolution and analysis.
///
/// Implementations must report undecodable files as errors, never panic.
pub trait PdfTextExtractor: Send + Sync {
  /// Spans of the first page, in content-stream order.
  fn first_page_spans(&self, path: &Path) -> Result<Vec<Span>>;

  /// Plain text of at most `max_pages` pages, one entry per page.
  fn page_texts(&self, path: &Path, max_pages: usize) -> Result<Vec<String>>;
}

/// Height assumed when a page carries no usable `MediaBox` (US Letter).
const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// How far up the page tree to look for an inherited `MediaBox`.
const MAX_INHERITANCE_DEPTH: usize = 16;

/// `TJ` adjustments (thousandths of an em) more negative than this read as a word gap.
const WORD_GAP_ADJUSTMENT: f32 = -200.0;

/// Two shows closer than this vertically belong to the same span.
const SAME_LINE_TOLERANCE: f32 = 0.5;

/// [`PdfTextExtractor`] backed by `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl LopdfExtractor {
  /// Creates the extractor.
  pub fn new() -> Self { Self }
}

impl PdfTextExtractor for LopdfExtractor {
  fn first_page_spans(&self, path: &Path) -> Result<Vec<Span>> {
    let doc = Document::load(path)?;
    let Some(&page_id) = doc.get_pages().values().next() else {
      debug!("{} has no pages", path.display());
      return Ok(Vec::new());
    };

    let content = Content::decode(&doc.get_page_content(page_id)?)?;
    let spans = SpanCollector::new(page_height(&doc, page_id)).collect(&content.operations);
    trace!("Collected {} spans from first page of {}", spans.len(), path.display());
    Ok(spans)
  }

  fn page_texts(&self, path: &Path, max_pages: usize) -> Result<Vec<String>> {
    let doc = Document::load(path)?;
    doc
      .get_pages()
      .keys()
      .take(max_pages)
      .map(|&number| doc.extract_text(&[number]).map_err(LibrarianError::from))
      .collect()
  }
}

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
type Matrix = [f32; 6];

/// The identity matrix.
const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Computes `m × n`.
fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
  [
    m[0] * n[0] + m[1] * n[2],
    m[0] * n[1] + m[1] * n[3],
    m[2] * n[0] + m[3] * n[2],
    m[2] * n[1] + m[3] * n[3],
    m[4] * n[0] + m[5] * n[2] + n[4],
    m[4] * n[1] + m[5] * n[3] + n[5],
  ]
}

/// Text state tracked while walking a content stream.
struct SpanCollector {
  /// Page height, used to measure positions from the top
  page_height:     f32,
  /// Current transformation matrix
  ctm:             Matrix,
  /// Saved transformation matrices (`q`/`Q`)
  ctm_stack:       Vec<Matrix>,
  /// Text matrix
  text_matrix:     Matrix,
  /// Text line matrix
  line_matrix:     Matrix,
  /// Font size set by `Tf`, before any scaling
  font_size:       f32,
  /// Text leading set by `TL`/`TD`
  leading:         f32,
  /// Whether the text position moved since the last show
  moved_since_show: bool,
  /// Spans gathered so far
  spans:           Vec<Span>,
}

impl SpanCollector {
  fn new(page_height: f32) -> Self {
    Self {
      page_height,
      ctm: IDENTITY,
      ctm_stack: Vec::new(),
      text_matrix: IDENTITY,
      line_matrix: IDENTITY,
      font_size: 0.0,
      leading: 0.0,
      moved_since_show: false,
      spans: Vec::new(),
    }
  }

  fn collect(mut self, operations: &[lopdf::content::Operation]) -> Vec<Span> {
    for operation in operations {
      let operands = &operation.operands;
      match operation.operator.as_str() {
        "q" => self.ctm_stack.push(self.ctm),
        "Q" => self.ctm = self.ctm_stack.pop().unwrap_or(IDENTITY),
        "cm" =>
          if let Some(m) = matrix_from(operands) {
            self.ctm = multiply(&m, &self.ctm);
          },
        "BT" => {
          self.text_matrix = IDENTITY;
          self.line_matrix = IDENTITY;
          self.moved_since_show = true;
        },
        "Tf" =>
          if let Some(size) = operands.get(1).and_then(number) {
            self.font_size = size;
          },
        "TL" =>
          if let Some(leading) = operands.first().and_then(number) {
            self.leading = leading;
          },
        "Tm" =>
          if let Some(m) = matrix_from(operands) {
            self.text_matrix = m;
            self.line_matrix = m;
            self.moved_since_show = true;
          },
        "Td" => self.translate_operands(operands, false),
        "TD" => self.translate_operands(operands, true),
        "T*" => self.next_line(),
        "Tj" =>
          if let Some(Object::String(bytes, _)) = operands.first() {
            self.show(decode_pdf_string(bytes));
          },
        "TJ" =>
          if let Some(Object::Array(parts)) = operands.first() {
            self.show(join_kerned(parts));
          },
        "'" => {
          self.next_line();
          if let Some(Object::String(bytes, _)) = operands.first() {
            self.show(decode_pdf_string(bytes));
          }
        },
        "\"" => {
          self.next_line();
          if let Some(Object::String(bytes, _)) = operands.get(2) {
            self.show(decode_pdf_string(bytes));
          }
        },
        _ => {},
      }
    }
    self.spans
  }

  /// `Td`, or `TD` when `set_leading` is true.
  fn translate_operands(&mut self, operands: &[Object], set_leading: bool) {
    let (Some(tx), Some(ty)) = (operands.first().and_then(number), operands.get(1).and_then(number))
    else {
      return;
    };
    if set_leading {
      self.leading = -ty;
    }
    self.translate(tx, ty);
  }

  fn translate(&mut self, tx: f32, ty: f32) {
    self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
    self.text_matrix = self.line_matrix;
    self.moved_since_show = true;
  }

  fn next_line(&mut self) { self.translate(0.0, -self.leading); }

  fn show(&mut self, text: String) {
    if text.is_empty() {
      return;
    }
    let render = multiply(&self.text_matrix, &self.ctm);
    let font_size = self.font_size * (render[2] * render[2] + render[3] * render[3]).sqrt();
    let y = self.page_height - render[5];

    match self.spans.last_mut() {
      Some(last)
        if (last.font_size - font_size).abs() < f32::EPSILON
          && (last.y - y).abs() < SAME_LINE_TOLERANCE =>
      {
        if self.moved_since_show && !last.text.ends_with(' ') && !text.starts_with(' ') {
          last.text.push(' ');
        }
        last.text.push_str(&text);
      },
      _ => self.spans.push(Span { text, font_size, y }),
    }
    self.moved_since_show = false;
  }
}

/// Concatenates the strings of a `TJ` array, turning wide negative adjustments into spaces.
fn join_kerned(parts: &[Object]) -> String {
  let mut text = String::new();
  for part in parts {
    match part {
      Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
      other =>
        if number(other).is_some_and(|adjustment| adjustment < WORD_GAP_ADJUSTMENT)
          && !text.ends_with(' ')
        {
          text.push(' ');
        },
    }
  }
  text
}

/// Decodes a PDF string operand: UTF-16BE when it carries a byte-order mark, otherwise
/// one character per byte.
fn decode_pdf_string(bytes: &[u8]) -> String {
  if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
    let units: Vec<u16> =
      rest.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]])).collect();
    String::from_utf16_lossy(&units)
  } else {
    bytes.iter().map(|&b| char::from(b)).collect()
  }
}

fn number(object: &Object) -> Option<f32> {
  match object {
    Object::Integer(i) => Some(*i as f32),
    Object::Real(r) => Some(*r as f32),
    _ => None,
  }
}

fn matrix_from(operands: &[Object]) -> Option<Matrix> {
  if operands.len() < 6 {
    return None;
  }
  let mut m = IDENTITY;
  for (slot, operand) in m.iter_mut().zip(operands) {
    *slot = number(operand)?;
  }
  Some(m)
}

/// Height of the page's `MediaBox`, following `Parent` links for inherited boxes.
fn page_height(doc: &Document, page_id: ObjectId) -> f32 {
  let mut current = doc.get_dictionary(page_id).ok();
  for _ in 0..MAX_INHERITANCE_DEPTH {
    let Some(dict) = current else { break };

    let media_box = match dict.get(b"MediaBox") {
      Ok(Object::Reference(id)) => doc.get_object(*id).ok(),
      Ok(object) => Some(object),
      Err(_) => None,
    };
    if let Some(Object::Array(rect)) = media_box {
      if let (Some(y0), Some(y1)) = (rect.get(1).and_then(number), rect.get(3).and_then(number)) {
        return (y1 - y0).abs();
      }
    }

    current =
      dict.get(b"Parent").and_then(Object::as_reference).and_then(|id| doc.get_dictionary(id)).ok();
  }
  DEFAULT_PAGE_HEIGHT
}
