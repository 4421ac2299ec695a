//! Cached, versioned paper analyses.
//!
//! An analysis is produced by an external model and is expensive: seconds to minutes of
//! wall time and real money per call. This module keeps the result of that call on the
//! catalog record and makes it reusable:
//!
//! - [`AnalysisCache`] decides between the stored payload and a fresh call, and copies
//!   bibliographic facts from a fresh payload onto the record.
//! - [`SnapshotBuilder`] turns a stored payload into a display snapshot without calling
//!   the model again.
//!
//! The external call sits behind two seams. [`Completion`] sends a prompt and returns raw
//! text; [`Analyzer`] turns a PDF into an [`AnalysisPayload`]. [`PaperAnalyzer`] is the
//! production [`Analyzer`], built on any [`Completion`] such as [`ChatClient`].

use super::*;

mod cache;
mod client;
mod payload;
pub mod prompt;
pub mod response;
mod snapshot;

pub use self::{
  cache::{parse_year, AnalysisCache, AnalysisOutcome},
  client::{ChatClient, PaperAnalyzer},
  payload::*,
  snapshot::{
    AnalysisSnapshot, DisplayType, Section, SnapshotBuilder, SnapshotMetadata, VERSION_SCHEME,
  },
};

/// Sends a prompt to a language model and returns its raw answer.
#[async_trait]
pub trait Completion: Send + Sync {
  /// Runs one completion.
  async fn complete(&self, prompt: &str) -> Result<String>;

  /// Model recorded in the payload's provenance.
  fn model_name(&self) -> &str;
}

/// Produces a structured analysis of a PDF.
///
/// Failures (network, timeout, quota, malformed output) are returned as errors and are
/// never turned into an empty or partial success.
#[async_trait]
pub trait Analyzer: Send + Sync {
  /// Analyzes the PDF at `pdf_path`.
  async fn analyze(&self, pdf_path: &Path) -> Result<AnalysisPayload>;
}
