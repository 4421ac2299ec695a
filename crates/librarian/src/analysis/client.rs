//! Production implementations of the analysis seams.

use super::{
  prompt::{analysis_prompt, frame_pages},
  response::parse_response,
  *,
};

/// [`Completion`] against an Ollama-compatible chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
  /// Endpoint, model, credential and timeout
  config: AnalysisConfig,
}

impl ChatClient {
  /// Creates a client from the analysis settings.
  pub fn new(config: AnalysisConfig) -> Self { Self { config } }
}

#[async_trait]
impl Completion for ChatClient {
  async fn complete(&self, prompt: &str) -> Result<String> {
    let response = ChatRequest::new()
      .with_host(&self.config.host)?
      .with_model(self.config.model_name.clone())
      .with_message(prompt)
      .with_api_key(self.config.api_key.clone())
      .with_timeout(self.config.timeout())
      .send()
      .await?;
    Ok(response.message.content)
  }

  fn model_name(&self) -> &str { &self.config.model_name }
}

/// Analyzes a paper by sending its first pages to a [`Completion`].
pub struct PaperAnalyzer {
  /// Source of page text
  extractor:  Arc<dyn PdfTextExtractor>,
  /// The model
  completion: Arc<dyn Completion>,
  /// Pages of text sent
  max_pages:  usize,
  /// Characters of text sent
  max_chars:  usize,
}

impl PaperAnalyzer {
  /// Creates an analyzer from its collaborators.
  pub fn new(
    extractor: Arc<dyn PdfTextExtractor>,
    completion: Arc<dyn Completion>,
    config: &AnalysisConfig,
  ) -> Self {
    Self { extractor, completion, max_pages: config.max_pages, max_chars: config.max_chars }
  }
}

#[async_trait]
impl Analyzer for PaperAnalyzer {
  async fn analyze(&self, pdf_path: &Path) -> Result<AnalysisPayload> {
    let extractor = Arc::clone(&self.extractor);
    let path = pdf_path.to_path_buf();
    let max_pages = self.max_pages;
    let pages = tokio::task::spawn_blocking(move || extractor.page_texts(&path, max_pages)).await??;

    let content = frame_pages(&pages, self.max_chars);
    if content.is_empty() {
      return Err(LibrarianError::NoText(pdf_path.to_path_buf()));
    }

    info!(
      "Analyzing {} ({} pages, {} characters) with {}",
      pdf_path.display(),
      pages.len(),
      content.chars().count(),
      self.completion.model_name()
    );
    let raw = self.completion.complete(&analysis_prompt(&content)).await?;

    let mut payload = parse_response(&raw)?;
    payload.ai_meta = Some(AiMeta {
      analysis_model: self.completion.model_name().to_string(),
      analysis_time:  Utc::now().to_rfc3339(),
      confidence:     "high".to_string(),
      analysis_depth: "comprehensive".to_string(),
    });
    Ok(payload)
  }
}
