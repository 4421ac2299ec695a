//! Minimal client for an Ollama-compatible chat endpoint.
//!
//! Requests are assembled with a builder and sent as a single non-streaming call:
//!
//! ```no_run
//! use librarian::llm::ChatRequest;
//!
//! # async fn example() -> Result<(), librarian::error::LibrarianError> {
//! let response = ChatRequest::new()
//!   .with_host("http://localhost:11434")?
//!   .with_model("llama3.2:3b")
//!   .with_message("Summarize this abstract: ...")
//!   .send()
//!   .await?;
//! println!("{}", response.message.content);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use super::*;

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Path of the chat endpoint below the host.
const CHAT_ENDPOINT: &str = "api/chat";

/// A chat completion request.
#[derive(Serialize, Default)]
pub struct ChatRequest {
  /// Model to run
  pub model: Option<String>,

  /// Conversation so far
  pub messages: Vec<Message>,

  /// Always false; the whole answer is returned at once
  pub stream: bool,

  /// Sampling options
  pub options: Options,

  /// Base URL of the server
  #[serde(skip)]
  pub host: Option<Url>,

  /// Bearer credential, if the server wants one
  #[serde(skip)]
  pub api_key: Option<String>,

  /// Upper bound on the whole call
  #[serde(skip)]
  pub timeout: Option<Duration>,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  /// Who is speaking: `system`, `user` or `assistant`
  pub role: String,

  /// What was said
  pub content: String,
}

/// Sampling options sent with every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
  num_predict: u64,
  top_k:       u64,
  top_p:       f64,
  temperature: f64,
}

// Long structured answers, low randomness.
impl Default for Options {
  fn default() -> Self { Self { num_predict: 16_000, top_k: 50, top_p: 0.95, temperature: 0.3 } }
}

/// Answer of the chat endpoint. Only `message` is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
  /// Model that answered
  #[serde(default)]
  pub model:       String,
  /// Server timestamp
  #[serde(default)]
  pub created_at:  String,
  /// The answer
  pub message:     Message,
  /// Why generation stopped, e.g. `stop` or `length`
  #[serde(default)]
  pub done_reason: Option<String>,
  /// Whether generation finished
  #[serde(default)]
  pub done:        bool,
  /// Tokens generated
  #[serde(default)]
  pub eval_count:  Option<u64>,
}

impl ChatRequest {
  /// Creates an empty request.
  pub fn new() -> Self { Self::default() }

  /// Sets the server base URL.
  ///
  /// Fails with [`LibrarianError::Config`] if `host` is not a URL.
  pub fn with_host(mut self, host: &str) -> Result<Self> {
    let url =
      Url::parse(host).map_err(|e| LibrarianError::Config(format!("Invalid analysis host {host:?}: {e}")))?;
    self.host = Some(url);
    Ok(self)
  }

  /// Sets the model.
  pub fn with_model(mut self, model: impl Into<String>) -> Self {
    self.model.replace(model.into());
    self
  }

  /// Appends a user message.
  pub fn with_message(mut self, content: &str) -> Self {
    self.messages.push(Message { role: "user".to_string(), content: content.to_string() });
    self
  }

  /// Sets the bearer credential.
  pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
    self.api_key = api_key;
    self
  }

  /// Bounds the whole call.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  /// Full URL of the chat endpoint.
  pub fn endpoint(&self) -> Result<Url> {
    let host = match &self.host {
      Some(host) => host.clone(),
      None => {
        warn!("No host set, using {DEFAULT_HOST}");
        Url::parse(DEFAULT_HOST).map_err(|e| LibrarianError::Config(e.to_string()))?
      },
    };
    host.join(CHAT_ENDPOINT).map_err(|e| LibrarianError::Config(e.to_string()))
  }

  /// Sends the request and waits for the full answer.
  pub async fn send(&self) -> Result<ChatResponse> {
    if self.model.is_none() {
      return Err(LibrarianError::LLMMissingModel);
    }
    if self.messages.is_empty() {
      return Err(LibrarianError::LLMMissingMessage);
    }

    let url = self.endpoint()?;
    let mut client = reqwest::Client::builder();
    if let Some(timeout) = self.timeout {
      client = client.timeout(timeout);
    }
    let mut request = client.build()?.post(url.clone()).json(self);
    if let Some(api_key) = &self.api_key {
      request = request.bearer_auth(api_key);
    }

    debug!("Sending chat request to {url}");
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(LibrarianError::Api(format!("{status}: {body}")));
    }

    let response: ChatResponse = response.json().await?;
    if response.done_reason.as_deref() == Some("length") {
      warn!("Model output hit the length limit and is probably truncated");
    }
    Ok(response)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[ignore = "Can't run this in general -- relies on local LLM endpoint."]
  #[tokio::test]
  async fn test_send_request() {
    let response = ChatRequest::new()
      .with_host(DEFAULT_HOST)
      .unwrap()
      .with_model("llama3.2:3b")
      .with_message("Please tell me what is the capital of France?")
      .send()
      .await
      .unwrap();
    assert!(response.message.content.contains("Paris"))
  }

  #[tokio::test]
  async fn test_missing_model_and_message() {
    let err = ChatRequest::new().with_message("hi").send().await.unwrap_err();
    assert!(matches!(err, LibrarianError::LLMMissingModel));

    let err = ChatRequest::new().with_model("llama3.2:3b").send().await.unwrap_err();
    assert!(matches!(err, LibrarianError::LLMMissingMessage));
  }

  #[traced_test]
  #[test]
  fn test_endpoint() {
    let request = ChatRequest::new();
    assert_eq!(request.endpoint().unwrap().as_str(), "http://localhost:11434/api/chat");
    assert!(logs_contain("No host set"));

    let request = ChatRequest::new().with_host("https://llm.example.com/").unwrap();
    assert_eq!(request.endpoint().unwrap().as_str(), "https://llm.example.com/api/chat");
  }

  #[test]
  fn test_invalid_host_is_a_config_error() {
    let err = ChatRequest::new().with_host("not a url").err().unwrap();
    assert!(matches!(err, LibrarianError::Config(reason) if reason.contains("not a url")));
    assert!(!LibrarianError::Config(String::new()).is_analysis_failure());
  }

  #[test]
  fn test_request_body_hides_transport_fields() {
    let request = ChatRequest::new()
      .with_model("llama3.2:3b")
      .with_message("hello")
      .with_api_key(Some("secret".into()));
    let body = serde_json::to_value(&request).unwrap();
    assert_eq!(body["model"], "llama3.2:3b");
    assert_eq!(body["stream"], false);
    assert_eq!(body["messages"][0]["role"], "user");
    assert!(body.get("api_key").is_none());
  }

  #[test]
  fn test_minimal_response_parses() {
    let response: ChatResponse =
      serde_json::from_str(r#"{"message":{"role":"assistant","content":"{}"}}"#).unwrap();
    assert_eq!(response.message.content, "{}");
    assert!(!response.done);
  }
}
