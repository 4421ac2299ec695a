//! Library configuration.
//!
//! A [`Config`] is built once at process start, usually by reading `config.toml`, and
//! handed to [`Librarian`](crate::Librarian). Nothing in the library reads environment
//! variables or other global state; every setting arrives through this value.
//!
//! ```toml
//! database_path = "/home/me/.local/share/librarian/librarian.db"
//! library_root = "/home/me/Documents/librarian"
//! papers_folder = "papers"
//!
//! [analysis]
//! model_name = "llama3.2:3b"
//! host = "http://localhost:11434"
//! allowed_origins = ["http://localhost:5173"]
//! timeout_secs = 300
//! max_pages = 20
//! max_chars = 50000
//! ```

use super::*;

/// Name of the configuration file inside the configuration directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Settings for the whole library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Location of the SQLite catalog
  pub database_path: PathBuf,
  /// Root that storage paths are relative to
  pub library_root:  PathBuf,
  /// Folder below the root that holds the PDFs
  pub papers_folder: PathBuf,
  /// Settings for the external analysis call
  pub analysis:      AnalysisConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_path: Database::default_path(),
      library_root:  Self::default_library_root(),
      papers_folder: PathBuf::from("papers"),
      analysis:      AnalysisConfig::default(),
    }
  }
}

impl Config {
  /// Directory holding the configuration file.
  pub fn default_path() -> Result<PathBuf> {
    dirs::config_dir()
      .map(|dir| dir.join("librarian"))
      .ok_or_else(|| LibrarianError::Config("No configuration directory on this platform".into()))
  }

  /// Default root of the library, `~/Documents/librarian` where available.
  pub fn default_library_root() -> PathBuf {
    dirs::document_dir().unwrap_or_else(|| PathBuf::from(".")).join("librarian")
  }

  /// Reads a configuration file. Missing keys take their default values.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let config: Self = toml::from_str(&content)?;
    debug!("Loaded configuration from {}", path.as_ref().display());
    Ok(config)
  }

  /// Writes the configuration file, creating its directory if needed.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(self)?)?;
    debug!("Saved configuration to {}", path.display());
    Ok(())
  }

  /// Absolute folder scanned by sync and import, and where uploads land.
  pub fn papers_dir(&self) -> PathBuf { self.library_root.join(&self.papers_folder) }

  /// Sets the catalog location.
  pub fn with_database_path(mut self, path: impl AsRef<Path>) -> Self {
    self.database_path = path.as_ref().to_path_buf();
    self
  }

  /// Sets the library root.
  pub fn with_library_root(mut self, path: impl AsRef<Path>) -> Self {
    self.library_root = path.as_ref().to_path_buf();
    self
  }

  /// Sets the papers folder, relative to the library root.
  pub fn with_papers_folder(mut self, folder: impl AsRef<Path>) -> Self {
    self.papers_folder = folder.as_ref().to_path_buf();
    self
  }

  /// Replaces the analysis settings.
  pub fn with_analysis(mut self, analysis: AnalysisConfig) -> Self {
    self.analysis = analysis;
    self
  }
}

/// Settings for the external analysis call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
  /// Bearer credential for the completion endpoint
  pub api_key:         Option<String>,
  /// Model asked to analyze papers
  pub model_name:      String,
  /// Origins a web front end may call from; carried for boundary layers
  pub allowed_origins: Vec<String>,
  /// Base URL of the completion endpoint
  pub host:            String,
  /// Upper bound on one analysis call, in seconds
  pub timeout_secs:    u64,
  /// Pages of text sent for analysis
  pub max_pages:       usize,
  /// Characters of text sent for analysis
  pub max_chars:       usize,
}

impl Default for AnalysisConfig {
  fn default() -> Self {
    Self {
      api_key:         None,
      model_name:      "llama3.2:3b".to_string(),
      allowed_origins: Vec::new(),
      host:            "http://localhost:11434".to_string(),
      timeout_secs:    300,
      max_pages:       20,
      max_chars:       50_000,
    }
  }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for AnalysisConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AnalysisConfig")
      .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
      .field("model_name", &self.model_name)
      .field("allowed_origins", &self.allowed_origins)
      .field("host", &self.host)
      .field("timeout_secs", &self.timeout_secs)
      .field("max_pages", &self.max_pages)
      .field("max_chars", &self.max_chars)
      .finish()
  }
}

impl AnalysisConfig {
  /// Sets the bearer credential.
  pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
    self.api_key = Some(api_key.into());
    self
  }

  /// Sets the model name.
  pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
    self.model_name = model_name.into();
    self
  }

  /// Sets the allowed origins.
  pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
    self.allowed_origins = origins;
    self
  }

  /// Sets the endpoint base URL.
  pub fn with_host(mut self, host: impl Into<String>) -> Self {
    self.host = host.into();
    self
  }

  /// Sets the call timeout.
  pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
    self.timeout_secs = timeout_secs;
    self
  }

  /// Bounded timeout for one analysis call.
  pub fn timeout(&self) -> std::time::Duration { std::time::Duration::from_secs(self.timeout_secs) }
}
