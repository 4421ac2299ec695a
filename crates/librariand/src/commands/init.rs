//! Module for setting up a [`librarian`] library

use super::*;

/// Options for [`Commands::Init`].
#[derive(Args, Clone)]
pub struct InitOptions {
  /// Location of the catalog database
  #[arg(long)]
  pub db_path:       Option<PathBuf>,
  /// Root that the papers folder is relative to
  #[arg(long)]
  pub library_root:  Option<PathBuf>,
  /// Folder below the library root holding the PDFs
  #[arg(long)]
  pub papers_folder: Option<PathBuf>,
  /// Model used for analyses
  #[arg(long)]
  pub model:         Option<String>,
  /// Base URL of the chat endpoint
  #[arg(long)]
  pub host:          Option<String>,
  /// Bearer credential for the chat endpoint
  #[arg(long)]
  pub api_key:       Option<String>,
}

/// Function for the [`Commands::Init`] in the CLI.
pub async fn init<I: UserInteraction>(
  interaction: &I,
  config_dir: &Path,
  init_options: InitOptions,
) -> Result<()> {
  let InitOptions { db_path, library_root, papers_folder, model, host, api_key } = init_options;

  let config_file = config_dir.join(CONFIG_FILE);
  if config_file.exists()
    && !interaction.confirm(&format!(
      "A configuration already exists at {}, do you want to overwrite it?",
      config_file.display()
    ))?
  {
    interaction.reply(ResponseContent::Info("Keeping the existing configuration"))?;
    return Ok(());
  }

  // Set database location
  let config = if let Some(db_path) = db_path {
    Config::default().with_database_path(db_path)
  } else if !interaction.confirm(&format!(
    "Would you like to use the default path {} for the catalog database?",
    Config::default().database_path.display(),
  ))? {
    interaction.reply(ResponseContent::Info(
      "Please pass in your intended database path using --db-path",
    ))?;
    return Ok(());
  } else {
    Config::default()
  };

  // Set library location
  let config = if let Some(library_root) = library_root {
    config.with_library_root(library_root)
  } else if !interaction.confirm(&format!(
    "Would you like to use the default path {} for the library?",
    Config::default_library_root().display(),
  ))? {
    interaction.reply(ResponseContent::Info(
      "Please pass in your intended library location using --library-root",
    ))?;
    return Ok(());
  } else {
    config
  };
  let config = match papers_folder {
    Some(folder) => config.with_papers_folder(folder),
    None => config,
  };

  let mut analysis = config.analysis.clone();
  if let Some(model) = model {
    analysis = analysis.with_model_name(model);
  }
  if let Some(host) = host {
    analysis = analysis.with_host(host);
  }
  if let Some(api_key) = api_key {
    analysis = analysis.with_api_key(api_key);
  }
  let config = config.with_analysis(analysis);

  std::fs::create_dir_all(config.papers_dir())?;
  Librarian::builder().with_path(config_dir).with_config(config.clone()).build().await?;

  interaction.reply(ResponseContent::Success(&format!(
    "Library initialized\nConfig path: {}\nDatabase path: {}\nPapers folder: {}\nModel: {}",
    config_file.display(),
    config.database_path.display(),
    config.papers_dir().display(),
    config.analysis.model_name,
  )))?;
  Ok(())
}
