//! Module for abstracting the "clean" functionality to the [`librarian`] catalog.

use super::*;

/// Function for the [`Commands::Clean`] in the CLI.
///
/// Deletes the catalog database and its SQLite side files. The configuration and the
/// PDFs in the library are left alone.
pub async fn clean(cli: &Cli, config_dir: &Path) -> Result<()> {
  let config_file = config_dir.join(CONFIG_FILE);
  let path = if config_file.is_file() {
    Config::load(&config_file)?.database_path
  } else {
    let default_path = Config::default().database_path;
    cli.reply(ResponseContent::Info(&format!(
      "Using default database path: {}",
      default_path.display()
    )))?;
    default_path
  };

  if !path.exists() {
    return cli
      .reply(ResponseContent::Warning(&format!("No database found at: {}", path.display())));
  }
  cli.reply(ResponseContent::Warning(&format!("Database found at: {}", path.display())))?;

  // Skip confirmations if force flag is set
  if !cli.accept_defaults {
    if !cli.confirm("Are you sure you want to delete this database?")? {
      cli.reply(ResponseContent::Info("Operation cancelled"))?;
      return Ok(());
    }

    // Require typing DELETE for final confirmation
    let input = cli.prompt(&format!("Type {} to confirm deletion", style("DELETE").red().bold()))?;
    if input != "DELETE" {
      cli.reply(ResponseContent::Info("Operation cancelled"))?;
      return Ok(());
    }
  }

  cli.reply(ResponseContent::Warning(&format!("Removing database: {}", path.display())))?;
  std::fs::remove_file(&path)?;

  // Also remove the journal and WAL files next to it
  let pattern = format!("{}-*", glob::Pattern::escape(&path.display().to_string()));
  for file in glob::glob(&pattern)?.flatten() {
    std::fs::remove_file(file)?;
  }
  cli.reply(ResponseContent::Success("Database files cleaned"))
}
