//! Commands that bring PDFs into the catalog.

use super::*;

/// Options for [`Commands::Sync`].
#[derive(Args, Clone)]
pub struct SyncOptions {
  /// Treat a missing papers folder as empty, removing every record that points into it
  #[arg(long, action = ArgAction::SetTrue)]
  pub allow_missing_folder: bool,
}

/// Options for [`Commands::Upload`].
#[derive(Args, Clone)]
pub struct UploadOptions {
  /// PDF to copy into the papers folder
  pub file: PathBuf,
}

/// Function for the [`Commands::Sync`] in the CLI.
pub async fn sync<I: UserInteraction>(
  interaction: &I,
  librarian: &Librarian,
  sync_options: SyncOptions,
) -> Result<()> {
  let folder = librarian.config.papers_dir();
  if sync_options.allow_missing_folder
    && !folder.is_dir()
    && !interaction.confirm(&format!(
      "{} does not exist. Remove every paper that points into it?",
      folder.display()
    ))?
  {
    interaction.reply(ResponseContent::Info("Sync cancelled"))?;
    return Ok(());
  }

  let report = librarian
    .sync(ReconcileOptions { allow_missing_folder: sync_options.allow_missing_folder })
    .await?;
  interaction.reply(ResponseContent::Success(&format!(
    "Synced {}: {} added, {} removed, {} kept",
    folder.display(),
    report.added,
    report.removed_invalid,
    report.kept
  )))
}

/// Function for the [`Commands::Import`] in the CLI.
pub async fn import<I: UserInteraction>(interaction: &I, librarian: &Librarian) -> Result<()> {
  let report = librarian.import().await?;
  interaction.reply(ResponseContent::Success(&format!(
    "Imported {} new papers, {} already cataloged",
    report.imported, report.skipped
  )))
}

/// Function for the [`Commands::Upload`] in the CLI.
pub async fn upload<I: UserInteraction>(
  interaction: &I,
  librarian: &Librarian,
  upload_options: UploadOptions,
) -> Result<()> {
  let paper = librarian.upload(&upload_options.file).await?;
  interaction.reply(ResponseContent::Success(&format!("Uploaded paper {}", paper.id)))?;
  interaction.reply(ResponseContent::Paper(&paper))
}
