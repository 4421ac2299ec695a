//! Trash management.

use super::*;

/// Function for the [`Commands::Trash`] in the CLI.
pub async fn trash<I: UserInteraction>(
  interaction: &I,
  librarian: &Librarian,
  paper: PaperOptions,
) -> Result<()> {
  let paper = librarian.trash(paper.id).await?;
  interaction.reply(ResponseContent::Success(&format!(
    "Moved \"{}\" to the trash. Restore it with `librarian restore {}`",
    paper.title, paper.id
  )))
}

/// Function for the [`Commands::Restore`] in the CLI.
pub async fn restore<I: UserInteraction>(
  interaction: &I,
  librarian: &Librarian,
  paper: PaperOptions,
) -> Result<()> {
  let paper = librarian.restore(paper.id).await?;
  interaction.reply(ResponseContent::Success(&format!("Restored \"{}\"", paper.title)))
}

/// Function for the [`Commands::Purge`] in the CLI.
pub async fn purge<I: UserInteraction>(
  interaction: &I,
  librarian: &Librarian,
  paper: PaperOptions,
) -> Result<()> {
  let record = librarian.get(paper.id).await?;
  interaction.reply(ResponseContent::Paper(&record))?;
  if !interaction
    .confirm("Delete this paper and its PDF permanently? This cannot be undone.")?
  {
    interaction.reply(ResponseContent::Info("Purge cancelled"))?;
    return Ok(());
  }

  librarian.purge(record.id).await?;
  interaction.reply(ResponseContent::Success(&format!("Purged \"{}\"", record.title)))
}

/// Function for the [`Commands::EmptyTrash`] in the CLI.
pub async fn empty_trash<I: UserInteraction>(interaction: &I, librarian: &Librarian) -> Result<()> {
  let trashed = librarian.trashed().await?;
  if trashed.is_empty() {
    return interaction.reply(ResponseContent::Info("The trash is already empty"));
  }

  interaction.reply(ResponseContent::Papers(&trashed))?;
  if !interaction.confirm(&format!(
    "Delete these {} papers and their PDFs permanently? This cannot be undone.",
    trashed.len()
  ))? {
    interaction.reply(ResponseContent::Info("Trash left as it is"))?;
    return Ok(());
  }

  let purged = librarian.empty_trash().await?;
  interaction.reply(ResponseContent::Success(&format!("Emptied the trash, {purged} papers purged")))
}
