//! Commands that read or annotate single papers.

use librarian::record::ReadStatus;

use super::*;

/// Options for [`Commands::List`].
#[derive(Args, Clone)]
pub struct ListOptions {
  /// Show the trash instead of the catalog
  #[arg(long, action = ArgAction::SetTrue)]
  pub trashed: bool,
}

/// Options for [`Commands::Read`].
#[derive(Args, Clone)]
pub struct ReadOptions {
  /// Paper id, as shown by `librarian list`
  pub id:     i64,
  /// New status (unread, reading or read). Toggles between read and unread if omitted.
  #[arg(long)]
  pub status: Option<String>,
}

/// Function for the [`Commands::List`] in the CLI.
pub async fn list<I: UserInteraction>(
  interaction: &I,
  librarian: &Librarian,
  list_options: ListOptions,
) -> Result<()> {
  if list_options.trashed {
    let papers = librarian.trashed().await?;
    return interaction.reply(ResponseContent::Papers(&papers));
  }
  let papers = librarian.papers().await?;
  interaction.reply(ResponseContent::Papers(&papers))?;
  interaction.reply(ResponseContent::Stats(&librarian.stats().await?))
}

/// Function for the [`Commands::Show`] in the CLI.
pub async fn show<I: UserInteraction>(
  interaction: &I,
  librarian: &Librarian,
  paper: PaperOptions,
) -> Result<()> {
  interaction.reply(ResponseContent::Paper(&librarian.get(paper.id).await?))
}

/// Function for the [`Commands::Read`] in the CLI.
pub async fn read<I: UserInteraction>(
  interaction: &I,
  librarian: &Librarian,
  read_options: ReadOptions,
) -> Result<()> {
  let paper = match read_options.status {
    Some(status) => librarian.set_read_status(read_options.id, status.parse::<ReadStatus>()?).await?,
    None => librarian.toggle_read(read_options.id).await?,
  };
  interaction
    .reply(ResponseContent::Success(&format!("Paper {} is now {}", paper.id, paper.read_status)))
}

/// Function for the [`Commands::Pdf`] in the CLI.
pub async fn pdf<I: UserInteraction>(
  _interaction: &I,
  librarian: &Librarian,
  paper: PaperOptions,
) -> Result<()> {
  // bare path on stdout so it can be piped into a viewer
  println!("{}", librarian.pdf_path(paper.id).await?.display());
  Ok(())
}
