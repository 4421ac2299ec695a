//! Analysis commands.

use super::*;

/// Options for [`Commands::Analyze`].
#[derive(Args, Clone)]
pub struct AnalyzeOptions {
  /// Paper id, as shown by `librarian list`
  pub id:      i64,
  /// Ask the model again even if an analysis is stored
  #[arg(long, action = ArgAction::SetTrue)]
  pub force:   bool,
  /// On failure show what the catalog already knows instead of an error
  #[arg(long, action = ArgAction::SetTrue)]
  pub degrade: bool,
}

/// Options for [`Commands::Snapshot`].
#[derive(Args, Clone)]
pub struct SnapshotOptions {
  /// Paper id, as shown by `librarian list`
  pub id:   i64,
  /// Print the snapshot as JSON
  #[arg(long, action = ArgAction::SetTrue)]
  pub json: bool,
}

/// Function for the [`Commands::Analyze`] in the CLI.
pub async fn analyze<I: UserInteraction>(
  interaction: &I,
  librarian: &Librarian,
  analyze_options: AnalyzeOptions,
) -> Result<()> {
  let AnalyzeOptions { id, force, degrade } = analyze_options;
  let verb = if force { "Re-analyzing" } else { "Analyzing" };
  interaction.reply(ResponseContent::Info(&format!("{verb} paper {id}")))?;

  let result = if degrade {
    librarian.analyze_or_degrade(id, force).await?
  } else {
    librarian.analyze(id, force).await?
  };
  if result.payload.is_degraded() {
    interaction
      .reply(ResponseContent::Warning("The analysis failed; showing the catalog record instead"))?;
  }
  interaction.reply(ResponseContent::Analysis(&result))
}

/// Function for the [`Commands::Snapshot`] in the CLI.
pub async fn snapshot<I: UserInteraction>(
  interaction: &I,
  librarian: &Librarian,
  snapshot_options: SnapshotOptions,
) -> Result<()> {
  let snapshot = librarian.snapshot(snapshot_options.id).await?;
  if snapshot_options.json {
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    return Ok(());
  }
  interaction.reply(ResponseContent::Snapshot(&snapshot))
}
