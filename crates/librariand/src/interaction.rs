//! Terminal output and prompts.
//!
//! Commands talk to the user only through [`UserInteraction`], which [`Cli`] implements
//! with `console` styling and `dialoguer` prompts.

use console::style;
use dialoguer::{Confirm, Input};
use serde_json::Value;

use super::*;

/// Prefix for information messages
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for success messages
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for error messages
pub static ERROR_PREFIX: &str = "✗ ";
/// Prefix for warning messages
pub static WARNING_PREFIX: &str = "! ";
/// Prefix for user prompts
pub static PROMPT_PREFIX: &str = "❯ ";
/// Continuation line for tree structure
pub static CONTINUE_PREFIX: &str = "│  ";
/// Branch character for tree structure
pub static TREE_BRANCH: &str = "├";
/// Leaf character for tree structure (end of branch)
pub static TREE_LEAF: &str = "└";
/// Marker for list items
pub static BULLET: &str = "•";

/// Longest text shown for one snapshot field before it is cut.
const FIELD_WIDTH: usize = 120;

/// Everything a command can show the user.
#[derive(Debug)]
#[allow(missing_docs)]
pub enum ResponseContent<'a> {
  Paper(&'a CatalogRecord),
  Papers(&'a [CatalogRecord]),
  Stats(&'a CatalogStats),
  Analysis(&'a AnalysisResult),
  Snapshot(&'a PaperSnapshot),
  Success(&'a str),
  Warning(&'a str),
  Error(&'a LibrariandError),
  Info(&'a str),
}

/// How commands ask questions and report results.
pub trait UserInteraction {
  /// Asks a yes/no question; `--accept-defaults` answers yes.
  fn confirm(&self, message: &str) -> Result<bool>;
  /// Asks for free text.
  fn prompt(&self, message: &str) -> Result<String>;
  /// Shows a result.
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

impl UserInteraction for Cli {
  fn confirm(&self, message: &str) -> Result<bool> {
    if self.accept_defaults {
      return Ok(true);
    }
    Ok(
      Confirm::new()
        .with_prompt(format!("{}{}", style(PROMPT_PREFIX).yellow(), message))
        .default(false)
        .wait_for_newline(true)
        .interact()?,
    )
  }

  fn prompt(&self, message: &str) -> Result<String> {
    Ok(
      Input::<String>::new()
        .with_prompt(format!("{}{}", style(PROMPT_PREFIX).yellow(), message))
        .interact_text()?,
    )
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    match content {
      ResponseContent::Paper(paper) => display_paper(paper),
      ResponseContent::Papers(papers) =>
        if papers.is_empty() {
          println!("{}No papers", style(INFO_PREFIX).cyan());
        } else {
          papers.iter().for_each(display_summary);
        },
      ResponseContent::Stats(stats) => println!(
        "{}{} papers, {} read, {} analyzed, {} with an experiment plan",
        style(INFO_PREFIX).cyan(),
        stats.total,
        stats.read,
        stats.ai_analyzed,
        stats.experiment_plans
      ),
      ResponseContent::Analysis(result) => display_analysis(result)?,
      ResponseContent::Snapshot(snapshot) => display_snapshot(snapshot),
      ResponseContent::Success(message) =>
        println!("{}{}", style(SUCCESS_PREFIX).green(), style(message).green()),
      ResponseContent::Warning(message) =>
        println!("{}{}", style(WARNING_PREFIX).yellow(), style(message).yellow()),
      ResponseContent::Error(error) =>
        eprintln!("{}{}", style(ERROR_PREFIX).red(), style(error).red()),
      ResponseContent::Info(message) => println!("{}{}", style(INFO_PREFIX).cyan(), message),
    }
    Ok(())
  }
}

/// One line per paper, as used by `list`.
fn display_summary(paper: &CatalogRecord) {
  let year = paper.year.map(|year| format!(" ({year})")).unwrap_or_default();
  let analyzed = if paper.ai_analyzed { format!(" {}", style("[analyzed]").magenta()) } else { String::new() };
  println!(
    "{} {}{} {} {}{}",
    style(format!("[{}]", paper.id)).dim(),
    style(&paper.title).bold(),
    year,
    style(BULLET).dim(),
    style(&paper.authors).italic(),
    analyzed
  );
}

/// Prints a labelled line of the paper tree.
fn branch(label: &str, value: impl std::fmt::Display) {
  println!("   {} {}: {}", style(TREE_BRANCH).cyan(), style(label).dim(), value);
}

/// The full record as a tree.
fn display_paper(paper: &CatalogRecord) {
  println!("{} {}", style(format!("[{}]", paper.id)).dim(), style(&paper.title).bold());
  branch("Authors", style(&paper.authors).italic());
  if let Some(journal) = &paper.journal {
    branch("Journal", journal);
  }
  if let Some(year) = paper.year {
    branch("Year", year);
  }
  branch("Category", &paper.category);
  branch("File", paper.storage_path.as_deref().unwrap_or("none"));
  branch("Metadata", format!("{} ({} confidence)", paper.parse_method, paper.parse_confidence));
  branch("Status", style(paper.read_status).yellow());
  match paper.analysis_timestamp {
    Some(at) if paper.ai_analyzed => branch(
      "Analysis",
      format!(
        "{}{}",
        at.format("%Y-%m-%d %H:%M"),
        if paper.has_experiment_plan { ", with experiment plan" } else { "" }
      ),
    ),
    _ => branch("Analysis", "none"),
  }
  if let Some(deleted_at) = paper.deleted_at() {
    branch("Trashed", style(deleted_at.format("%Y-%m-%d %H:%M")).red());
  }
  println!(
    "   {} {}: {}",
    style(TREE_LEAF).cyan(),
    style("Imported").dim(),
    paper.imported_at.format("%Y-%m-%d %H:%M")
  );
}

/// Headline facts of an analysis and the sections it contains.
fn display_analysis(result: &AnalysisResult) -> Result<()> {
  let origin = if result.payload.is_degraded() {
    style("degraded, not stored").yellow()
  } else if result.from_cache {
    style("cached").cyan()
  } else {
    style("fresh").green()
  };
  println!(
    "{} {} ({})",
    style(format!("[{}]", result.paper_id)).dim(),
    style(&result.title).bold(),
    origin
  );

  if let Some(basic) = &result.payload.basic_info {
    for (label, value) in [
      ("Authors", &basic.authors),
      ("Journal", &basic.journal),
      ("Published", &basic.publish_date),
      ("Category", &basic.category),
    ] {
      if !value.is_empty() {
        branch(label, value);
      }
    }
  }

  let sections = match serde_json::to_value(&result.payload)? {
    Value::Object(map) => map.keys().cloned().collect::<Vec<_>>(),
    _ => Vec::new(),
  };
  println!("   {} {}: {}", style(TREE_LEAF).cyan(), style("Sections").dim(), sections.join(", "));
  Ok(())
}

/// Every section of a snapshot with its non-empty fields.
fn display_snapshot(paper: &PaperSnapshot) {
  let snapshot = &paper.snapshot;
  println!("{} {}", style(format!("[{}]", paper.paper_id)).dim(), style(&paper.title).bold());
  println!(
    "{}{} {}",
    CONTINUE_PREFIX,
    style("Version").dim(),
    style(&snapshot.version).cyan()
  );
  if let Some(model) = &snapshot.analysis_model {
    println!("{}{} {}", CONTINUE_PREFIX, style("Model").dim(), model);
  }

  for (index, section) in snapshot.sections.iter().enumerate() {
    let last = index + 1 == snapshot.sections.len();
    let (marker, indent) = if last { (TREE_LEAF, "   ") } else { (TREE_BRANCH, CONTINUE_PREFIX) };
    println!("{} {}", style(marker).cyan(), style(&section.title).bold());
    for (field, value) in &section.content {
      let text = match value {
        Value::String(text) => text.clone(),
        Value::Array(items) =>
          items.iter().filter_map(Value::as_str).collect::<Vec<_>>().join("; "),
        other => other.to_string(),
      };
      if text.is_empty() {
        continue;
      }
      println!("{}{} {}: {}", indent, style(BULLET).dim(), style(field).dim(), clip(&text));
    }
  }
}

/// Cuts long text at a character boundary.
fn clip(text: &str) -> String {
  match text.char_indices().nth(FIELD_WIDTH) {
    Some((end, _)) => format!("{}…", &text[..end]),
    None => text.to_string(),
  }
}
