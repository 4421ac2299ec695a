//! Command line interface for the librarian paper library.
//!
//! This crate provides the `librarian` executable over the `librarian` library. It
//! supports operations like:
//! - Library initialization and catalog cleanup
//! - Syncing the catalog with the papers folder, importing and uploading PDFs
//! - Listing papers, tracking reading progress and managing the trash
//! - Running and caching AI analyses, and rendering their snapshots
//!
//! # Usage
//!
//! ```bash
//! # Set up a library in ~/Documents/librarian
//! librarian init
//!
//! # Catalog every PDF in the papers folder
//! librarian sync
//!
//! # Copy a downloaded paper into the library
//! librarian upload ~/Downloads/attention.pdf
//!
//! # Analyze paper 3 and show the sections of the result
//! librarian analyze 3
//! librarian snapshot 3
//!
//! # Move a paper to the trash, then empty it
//! librarian trash 3
//! librarian empty-trash
//! ```
//!
//! Output is colored and destructive operations ask for confirmation. Verbosity of
//! the log output is raised with repeated `-v` flags or set through `RUST_LOG`.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  path::{Path, PathBuf},
  process::ExitCode,
};

use clap::{builder::ArgAction, Args, Parser, Subcommand};
use console::style;
use librarian::{
  error::LibrarianError, reconcile::ReconcileOptions, record::CatalogRecord, AnalysisResult,
  CatalogStats, Config, Librarian, PaperSnapshot, CONFIG_FILE,
};
use tracing::trace;
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;
pub mod interaction;

use crate::{commands::*, error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Keep a catalog of research papers and their AI analyses")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Directory holding `config.toml`. If not specified, uses the platform-specific
  /// configuration directory.
  #[arg(long, short, global = true)]
  config: Option<PathBuf>,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,

  /// Skip all prompts and accept defaults (mostly for testing)
  #[arg(long, hide = true, global = true)]
  accept_defaults: bool,
}

/// Configures the logging system based on the verbosity level
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .init();
}

/// Opens the library configured in `config_dir`, pointing at `init` when there is none.
async fn open(config_dir: &Path) -> Result<Librarian> {
  if !config_dir.join(CONFIG_FILE).is_file() {
    return Err(LibrariandError::NotInitialized(config_dir.to_path_buf()));
  }
  Ok(Librarian::from_path(config_dir).await?)
}

/// Executes the parsed command.
async fn run(cli: &Cli) -> Result<()> {
  let config_dir = match &cli.config {
    Some(dir) => dir.clone(),
    None => Config::default_path()?,
  };
  trace!("Using configuration directory {}", config_dir.display());

  match cli.command.clone() {
    Commands::Init(options) => init(cli, &config_dir, options).await,
    Commands::Clean => clean(cli, &config_dir).await,
    Commands::Sync(options) => sync(cli, &open(&config_dir).await?, options).await,
    Commands::Import => import(cli, &open(&config_dir).await?).await,
    Commands::Upload(options) => upload(cli, &open(&config_dir).await?, options).await,
    Commands::List(options) => list(cli, &open(&config_dir).await?, options).await,
    Commands::Show(paper) => show(cli, &open(&config_dir).await?, paper).await,
    Commands::Read(options) => read(cli, &open(&config_dir).await?, options).await,
    Commands::Pdf(paper) => pdf(cli, &open(&config_dir).await?, paper).await,
    Commands::Analyze(options) => analyze(cli, &open(&config_dir).await?, options).await,
    Commands::Snapshot(options) => snapshot(cli, &open(&config_dir).await?, options).await,
    Commands::Trash(paper) => trash(cli, &open(&config_dir).await?, paper).await,
    Commands::Restore(paper) => restore(cli, &open(&config_dir).await?, paper).await,
    Commands::Purge(paper) => purge(cli, &open(&config_dir).await?, paper).await,
    Commands::EmptyTrash => empty_trash(cli, &open(&config_dir).await?).await,
  }
}

/// Entry point for the librarian CLI application
///
/// Parses the command line, sets up logging and executes the requested command.
/// Failures are reported on stderr and turn into a non-zero exit status.
#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  match run(&cli).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(error) => {
      cli.reply(ResponseContent::Error(&error)).unwrap_or_else(|_| eprintln!("{error}"));
      ExitCode::FAILURE
    },
  }
}
