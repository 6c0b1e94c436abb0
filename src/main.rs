mod app;
mod cli;
mod commands;
mod config;
mod db;
mod event;
mod inventory;
mod logging;
mod shell;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "phonestock")]
#[command(about = "Track a phone shop's stock from the terminal, with an offline app shell cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/phonestock/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Database file to use instead of the configured one
  #[arg(long)]
  db: Option<PathBuf>,

  /// Run a single command instead of the terminal UI
  #[command(subcommand)]
  command: Option<cli::Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(db) = args.db {
    config.storage.database = Some(db);
  }

  let db_path = config.database_path()?;
  let log_dir = db_path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .map(|p| p.to_path_buf())
    .unwrap_or_else(|| PathBuf::from("."));
  let _log_guard = logging::init(&log_dir, args.command.is_some())?;
  tracing::debug!(database = %db_path.display(), "Starting");

  let db = Arc::new(db::Database::open(&db_path)?);

  match args.command {
    Some(command) => cli::run(command, &config, db).await,
    None => {
      let mut app = app::App::new(config, db);
      app.run().await
    }
  }
}
