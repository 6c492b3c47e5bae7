mod api;
mod app;
mod cache;
mod commands;
mod config;
mod event;
mod query;
mod route;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogConfig};
use crate::route::Route;

#[derive(Parser, Debug)]
#[command(name = "rmtui")]
#[command(about = "A terminal UI for browsing Rick and Morty characters")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/rmtui/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Route to open, e.g. "/?page=3" or "/character/1"
  #[arg(short, long)]
  route: Option<String>,

  /// Character list page to open (ignored when --route is given)
  #[arg(short, long)]
  page: Option<String>,

  /// Override the API base URL
  #[arg(long)]
  base_url: Option<String>,
}

impl Args {
  fn initial_route(&self) -> Result<Route> {
    match (&self.route, &self.page) {
      (Some(route), _) => Route::parse(route),
      (None, Some(page)) => Ok(Route::CharacterList {
        page: route::normalize_page(Some(page)),
      }),
      (None, None) => Ok(Route::default()),
    }
  }
}

/// Send tracing output to the log file; the terminal belongs to the UI.
fn init_logging(log: &LogConfig) -> Result<WorkerGuard> {
  let path = log.file_path()?;
  let dir = path
    .parent()
    .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
  let file_name = path
    .file_name()
    .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level)),
    )
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;

  // Override base URL if specified on command line
  if let Some(base_url) = args.base_url.clone() {
    config.api.base_url = base_url;
  }

  let route = args.initial_route()?;
  let _guard = init_logging(&config.log)?;
  tracing::info!(base_url = %config.api.base_url, %route, "starting rmtui");

  // Initialize and run the app
  let mut app = app::App::new(&config, route)?;
  app.run().await?;

  Ok(())
}
