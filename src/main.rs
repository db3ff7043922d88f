mod api;
mod app;
mod commands;
mod config;
mod debounce;
mod event;
mod filters;
mod format;
mod query;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jobpulse")]
#[command(about = "A terminal dashboard for job-market analytics")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/jobpulse/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base URL, e.g. http://localhost:8000/api
  #[arg(long)]
  api_url: Option<String>,

  /// Write logs here instead of $XDG_DATA_HOME/jobpulse/jobpulse.log
  #[arg(long)]
  log_file: Option<PathBuf>,
}

/// Log to a file; the terminal belongs to the UI
fn init_logging(path: &Path) -> Result<WorkerGuard> {
  let dir = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or_else(|| Path::new("."));
  let file_name = path
    .file_name()
    .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(url) = args.api_url {
    config.api.base_url = url.trim_end_matches('/').to_string();
  }
  if let Some(path) = args.log_file {
    config.log_file = Some(path);
  }

  let _log_guard = init_logging(&config.log_path())?;

  let api = api::ApiClient::new(&config.api.base_url, config.request_timeout())
    .map_err(|e| eyre!("Failed to create API client: {}", e))?;
  let queries = query::init(config.query_defaults());

  let ctx = app::AppContext {
    api,
    queries,
    config: Arc::new(config),
  };

  let mut app = app::App::new(ctx);
  app.run().await?;

  Ok(())
}
