mod app;
mod cache;
mod config;
mod event;
mod query;
mod table;
mod ui;
mod users;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "udir")]
#[command(about = "A terminal UI for browsing a remote user directory, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/udir/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// 1-based table page to open on
  #[arg(short, long, default_value_t = 1)]
  page: usize,

  /// Override the user-listing endpoint
  #[arg(long)]
  url: Option<Url>,

  /// Disable the in-memory cache (every read hits the network)
  #[arg(long)]
  no_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  // Load configuration, then apply command-line overrides
  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(url) = args.url {
    config.api.url = url;
  }
  if args.no_cache {
    config.cache_enabled = false;
  }

  // Initialize and run the app
  let mut app = app::App::new(config, args.page)?;
  app.run().await?;

  Ok(())
}

/// Log to a file under the user data dir; stderr would corrupt the TUI.
/// Filter with UDIR_LOG (e.g. UDIR_LOG=udir=debug).
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_local_dir()
    .unwrap_or_else(std::env::temp_dir)
    .join("udir");
  std::fs::create_dir_all(&log_dir)?;

  let appender = tracing_appender::rolling::never(log_dir, "udir.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_env("UDIR_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
