mod commands;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use zube::config::{ClientConfig, Profile, DEFAULT_BASE_URL};

#[derive(Parser, Debug)]
#[command(name = "zube")]
#[command(about = "A command line utility for interacting with Zube.io")]
#[command(version)]
struct Args {
  /// Path to profile file (default: ~/config/zube/config.yml)
  #[arg(long, global = true)]
  profile: Option<PathBuf>,

  /// Skip the local response cache
  #[arg(long, global = true)]
  no_cache: bool,

  #[arg(long, global = true, hide = true, default_value = DEFAULT_BASE_URL)]
  api_url: String,

  #[command(subcommand)]
  command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _log_guard = init_logging();

  let args = Args::parse();

  let profile_path = match args.profile {
    Some(p) => p,
    None => Profile::default_path()?,
  };

  let ctx = commands::Context {
    profile_path,
    no_cache: args.no_cache,
    client: ClientConfig::with_base_url(args.api_url),
  };

  commands::run(args.command, &ctx).await
}

/// Log to stderr, filtered by `ZUBE_LOG` (default: warnings only).
fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
  let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

  let filter = EnvFilter::try_from_env("ZUBE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_target(false)
    .init();

  guard
}
