use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use harvester::{HarvestConfig, HarvestRun};

#[derive(Parser)]
#[command(name = "adsb-harvest")]
#[command(
  about = "ADS-B snapshot harvester\nDownloads archive snapshots and keeps the flights inside a region"
)]
#[command(version)]
struct Cli {
  /// YAML config file; flags below override its values
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Archive day to harvest (YYYY-MM-DD)
  #[arg(long)]
  date: Option<NaiveDate>,

  /// Number of snapshots to download
  #[arg(short = 'n', long)]
  count: Option<usize>,

  /// Output directory for filtered snapshots
  #[arg(short, long)]
  out: Option<PathBuf>,

  /// Archive directory URL, overriding the one derived from --date
  #[arg(long)]
  base_url: Option<String>,

  /// Per-request timeout in seconds
  #[arg(long)]
  timeout_secs: Option<u64>,

  /// Show debug output
  #[arg(short, long)]
  verbose: bool,

  /// Only show warnings and errors
  #[arg(short, long, conflicts_with = "verbose")]
  quiet: bool,
}

impl Cli {
  fn apply(self, mut config: HarvestConfig) -> HarvestConfig {
    if let Some(date) = self.date {
      config.date = date;
    }
    if let Some(count) = self.count {
      config.num_files = count;
    }
    if let Some(out) = self.out {
      config.out_dir = out;
    }
    if let Some(base_url) = self.base_url {
      config.base_url = Some(base_url);
    }
    if let Some(timeout) = self.timeout_secs {
      config.timeout_secs = timeout;
    }
    config
  }
}

fn init_logging(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if verbose {
      EnvFilter::new("harvester=debug,warn")
    } else {
      EnvFilter::new("warn")
    }
  });

  let _ = tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(filter)
    .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  init_logging(cli.verbose);
  bentley::set_verbosity(bentley::Verbosity::from_flags(cli.quiet, cli.verbose));

  let config = HarvestConfig::load(cli.config.as_deref())?;
  let config = cli.apply(config);

  let run = HarvestRun::new(config)?;
  run.execute().await?;

  Ok(())
}
