use anyhow::Result;

use crate::config::HarvestConfig;
use crate::download::Downloader;
use crate::filenames::generate_filenames;
use crate::snapshot::process_snapshot;

/// Totals for one harvest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
  /// Snapshots that downloaded with a body
  pub successful: usize,
  /// Snapshots that could not be downloaded
  pub failed: usize,
  /// Snapshots decoded, filtered, and saved
  pub written: usize,
}

pub struct HarvestRun {
  config: HarvestConfig,
  downloader: Downloader,
}

impl HarvestRun {
  pub fn new(config: HarvestConfig) -> Result<Self> {
    config.validate()?;
    let downloader = Downloader::new(config.base_url(), config.timeout())?;
    Ok(Self { config, downloader })
  }

  pub fn config(&self) -> &HarvestConfig {
    &self.config
  }

  /// Download and process every snapshot in order, one at a time.
  ///
  /// Individual failures are logged and counted; only configuration problems
  /// end the run early.
  pub async fn execute(&self) -> Result<HarvestSummary> {
    let filenames = generate_filenames(self.config.num_files, self.config.cadence())?;
    let total = filenames.len();

    bentley::info!(
      "🚀 Preparing to download {total} files from {}",
      self.downloader.base_url()
    );
    bentley::info!("📁 Output directory: {}", self.config.out_dir.display());
    bentley::info!("🌍 Region bounds: {}", self.config.region);
    bentley::info(&bentley::rule(50, '-'));

    let mut summary = HarvestSummary::default();

    for (i, filename) in filenames.iter().enumerate() {
      bentley::info!("[{}/{total}] Processing {filename}", i + 1);

      let Some(content) = self.downloader.fetch(filename).await.into_bytes() else {
        summary.failed += 1;
        continue;
      };
      summary.successful += 1;

      match process_snapshot(&content, filename, &self.config.region, &self.config.out_dir) {
        Ok(_) => summary.written += 1,
        Err(e) => bentley::warn!("⚠️  {filename}: {e}"),
      }
    }

    bentley::info(&bentley::rule(50, '='));
    bentley::info!(
      "📊 Summary: {} successful, {} failed",
      summary.successful,
      summary.failed
    );
    bentley::info!("📁 Files saved to: {}", self.config.out_dir.display());

    Ok(summary)
  }
}
