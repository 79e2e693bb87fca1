//! Harvest configuration
//!
//! Everything the harvester needs is carried in one [`HarvestConfig`] that is
//! built from defaults, an optional YAML file, and CLI overrides, then passed
//! explicitly to the downloader and the snapshot processor.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::filenames;

/// Root of the public readsb-hist sample archive; the date path is appended.
pub const ARCHIVE_ROOT: &str = "https://samples.adsbexchange.com/readsb-hist/";

/// Closed latitude/longitude box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
  pub lamin: f64,
  pub lamax: f64,
  pub lomin: f64,
  pub lomax: f64,
}

impl Default for RegionBounds {
  fn default() -> Self {
    Self { lamin: 6.0, lamax: 36.0, lomin: 68.0, lomax: 98.0 }
  }
}

impl RegionBounds {
  /// Inclusive on every edge
  pub fn contains(&self, lat: f64, lon: f64) -> bool {
    self.lamin <= lat && lat <= self.lamax && self.lomin <= lon && lon <= self.lomax
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let all = [self.lamin, self.lamax, self.lomin, self.lomax];
    if all.iter().any(|v| !v.is_finite()) {
      return Err(ConfigError::invalid("region bounds must be finite numbers"));
    }
    if self.lamin > self.lamax {
      return Err(ConfigError::invalid(format!(
        "lamin ({}) cannot exceed lamax ({})",
        self.lamin, self.lamax
      )));
    }
    if self.lomin > self.lomax {
      return Err(ConfigError::invalid(format!(
        "lomin ({}) cannot exceed lomax ({})",
        self.lomin, self.lomax
      )));
    }
    if self.lamin < -90.0 || self.lamax > 90.0 {
      return Err(ConfigError::invalid("latitude bounds must lie within [-90, 90]"));
    }
    if self.lomin < -180.0 || self.lomax > 180.0 {
      return Err(ConfigError::invalid("longitude bounds must lie within [-180, 180]"));
    }
    Ok(())
  }
}

impl std::fmt::Display for RegionBounds {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "lat [{}, {}] lon [{}, {}]",
      self.lamin, self.lamax, self.lomin, self.lomax
    )
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
  /// Archive day to harvest
  pub date: NaiveDate,
  /// Replaces the archive URL derived from `date` (mirrors, tests)
  pub base_url: Option<String>,
  /// Where filtered snapshots are written
  pub out_dir: PathBuf,
  /// Number of snapshots to request
  pub num_files: usize,
  /// Spacing between archived snapshots
  pub cadence_secs: u64,
  /// Per-request network timeout
  pub timeout_secs: u64,
  pub region: RegionBounds,
}

impl Default for HarvestConfig {
  fn default() -> Self {
    Self {
      date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap_or_default(),
      base_url: None,
      out_dir: PathBuf::from("./adsb_data"),
      num_files: 100,
      cadence_secs: filenames::DEFAULT_CADENCE_SECS,
      timeout_secs: 30,
      region: RegionBounds::default(),
    }
  }
}

impl HarvestConfig {
  /// Load a YAML config file; missing keys fall back to defaults
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
      .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    serde_yaml::from_str(&content)
      .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
  }

  /// Defaults, or the given file when there is one
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    match path {
      Some(path) => Self::load_from_file(path),
      None => Ok(Self::default()),
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    self.region.validate()?;

    if self.cadence_secs == 0 {
      return Err(ConfigError::invalid("cadence_secs must be greater than 0"));
    }
    if self.timeout_secs == 0 {
      return Err(ConfigError::invalid("timeout_secs must be greater than 0"));
    }

    let max = filenames::max_files_per_day(self.cadence());
    if self.num_files > max {
      return Err(ConfigError::invalid(format!(
        "num_files ({}) exceeds the {} snapshots one day holds at a {}s cadence",
        self.num_files, max, self.cadence_secs
      )));
    }

    Ok(())
  }

  /// Directory URL that generated filenames are appended to, always ending in `/`
  pub fn base_url(&self) -> String {
    let url = match &self.base_url {
      Some(url) => url.clone(),
      None => format!("{ARCHIVE_ROOT}{}", self.date.format("%Y/%m/%d")),
    };

    if url.ends_with('/') {
      url
    } else {
      format!("{url}/")
    }
  }

  pub fn cadence(&self) -> Duration {
    Duration::from_secs(self.cadence_secs)
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_default_config_matches_archive_sample() {
    let config = HarvestConfig::default();
    assert_eq!(config.date, NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
    assert_eq!(config.out_dir, PathBuf::from("./adsb_data"));
    assert_eq!(config.num_files, 100);
    assert_eq!(config.cadence_secs, 5);
    assert_eq!(config.timeout_secs, 30);
    assert_eq!(config.region, RegionBounds { lamin: 6.0, lamax: 36.0, lomin: 68.0, lomax: 98.0 });
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_base_url_from_date() {
    let config = HarvestConfig::default();
    assert_eq!(config.base_url(), "https://samples.adsbexchange.com/readsb-hist/2025/10/01/");
  }

  #[test]
  fn test_base_url_override_gets_trailing_slash() {
    let config =
      HarvestConfig { base_url: Some("http://127.0.0.1:9000/day".to_string()), ..Default::default() };
    assert_eq!(config.base_url(), "http://127.0.0.1:9000/day/");
  }

  #[test]
  fn test_region_contains_is_inclusive() {
    let region = RegionBounds::default();
    assert!(region.contains(6.0, 68.0));
    assert!(region.contains(36.0, 98.0));
    assert!(region.contains(20.0, 70.0));
    assert!(!region.contains(5.999, 70.0));
    assert!(!region.contains(20.0, 98.001));
  }

  #[test]
  fn test_validate_rejects_inverted_bounds() {
    let mut config = HarvestConfig::default();
    config.region.lamin = 40.0;
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("lamin"));

    let mut config = HarvestConfig::default();
    config.region.lomax = 0.0;
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("lomin"));
  }

  #[test]
  fn test_validate_rejects_out_of_range_latitude() {
    let mut config = HarvestConfig::default();
    config.region.lamax = 91.0;
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_validate_rejects_zero_cadence_and_timeout() {
    let config = HarvestConfig { cadence_secs: 0, ..Default::default() };
    assert!(config.validate().unwrap_err().to_string().contains("cadence_secs"));

    let config = HarvestConfig { timeout_secs: 0, ..Default::default() };
    assert!(config.validate().unwrap_err().to_string().contains("timeout_secs"));
  }

  #[test]
  fn test_validate_rejects_more_than_one_day() {
    let config = HarvestConfig { num_files: 17_281, ..Default::default() };
    assert!(config.validate().unwrap_err().to_string().contains("num_files"));

    let config = HarvestConfig { num_files: 17_280, ..Default::default() };
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_load_partial_yaml_keeps_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("harvest.yaml");
    std::fs::write(&path, "num_files: 12\nregion:\n  lamin: 0\n  lamax: 10\n  lomin: 0\n  lomax: 10\n")
      .unwrap();

    let config = HarvestConfig::load_from_file(&path).unwrap();
    assert_eq!(config.num_files, 12);
    assert_eq!(config.region.lamax, 10.0);
    assert_eq!(config.timeout_secs, 30);
  }

  #[test]
  fn test_load_missing_file_is_read_error() {
    let result = HarvestConfig::load(Some(Path::new("/nonexistent/harvest.yaml")));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
  }

  #[test]
  fn test_load_garbage_is_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("harvest.yaml");
    std::fs::write(&path, "num_files: [not, a, number]").unwrap();

    assert!(matches!(HarvestConfig::load_from_file(&path), Err(ConfigError::Parse { .. })));
  }
}
