use chrono::{NaiveTime, TimeDelta};
use std::time::Duration;

use crate::error::ConfigError;

/// The archive writes a snapshot roughly every five seconds
pub const DEFAULT_CADENCE_SECS: u64 = 5;

/// Every archived snapshot is a gzipped JSON document
pub const SNAPSHOT_SUFFIX: &str = ".json.gz";

const SECONDS_PER_DAY: u64 = 86_400;

/// How many snapshots fit between midnight and the end of the same day
pub fn max_files_per_day(cadence: Duration) -> usize {
  let step = cadence.as_secs();
  if step == 0 {
    return 0;
  }
  SECONDS_PER_DAY.div_ceil(step) as usize
}

/// Expected archive names starting at midnight, e.g. `000000Z.json.gz`, `000005Z.json.gz`
///
/// Names are distinct and strictly increasing; asking for more than one day's
/// worth is an error rather than silently wrapping back to `000000Z`.
pub fn generate_filenames(count: usize, cadence: Duration) -> Result<Vec<String>, ConfigError> {
  if count == 0 {
    return Ok(Vec::new());
  }

  let step = cadence.as_secs();
  if step == 0 {
    return Err(ConfigError::invalid("cadence must be at least one second"));
  }

  let max = max_files_per_day(cadence);
  if count > max {
    return Err(ConfigError::invalid(format!(
      "{count} snapshots at a {step}s cadence would wrap past midnight (max {max})"
    )));
  }

  Ok((0..count as u64).map(|i| snapshot_name(i * step)).collect())
}

fn snapshot_name(seconds_after_midnight: u64) -> String {
  let time = NaiveTime::MIN + TimeDelta::seconds(seconds_after_midnight as i64);
  format!("{}{SNAPSHOT_SUFFIX}", time.format("%H%M%SZ"))
}
