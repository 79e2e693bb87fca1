//! Decode, filter, and persist one archive snapshot
//!
//! State vectors are positional arrays inherited from the archive format:
//! index 5 is longitude and index 6 is latitude. That layout is external and
//! is kept exactly as published.

use flate2::read::MultiGzDecoder;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::RegionBounds;
use crate::error::SnapshotError;

/// First two bytes of every gzip member
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

const LONGITUDE_INDEX: usize = 5;
const LATITUDE_INDEX: usize = 6;

/// How the downloaded body was encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
  Gzip,
  Plain,
}

/// Flight counts before and after region filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
  pub before: usize,
  pub after: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSnapshot {
  pub path: PathBuf,
  pub encoding: Encoding,
  /// `None` when the snapshot had no `states` array
  pub filter: Option<FilterStats>,
  /// Number of `states` entries written
  pub flights: usize,
}

pub fn is_gzipped(content: &[u8]) -> bool {
  content.starts_with(&GZIP_MAGIC)
}

pub fn decompress(content: &[u8]) -> Result<Vec<u8>, SnapshotError> {
  let mut decoded = Vec::new();
  MultiGzDecoder::new(content).read_to_end(&mut decoded).map_err(SnapshotError::CorruptGzip)?;
  Ok(decoded)
}

/// Parse a body that may or may not be gzipped; plain bodies are never run through the decoder
pub fn decode(content: &[u8]) -> Result<(Value, Encoding), SnapshotError> {
  let (raw, encoding) = if is_gzipped(content) {
    (std::borrow::Cow::Owned(decompress(content)?), Encoding::Gzip)
  } else {
    (std::borrow::Cow::Borrowed(content), Encoding::Plain)
  };

  let parsed = serde_json::from_slice(&raw).map_err(SnapshotError::InvalidJson)?;
  Ok((parsed, encoding))
}

/// `(lat, lon)` of a state vector, if both are present and numeric
fn coordinates(state: &Value) -> Option<(f64, f64)> {
  let lon = state.get(LONGITUDE_INDEX)?.as_f64()?;
  let lat = state.get(LATITUDE_INDEX)?.as_f64()?;
  Some((lat, lon))
}

/// Keep only the states whose position lies inside `bounds`
pub fn filter_by_region(states: Vec<Value>, bounds: &RegionBounds) -> Vec<Value> {
  states
    .into_iter()
    .filter(|state| coordinates(state).is_some_and(|(lat, lon)| bounds.contains(lat, lon)))
    .collect()
}

/// Filter the `states` array in place. Snapshots without one pass through untouched.
pub fn filter_snapshot(snapshot: &mut Value, bounds: &RegionBounds) -> Option<FilterStats> {
  let states = snapshot.get_mut("states")?.as_array_mut()?;
  let before = states.len();
  let kept = filter_by_region(std::mem::take(states), bounds);
  let after = kept.len();
  *states = kept;
  Some(FilterStats { before, after })
}

/// Output name for an archive name: the compression suffix is dropped
pub fn output_name(filename: &str) -> &str {
  filename.strip_suffix(".gz").unwrap_or(filename)
}

/// Write the snapshot as indented JSON under `dir`, creating `dir` if needed
pub fn write_snapshot(dir: &Path, filename: &str, snapshot: &Value) -> Result<PathBuf, SnapshotError> {
  fs::create_dir_all(dir).map_err(|e| SnapshotError::write(dir, e))?;

  let path = dir.join(output_name(filename));
  let json = serde_json::to_string_pretty(snapshot).map_err(SnapshotError::Serialize)?;
  fs::write(&path, json).map_err(|e| SnapshotError::write(&path, e))?;

  Ok(path)
}

fn state_count(snapshot: &Value) -> usize {
  snapshot.get("states").and_then(Value::as_array).map_or(0, Vec::len)
}

/// Decode, filter, and write one downloaded snapshot
pub fn process_snapshot(
  content: &[u8],
  filename: &str,
  bounds: &RegionBounds,
  out_dir: &Path,
) -> Result<ProcessedSnapshot, SnapshotError> {
  let (mut snapshot, encoding) = decode(content)?;
  match encoding {
    Encoding::Gzip => bentley::info!("🗜️  Decompressed gzipped file: {filename}"),
    Encoding::Plain => bentley::info!("📄 Processing plain JSON: {filename}"),
  }

  let filter = filter_snapshot(&mut snapshot, bounds);
  if let Some(stats) = filter {
    bentley::info!("🔍 Filtered {} -> {} flights", stats.before, stats.after);
  }

  let path = write_snapshot(out_dir, filename, &snapshot)?;
  let flights = state_count(&snapshot);
  bentley::success!("✅ Saved {} ({flights} flights)", path.display());

  Ok(ProcessedSnapshot { path, encoding, filter, flights })
}

#[cfg(test)]
mod tests {
  use super::*;
  use flate2::write::GzEncoder;
  use flate2::Compression;
  use serde_json::json;
  use std::io::Write;
  use tempfile::TempDir;

  fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
  }

  fn bounds() -> RegionBounds {
    RegionBounds { lamin: 6.0, lamax: 36.0, lomin: 68.0, lomax: 98.0 }
  }

  #[test]
  fn test_is_gzipped() {
    assert!(is_gzipped(&gzip(b"{}")));
    assert!(is_gzipped(&[0x1f, 0x8b]));
    assert!(!is_gzipped(b"{\"states\": []}"));
    assert!(!is_gzipped(&[0x1f]));
    assert!(!is_gzipped(&[]));
  }

  #[test]
  fn test_decode_gzip_and_plain() {
    let (value, encoding) = decode(&gzip(br#"{"now": 42}"#)).unwrap();
    assert_eq!(encoding, Encoding::Gzip);
    assert_eq!(value, json!({"now": 42}));

    let (value, encoding) = decode(br#"{"now": 43}"#).unwrap();
    assert_eq!(encoding, Encoding::Plain);
    assert_eq!(value, json!({"now": 43}));
  }

  #[test]
  fn test_decode_concatenated_gzip_members() {
    let mut body = gzip(b"{\"states\": ");
    body.extend(gzip(b"[]}"));

    let (value, encoding) = decode(&body).unwrap();
    assert_eq!(encoding, Encoding::Gzip);
    assert_eq!(value, json!({"states": []}));
  }

  #[test]
  fn test_plain_bytes_never_hit_the_decoder() {
    // Not gzip and not JSON: must surface as a JSON error, not a gzip one
    let err = decode(b"\x1fnot json").unwrap_err();
    assert!(err.is_invalid_json());
  }

  #[test]
  fn test_corrupt_gzip_is_distinct() {
    let mut bytes = gzip(br#"{"now": 1}"#);
    bytes.truncate(12);
    let err = decode(&bytes).unwrap_err();
    assert!(err.is_corrupt_gzip());

    let err = decode(&[0x1f, 0x8b, 0x00, 0x00]).unwrap_err();
    assert!(err.is_corrupt_gzip());
  }

  #[test]
  fn test_invalid_json_inside_gzip() {
    let err = decode(&gzip(b"{not json")).unwrap_err();
    assert!(err.is_invalid_json());
  }

  #[test]
  fn test_filter_worked_example() {
    let states = vec![
      json!(["a", null, null, null, null, 70.0, 20.0]),
      json!(["b", null, null, null, null, 50.0, 100.0]),
      json!(["c", null, null, null, null, null, 20.0]),
    ];

    let kept = filter_by_region(states.clone(), &bounds());
    assert_eq!(kept, vec![states[0].clone()]);
  }

  #[test]
  fn test_filter_edges_are_inclusive() {
    let states = vec![
      json!([0, 0, 0, 0, 0, 68.0, 6.0]),
      json!([0, 0, 0, 0, 0, 98.0, 36.0]),
      json!([0, 0, 0, 0, 0, 98.0001, 36.0]),
      json!([0, 0, 0, 0, 0, 80, 10]),
    ];
    let kept = filter_by_region(states, &bounds());
    assert_eq!(kept.len(), 3);
  }

  #[test]
  fn test_filter_drops_missing_or_malformed_coordinates() {
    let states = vec![
      json!([0, 0, 0, 0, 0, 70.0, null]),
      json!([0, 0, 0, 0, 0, 70.0]),
      json!([0, 0, 0, 0, 0, "70", 20.0]),
      json!({"lat": 20.0, "lon": 70.0}),
    ];
    assert!(filter_by_region(states, &bounds()).is_empty());
  }

  #[test]
  fn test_filter_snapshot_in_place() {
    let mut snapshot = json!({
      "time": 1759276800,
      "states": [
        [0, 0, 0, 0, 0, 70.0, 20.0],
        [0, 0, 0, 0, 0, 10.0, 20.0]
      ]
    });

    let stats = filter_snapshot(&mut snapshot, &bounds()).unwrap();
    assert_eq!(stats, FilterStats { before: 2, after: 1 });
    assert_eq!(snapshot["time"], 1759276800);
    assert_eq!(snapshot["states"].as_array().unwrap().len(), 1);
  }

  #[test]
  fn test_filter_snapshot_without_states() {
    let mut snapshot = json!({"aircraft": [1, 2, 3]});
    assert!(filter_snapshot(&mut snapshot, &bounds()).is_none());
    assert_eq!(snapshot, json!({"aircraft": [1, 2, 3]}));
  }

  #[test]
  fn test_output_name() {
    assert_eq!(output_name("000000Z.json.gz"), "000000Z.json");
    assert_eq!(output_name("000000Z.json"), "000000Z.json");
  }

  #[test]
  fn test_process_creates_directory_and_writes_indented_json() {
    let temp = TempDir::new().unwrap();
    let out_dir = temp.path().join("nested").join("adsb_data");
    let body = gzip(
      json!({"states": [[0, 0, 0, 0, 0, 70.0, 20.0], [0, 0, 0, 0, 0, 0.0, 0.0]]})
        .to_string()
        .as_bytes(),
    );

    let processed = process_snapshot(&body, "000005Z.json.gz", &bounds(), &out_dir).unwrap();
    assert_eq!(processed.path, out_dir.join("000005Z.json"));
    assert_eq!(processed.encoding, Encoding::Gzip);
    assert_eq!(processed.filter, Some(FilterStats { before: 2, after: 1 }));
    assert_eq!(processed.flights, 1);

    let written = std::fs::read_to_string(&processed.path).unwrap();
    assert!(written.contains("\n  \"states\""));
    let value: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["states"], json!([[0, 0, 0, 0, 0, 70.0, 20.0]]));
  }

  #[test]
  fn test_process_failure_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let result = process_snapshot(b"{broken", "000000Z.json.gz", &bounds(), temp.path());
    assert!(result.unwrap_err().is_invalid_json());
    assert!(!temp.path().join("000000Z.json").exists());
  }
}
