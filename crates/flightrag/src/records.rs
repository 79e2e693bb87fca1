//! Flight records and their text documents
//!
//! Records are either loaded from a JSON file or, when that file does not
//! exist yet, synthesized from fixed enumerations and random ranges and then
//! persisted so the next run sees the same data.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeDelta};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

pub const DEFAULT_RECORD_COUNT: usize = 500;

const AIRLINES: &[&str] = &["AA", "UA", "DL", "SW", "BA", "LH", "AF", "KL", "SQ", "EK"];
const AIRCRAFT_TYPES: &[&str] = &["B787", "B777", "A380", "A350", "B737", "A320", "CRJ", "E190"];
const AIRPORTS: &[&str] = &["JFK", "LAX", "ORD", "DFW", "ATL", "LHR", "CDG", "NRT", "SIN", "DXB"];
const EMERGENCY_STATUSES: &[&str] = &["none", "general", "medical", "fuel"];

const PLACEHOLDER: &str = "N/A";

/// One aircraft observation, kept as the JSON object it was loaded from.
///
/// No field is required and no field has a fixed type; rendering shows
/// whatever scalar is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightRecord(pub Map<String, Value>);

impl FlightRecord {
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  pub fn get_str(&self, key: &str) -> Option<&str> {
    self.get(key).and_then(Value::as_str)
  }

  /// Display form of a field; absent and `null` both give `None`
  pub fn text(&self, key: &str) -> Option<String> {
    match self.get(key)? {
      Value::Null => None,
      Value::String(s) => Some(s.clone()),
      other => Some(other.to_string()),
    }
  }
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
  items[rng.random_range(0..items.len())]
}

fn round4(value: f64) -> f64 {
  (value * 10_000.0).round() / 10_000.0
}

/// Build `count` pseudo-random records with timestamps in the 24 hours before `base_time`
pub fn generate_synthetic_records<R: Rng + ?Sized>(
  count: usize,
  rng: &mut R,
  base_time: DateTime<Local>,
) -> Vec<FlightRecord> {
  (0..count)
    .map(|i| {
      let seen = base_time - TimeDelta::seconds(rng.random_range(0..=86_400));
      let flight_id = format!("{}{}", pick(rng, AIRLINES), rng.random_range(1000..=9999));
      let icao_address = format!(
        "{:02x}{:02x}{:02x}",
        rng.random_range(0xa0..=0xf0u8),
        rng.random::<u8>(),
        rng.random::<u8>()
      );
      let callsign = format!("{}FL{i:04}", pick(rng, AIRLINES));
      let latitude = round4(rng.random_range(-90.0..=90.0));
      let longitude = round4(rng.random_range(-180.0..=180.0));

      let record = json!({
        "flight_id": flight_id,
        "icao_address": icao_address,
        "callsign": callsign,
        "aircraft_type": pick(rng, AIRCRAFT_TYPES),
        "latitude": latitude,
        "longitude": longitude,
        "altitude_ft": rng.random_range(1000..=45_000),
        "ground_speed_knots": rng.random_range(200..=500),
        "track_degrees": rng.random_range(0..=359),
        "vertical_rate_fpm": rng.random_range(-2000..=2000),
        "departure_airport": pick(rng, AIRPORTS),
        "destination_airport": pick(rng, AIRPORTS),
        "timestamp": seen.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        "emergency_status": pick(rng, EMERGENCY_STATUSES),
      });

      match record {
        Value::Object(fields) => FlightRecord(fields),
        _ => FlightRecord::default(),
      }
    })
    .collect()
}

pub fn load_records(path: &Path) -> Result<Vec<FlightRecord>> {
  let content =
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse flight records in {}", path.display()))
}

pub fn save_records(path: &Path, records: &[FlightRecord]) -> Result<()> {
  let json = serde_json::to_string_pretty(records)?;
  fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Load the record file, synthesizing and persisting `count` records first if it is missing
pub fn load_or_generate(path: &Path, count: usize) -> Result<Vec<FlightRecord>> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  if path.exists() {
    let records = load_records(path)?;
    bentley::info!("Loaded {} ADS-B records from {}", records.len(), path.display());
    return Ok(records);
  }

  bentley::info!("Generating synthetic ADS-B data at {}...", path.display());
  let records = generate_synthetic_records(count, &mut rand::rng(), Local::now());
  save_records(path, &records)?;
  bentley::info!("Generated {} ADS-B records", records.len());
  Ok(records)
}

fn field(record: &FlightRecord, key: &str) -> String {
  record.text(key).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Render one record as the searchable text block stored next to its embedding
pub fn render_document(record: &FlightRecord) -> String {
  let lines = [
    "Flight Information:".to_string(),
    format!("- Flight ID: {}", field(record, "flight_id")),
    format!("- Callsign: {}", field(record, "callsign")),
    format!("- Aircraft Type: {}", field(record, "aircraft_type")),
    format!("- ICAO Address: {}", field(record, "icao_address")),
    String::new(),
    "Current Position:".to_string(),
    format!("- Latitude: {}", field(record, "latitude")),
    format!("- Longitude: {}", field(record, "longitude")),
    format!("- Altitude: {} feet", field(record, "altitude_ft")),
    format!("- Ground Speed: {} knots", field(record, "ground_speed_knots")),
    format!("- Track: {} degrees", field(record, "track_degrees")),
    format!("- Vertical Rate: {} fpm", field(record, "vertical_rate_fpm")),
    String::new(),
    "Route:".to_string(),
    format!("- Departure: {}", field(record, "departure_airport")),
    format!("- Destination: {}", field(record, "destination_airport")),
    String::new(),
    "Status:".to_string(),
    format!(
      "- Emergency Status: {}",
      record.text("emergency_status").as_deref().unwrap_or("none")
    ),
    format!("- Timestamp: {}", field(record, "timestamp")),
  ];

  lines.join("\n").trim().to_string()
}

pub fn preprocess(records: &[FlightRecord]) -> Vec<String> {
  records.iter().map(render_document).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{NaiveDateTime, TimeZone};
  use rand::rngs::StdRng;
  use rand::SeedableRng;
  use tempfile::TempDir;

  fn base_time() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap()
  }

  fn record(value: Value) -> FlightRecord {
    serde_json::from_value(value).unwrap()
  }

  fn int(record: &FlightRecord, key: &str) -> i64 {
    record.get(key).and_then(Value::as_i64).unwrap()
  }

  #[test]
  fn test_synthesized_records_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(7);
    let records = generate_synthetic_records(200, &mut rng, base_time());
    assert_eq!(records.len(), 200);

    for (i, record) in records.iter().enumerate() {
      let flight_id = record.get_str("flight_id").unwrap();
      assert!(AIRLINES.contains(&&flight_id[..2]));
      let number: u32 = flight_id[2..].parse().unwrap();
      assert!((1000..=9999).contains(&number));

      let icao = record.get_str("icao_address").unwrap();
      assert_eq!(icao.len(), 6);
      let first = u8::from_str_radix(&icao[..2], 16).unwrap();
      assert!((0xa0..=0xf0).contains(&first));

      assert!(record.get_str("callsign").unwrap().ends_with(&format!("FL{i:04}")));
      assert!(AIRCRAFT_TYPES.contains(&record.get_str("aircraft_type").unwrap()));
      let lat = record.get("latitude").and_then(Value::as_f64).unwrap();
      let lon = record.get("longitude").and_then(Value::as_f64).unwrap();
      assert!((-90.0..=90.0).contains(&lat));
      assert!((-180.0..=180.0).contains(&lon));
      assert_eq!(lat, round4(lat));
      assert!((1000..=45_000).contains(&int(record, "altitude_ft")));
      assert!((200..=500).contains(&int(record, "ground_speed_knots")));
      assert!((0..=359).contains(&int(record, "track_degrees")));
      assert!((-2000..=2000).contains(&int(record, "vertical_rate_fpm")));
      assert!(AIRPORTS.contains(&record.get_str("departure_airport").unwrap()));
      assert!(AIRPORTS.contains(&record.get_str("destination_airport").unwrap()));
      assert!(EMERGENCY_STATUSES.contains(&record.get_str("emergency_status").unwrap()));

      let seen = NaiveDateTime::parse_from_str(
        record.get_str("timestamp").unwrap(),
        "%Y-%m-%dT%H:%M:%S%.f",
      )
      .unwrap();
      let age = base_time().naive_local() - seen;
      assert!(age >= TimeDelta::zero() && age <= TimeDelta::seconds(86_400));
    }
  }

  #[test]
  fn test_render_full_record() {
    let doc = render_document(&record(json!({
      "flight_id": "AA1234",
      "icao_address": "a1b2c3",
      "callsign": "AAFL0001",
      "aircraft_type": "B787",
      "latitude": 40.0,
      "longitude": -73.7781,
      "altitude_ft": 35000,
      "ground_speed_knots": 450,
      "track_degrees": 270,
      "vertical_rate_fpm": -500,
      "departure_airport": "JFK",
      "destination_airport": "LHR",
      "timestamp": "2025-10-01T11:00:00.000000",
      "emergency_status": "medical"
    })));

    assert!(doc.starts_with("Flight Information:\n- Flight ID: AA1234"));
    assert!(doc.contains("- Latitude: 40.0\n- Longitude: -73.7781"));
    assert!(doc.contains("- Altitude: 35000 feet"));
    assert!(doc.contains("- Vertical Rate: -500 fpm"));
    assert!(doc.contains("Route:\n- Departure: JFK\n- Destination: LHR"));
    assert!(doc.contains("- Emergency Status: medical"));
    assert!(doc.ends_with("- Timestamp: 2025-10-01T11:00:00.000000"));
  }

  #[test]
  fn test_render_missing_and_null_fields_use_placeholders() {
    let doc = render_document(&FlightRecord::default());
    assert!(doc.contains("- Flight ID: N/A"));
    assert!(doc.contains("- Latitude: N/A"));
    assert!(doc.contains("- Altitude: N/A feet"));
    assert!(doc.contains("- Emergency Status: none"));
    assert!(doc.contains("- Timestamp: N/A"));

    let doc = render_document(&record(json!({"callsign": null, "emergency_status": null})));
    assert!(doc.contains("- Callsign: N/A"));
    assert!(doc.contains("- Emergency Status: none"));
  }

  #[test]
  fn test_load_accepts_any_scalar_type() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("records.json");
    fs::write(
      &path,
      r#"[
        {"flight_id": "AA1234", "altitude_ft": 35000.5, "track_degrees": "270"},
        {"flight_id": 1234, "latitude": "40.1", "longitude": -73, "emergency_status": false}
      ]"#,
    )
    .unwrap();

    let records = load_or_generate(&path, 5).unwrap();
    assert_eq!(records.len(), 2);

    let docs = preprocess(&records);
    assert!(docs[0].contains("- Flight ID: AA1234"));
    assert!(docs[0].contains("- Altitude: 35000.5 feet"));
    assert!(docs[0].contains("- Track: 270 degrees"));
    assert!(docs[1].contains("- Flight ID: 1234"));
    assert!(docs[1].contains("- Latitude: 40.1\n- Longitude: -73"));
    assert!(docs[1].contains("- Emergency Status: false"));
  }

  #[test]
  fn test_load_or_generate_persists_then_reloads() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data").join("adsb_synthetic.json");

    let generated = load_or_generate(&path, 12).unwrap();
    assert_eq!(generated.len(), 12);
    assert!(path.exists());

    let reloaded = load_or_generate(&path, 999).unwrap();
    assert_eq!(reloaded, generated);
  }

  #[test]
  fn test_load_keeps_unknown_fields() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("records.json");
    fs::write(&path, r#"[{"callsign": "KLM643", "squawk": "7700"}]"#).unwrap();

    let records = load_or_generate(&path, 5).unwrap();
    assert_eq!(records[0].get_str("callsign"), Some("KLM643"));
    assert_eq!(records[0].get_str("squawk"), Some("7700"));

    let docs = preprocess(&records);
    assert!(docs[0].contains("- Callsign: KLM643"));
    assert!(docs[0].contains("- Flight ID: N/A"));
  }

  #[test]
  fn test_load_rejects_non_array() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("records.json");
    fs::write(&path, r#"{"callsign": "KLM643"}"#).unwrap();

    let err = load_records(&path).unwrap_err();
    assert!(err.to_string().contains("failed to parse flight records"));
  }
}
