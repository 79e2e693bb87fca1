//! Harvester - ADS-B archive snapshot downloader
//!
//! Pulls time-coded snapshots from the public readsb-hist archive, keeps the
//! aircraft inside a configured bounding box, and writes the result as JSON.

pub mod config;
pub mod download;
pub mod error;
pub mod filenames;
pub mod run;
pub mod snapshot;

pub use config::{HarvestConfig, RegionBounds};
pub use download::{Downloader, FetchOutcome};
pub use error::{ConfigError, SnapshotError};
pub use run::{HarvestRun, HarvestSummary};
