use std::path::PathBuf;
use thiserror::Error;

/// Problems with the harvest configuration. These stop the run before any download.
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("invalid configuration: {message}")]
  Invalid { message: String },
}

impl ConfigError {
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::Invalid { message: message.into() }
  }
}

/// Per-file processing failures. The run logs these and moves to the next file.
#[derive(Error, Debug)]
pub enum SnapshotError {
  #[error("Corrupted gzip file - {0}")]
  CorruptGzip(#[source] std::io::Error),

  #[error("Invalid JSON - {0}")]
  InvalidJson(#[source] serde_json::Error),

  #[error("failed to serialize snapshot: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl SnapshotError {
  pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Write { path: path.into(), source }
  }

  pub fn is_corrupt_gzip(&self) -> bool {
    matches!(self, Self::CorruptGzip(_))
  }

  pub fn is_invalid_json(&self) -> bool {
    matches!(self, Self::InvalidJson(_))
  }
}
