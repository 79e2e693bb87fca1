//! One-shot snapshot downloads
//!
//! [`Downloader::fetch`] never fails past its own boundary: every network
//! problem is classified into a [`FetchOutcome`], logged, and handed back so
//! the run loop can count it and move on. There is no retry and no backoff.

use anyhow::{Context, Result};
use std::time::Duration;

/// What happened when one snapshot was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
  Fetched(Vec<u8>),
  /// Server answered with something other than 200
  HttpStatus(u16),
  /// 200 with no body
  EmptyBody,
  Timeout,
  Connection,
  Other(String),
}

impl FetchOutcome {
  pub fn is_fetched(&self) -> bool {
    matches!(self, FetchOutcome::Fetched(_))
  }

  /// The downloaded bytes, or `None` for every failure
  pub fn into_bytes(self) -> Option<Vec<u8>> {
    match self {
      FetchOutcome::Fetched(bytes) => Some(bytes),
      _ => None,
    }
  }

  /// One-line, symbol-prefixed description for the run log
  pub fn describe(&self, filename: &str) -> String {
    match self {
      FetchOutcome::Fetched(bytes) => format!("⬇️  Downloaded {filename} ({} bytes)", bytes.len()),
      FetchOutcome::HttpStatus(code) => format!("❌ {filename}: HTTP {code}"),
      FetchOutcome::EmptyBody => format!("⚠️  {filename}: Empty response"),
      FetchOutcome::Timeout => format!("⏰ Timeout downloading {filename}"),
      FetchOutcome::Connection => format!("🔌 Connection error downloading {filename}"),
      FetchOutcome::Other(message) => format!("⚠️  Error downloading {filename}: {message}"),
    }
  }

  fn log(&self, filename: &str) {
    let line = self.describe(filename);
    if self.is_fetched() {
      bentley::info(&line);
    } else {
      bentley::warn(&line);
    }
  }
}

impl From<reqwest::Error> for FetchOutcome {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      FetchOutcome::Timeout
    } else if err.is_connect() {
      FetchOutcome::Connection
    } else {
      FetchOutcome::Other(err.to_string())
    }
  }
}

pub struct Downloader {
  client: reqwest::Client,
  base_url: String,
}

impl Downloader {
  /// `base_url` is the archive directory; filenames are appended verbatim
  pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("adsb-harvest/", env!("CARGO_PKG_VERSION")))
      .build()
      .context("failed to build HTTP client")?;

    Ok(Self { client, base_url: base_url.into() })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub fn url_for(&self, filename: &str) -> String {
    format!("{}{}", self.base_url, filename)
  }

  /// Fetch one snapshot and log how it went
  pub async fn fetch(&self, filename: &str) -> FetchOutcome {
    let outcome = self.request(filename).await;
    outcome.log(filename);
    outcome
  }

  async fn request(&self, filename: &str) -> FetchOutcome {
    let url = self.url_for(filename);
    tracing::debug!(%url, "requesting snapshot");

    let response = match self.client.get(&url).send().await {
      Ok(response) => response,
      Err(e) => return e.into(),
    };

    let status = response.status();
    if status != reqwest::StatusCode::OK {
      return FetchOutcome::HttpStatus(status.as_u16());
    }

    match response.bytes().await {
      Ok(body) if body.is_empty() => FetchOutcome::EmptyBody,
      Ok(body) => FetchOutcome::Fetched(body.to_vec()),
      Err(e) => e.into(),
    }
  }
}
