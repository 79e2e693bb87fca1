use std::path::PathBuf;

use crate::completion::{DEFAULT_CHAT_MODEL, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GROQ_API_BASE};
use crate::embedding_model::DEFAULT_MODEL_ID;
use crate::error::{CredentialError, API_KEY_VAR};
use crate::pipeline::DEFAULT_TOP_K;
use crate::records::DEFAULT_RECORD_COUNT;

/// Settings for one chat session, assembled from CLI flags
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
  pub data_path: PathBuf,
  pub store_dir: PathBuf,
  pub embedding_model: String,
  pub chat_model: String,
  pub api_base: String,
  pub top_k: usize,
  pub record_count: usize,
  pub temperature: f64,
  pub max_tokens: u32,
  pub rebuild: bool,
}

impl Default for ChatConfig {
  fn default() -> Self {
    Self {
      data_path: PathBuf::from("data/adsb_synthetic.json"),
      store_dir: PathBuf::from("data/vectorstore"),
      embedding_model: DEFAULT_MODEL_ID.to_string(),
      chat_model: DEFAULT_CHAT_MODEL.to_string(),
      api_base: GROQ_API_BASE.to_string(),
      top_k: DEFAULT_TOP_K,
      record_count: DEFAULT_RECORD_COUNT,
      temperature: DEFAULT_TEMPERATURE,
      max_tokens: DEFAULT_MAX_TOKENS,
      rebuild: false,
    }
  }
}

/// Read the API key after loading any `.env` file in the working directory
pub fn api_key_from_env() -> Result<String, CredentialError> {
  let _ = dotenvy::dotenv();
  std::env::var(API_KEY_VAR)
    .ok()
    .filter(|key| !key.trim().is_empty())
    .ok_or(CredentialError::MissingApiKey { var: API_KEY_VAR })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  fn test_defaults() {
    let config = ChatConfig::default();
    assert_eq!(config.store_dir, PathBuf::from("data/vectorstore"));
    assert_eq!(config.chat_model, "openai/gpt-oss-20b");
    assert_eq!(config.top_k, 5);
    assert_eq!(config.record_count, 500);
  }

  #[test]
  #[serial]
  fn test_api_key_present() {
    std::env::set_var(API_KEY_VAR, "gsk_test");
    assert_eq!(api_key_from_env().unwrap(), "gsk_test");
    std::env::remove_var(API_KEY_VAR);
  }

  #[test]
  #[serial]
  fn test_blank_api_key_is_missing() {
    std::env::set_var(API_KEY_VAR, "   ");
    assert_eq!(
      api_key_from_env().unwrap_err(),
      CredentialError::MissingApiKey { var: API_KEY_VAR }
    );
    std::env::remove_var(API_KEY_VAR);
  }
}
