use std::path::PathBuf;
use thiserror::Error;

/// Name of the environment variable holding the chat API key
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("vector store at {path} is corrupted: {message}")]
  Corrupted { path: PathBuf, message: String },

  #[error("{documents} documents but {embeddings} embeddings; they must line up one-to-one")]
  Misaligned { documents: usize, embeddings: usize },

  #[error("embedding has dimension {found}, expected {expected}")]
  DimensionMismatch { expected: usize, found: usize },

  #[error("vector store was built with model '{found}', but the current model is '{expected}'")]
  ModelMismatch { expected: String, found: String },

  #[error("vector store has not been loaded or created yet")]
  NotLoaded,

  #[error("I/O error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Embedding(#[from] anyhow::Error),
}

impl StoreError {
  pub fn corrupted(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
    Self::Corrupted { path: path.into(), message: message.into() }
  }

  pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io { path: path.into(), source }
  }

  /// The store exists on disk but cannot be trusted
  pub fn is_corrupted(&self) -> bool {
    matches!(self, Self::Corrupted { .. } | Self::Misaligned { .. } | Self::DimensionMismatch { .. })
  }
}

/// The only fatal startup condition: no API key to talk to the LLM with
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CredentialError {
  #[error("{var} not found in environment variables!")]
  MissingApiKey { var: &'static str },
}

impl CredentialError {
  /// What the user should do about it
  pub fn remediation(&self) -> String {
    match self {
      Self::MissingApiKey { var } => {
        format!("Please set your API key in a .env file:\n{var}=your_api_key_here")
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_missing_api_key_message_and_remediation() {
    let err = CredentialError::MissingApiKey { var: API_KEY_VAR };
    assert_eq!(err.to_string(), "GROQ_API_KEY not found in environment variables!");
    assert!(err.remediation().contains("GROQ_API_KEY=your_api_key_here"));
    assert!(err.remediation().contains(".env"));
  }

  #[test]
  fn test_corruption_kinds() {
    assert!(StoreError::corrupted("/tmp/store.json", "bad").is_corrupted());
    assert!(StoreError::Misaligned { documents: 2, embeddings: 3 }.is_corrupted());
    assert!(!StoreError::NotLoaded.is_corrupted());
  }

  #[test]
  fn test_misaligned_display() {
    let err = StoreError::Misaligned { documents: 2, embeddings: 3 };
    assert!(err.to_string().contains("2 documents but 3 embeddings"));
  }
}
