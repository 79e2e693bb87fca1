//! Persistent vector store
//!
//! Documents, their embeddings, and the model that produced them live in one
//! JSON artifact. It is written to a temporary file in the store directory and
//! renamed into place, so readers only ever see a whole store or none.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::embedding_model::EmbeddingModel;
use crate::error::StoreError;
use crate::index::FlatL2Index;

pub const STORE_FILE: &str = "vectorstore.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
  format_version: u32,
  model: String,
  dimension: usize,
  documents: Vec<String>,
  embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
  format_version: u32,
  model: &'a str,
  dimension: usize,
  documents: &'a [String],
  embeddings: Vec<&'a [f32]>,
}

/// A loaded store; documents and index rows share positions
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
  model: String,
  documents: Vec<String>,
  index: FlatL2Index,
}

impl StoreSnapshot {
  pub fn new(
    model: impl Into<String>,
    documents: Vec<String>,
    index: FlatL2Index,
  ) -> Result<Self, StoreError> {
    if documents.len() != index.len() {
      return Err(StoreError::Misaligned { documents: documents.len(), embeddings: index.len() });
    }
    Ok(Self { model: model.into(), documents, index })
  }

  pub fn model(&self) -> &str {
    &self.model
  }

  pub fn documents(&self) -> &[String] {
    &self.documents
  }

  /// Embedding rows in document order
  pub fn embeddings(&self) -> impl Iterator<Item = &[f32]> {
    self.index.rows()
  }

  pub fn index(&self) -> &FlatL2Index {
    &self.index
  }

  pub fn len(&self) -> usize {
    self.documents.len()
  }

  pub fn is_empty(&self) -> bool {
    self.documents.is_empty()
  }
}

pub struct EmbeddingStore {
  model: Box<dyn EmbeddingModel>,
  store_dir: PathBuf,
  store: Option<StoreSnapshot>,
}

impl EmbeddingStore {
  pub fn new(model: Box<dyn EmbeddingModel>, store_dir: impl Into<PathBuf>) -> Self {
    Self { model, store_dir: store_dir.into(), store: None }
  }

  pub fn store_dir(&self) -> &Path {
    &self.store_dir
  }

  pub fn store_path(&self) -> PathBuf {
    self.store_dir.join(STORE_FILE)
  }

  pub fn snapshot(&self) -> Option<&StoreSnapshot> {
    self.store.as_ref()
  }

  pub fn create_embeddings(&mut self, documents: &[String]) -> Result<Vec<Vec<f32>>, StoreError> {
    bentley::info!("Creating embeddings for {} documents...", documents.len());
    let embeddings = self.model.embed_batch(documents)?;

    if embeddings.len() != documents.len() {
      return Err(StoreError::Misaligned {
        documents: documents.len(),
        embeddings: embeddings.len(),
      });
    }
    bentley::verbose!("Embeddings shape: ({}, {})", embeddings.len(), self.model.dimension());
    Ok(embeddings)
  }

  pub fn build_index(&self, embeddings: &[Vec<f32>]) -> Result<FlatL2Index, StoreError> {
    let index = FlatL2Index::from_embeddings(self.model.dimension(), embeddings)?;
    bentley::verbose!("Built flat L2 index with {} vectors", index.len());
    Ok(index)
  }

  /// Persist documents and embeddings together and keep them as the active store
  pub fn save_store(
    &mut self,
    documents: Vec<String>,
    embeddings: Vec<Vec<f32>>,
  ) -> Result<(), StoreError> {
    if documents.len() != embeddings.len() {
      return Err(StoreError::Misaligned {
        documents: documents.len(),
        embeddings: embeddings.len(),
      });
    }
    let index = self.build_index(&embeddings)?;
    let snapshot = StoreSnapshot::new(self.model.name(), documents, index)?;

    fs::create_dir_all(&self.store_dir).map_err(|e| StoreError::io(&self.store_dir, e))?;

    let file = StoreFileRef {
      format_version: FORMAT_VERSION,
      model: &snapshot.model,
      dimension: snapshot.index.dimension(),
      documents: &snapshot.documents,
      embeddings: snapshot.embeddings().collect(),
    };
    let json = serde_json::to_vec(&file)
      .map_err(|e| StoreError::corrupted(self.store_path(), e.to_string()))?;

    let path = self.store_path();
    let mut temp =
      tempfile::NamedTempFile::new_in(&self.store_dir).map_err(|e| StoreError::io(&path, e))?;
    temp.write_all(&json).map_err(|e| StoreError::io(&path, e))?;
    temp.as_file().sync_all().map_err(|e| StoreError::io(&path, e))?;
    temp.persist(&path).map_err(|e| StoreError::io(&path, e.error))?;

    bentley::success!("Vector store saved to {}", self.store_dir.display());
    tracing::debug!(documents = snapshot.len(), path = %path.display(), "store written");

    self.store = Some(snapshot);
    Ok(())
  }

  /// `Ok(None)` when no store has been saved yet; an error when one exists but cannot be used
  pub fn load_store(&mut self) -> Result<Option<&StoreSnapshot>, StoreError> {
    let path = self.store_path();
    if !path.exists() {
      return Ok(None);
    }

    let content = fs::read(&path).map_err(|e| StoreError::io(&path, e))?;
    let file: StoreFile =
      serde_json::from_slice(&content).map_err(|e| StoreError::corrupted(&path, e.to_string()))?;

    if file.format_version != FORMAT_VERSION {
      return Err(StoreError::corrupted(
        &path,
        format!("unsupported format version {}", file.format_version),
      ));
    }
    if file.model != self.model.name() {
      return Err(StoreError::ModelMismatch {
        expected: self.model.name().to_string(),
        found: file.model,
      });
    }
    if file.dimension != self.model.dimension() {
      return Err(StoreError::DimensionMismatch {
        expected: self.model.dimension(),
        found: file.dimension,
      });
    }

    let index = self.build_index(&file.embeddings)?;
    let snapshot = StoreSnapshot::new(file.model, file.documents, index)?;
    bentley::info!("Loaded vector store with {} documents", snapshot.len());

    self.store = Some(snapshot);
    Ok(self.store.as_ref())
  }

  /// Embed and persist `documents` as the new store
  pub fn rebuild(&mut self, documents: Vec<String>) -> Result<(), StoreError> {
    let embeddings = self.create_embeddings(&documents)?;
    self.save_store(documents, embeddings)
  }

  /// Nearest `k` documents to `query` with their squared L2 distances, nearest first
  pub fn query_store(&mut self, query: &str, k: usize) -> Result<Vec<(String, f32)>, StoreError> {
    let store = self.store.as_ref().ok_or(StoreError::NotLoaded)?;
    let query_vector = self.model.embed(query)?;
    let hits = store.index.search(&query_vector, k)?;

    Ok(
      hits
        .into_iter()
        .filter_map(|(i, distance)| store.documents.get(i).map(|doc| (doc.clone(), distance)))
        .collect(),
    )
  }
}
