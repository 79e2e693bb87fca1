use crate::error::StoreError;
use crate::store::EmbeddingStore;

pub const NO_RESULTS: &str = "No relevant flight data found.";

/// Formats store hits for the chat model
pub struct FlightRetriever {
  store: EmbeddingStore,
}

impl FlightRetriever {
  pub fn new(store: EmbeddingStore) -> Self {
    Self { store }
  }

  pub fn store(&self) -> &EmbeddingStore {
    &self.store
  }

  pub fn retrieve_context(&mut self, query: &str, k: usize) -> Result<Vec<String>, StoreError> {
    Ok(self.retrieve_with_scores(query, k)?.into_iter().map(|(doc, _)| doc).collect())
  }

  pub fn retrieve_with_scores(
    &mut self,
    query: &str,
    k: usize,
  ) -> Result<Vec<(String, f32)>, StoreError> {
    self.store.query_store(query, k)
  }

  pub fn get_augmented_context(&mut self, query: &str, k: usize) -> Result<String, StoreError> {
    let documents = self.retrieve_context(query, k)?;
    Ok(format_context(&documents))
  }
}

pub fn format_context(documents: &[String]) -> String {
  if documents.is_empty() {
    return NO_RESULTS.to_string();
  }

  let mut context = format!("Retrieved Flight Data:\n{}\n\n", "=".repeat(50));
  for (i, doc) in documents.iter().enumerate() {
    context.push_str(&format!("Document {}:\n{doc}\n\n", i + 1));
  }
  context
}
