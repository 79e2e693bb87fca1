//! Flightrag - retrieval-augmented chat over ADS-B flight records
//!
//! Records are rendered into text documents, embedded into a persisted vector
//! store, and the nearest documents are handed to a hosted chat model as
//! context for each question.

pub mod completion;
pub mod config;
pub mod embedding_model;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod records;
pub mod retriever;
pub mod store;

pub use completion::{ChatModel, GroqChatModel, Message};
pub use config::{api_key_from_env, ChatConfig};
pub use embedding_model::{EmbeddingModel, MockEmbeddingModel};
#[cfg(feature = "neural")]
pub use embedding_model::OnnxEmbeddingModel;
pub use error::{CredentialError, StoreError, API_KEY_VAR};
pub use index::FlatL2Index;
pub use pipeline::{QueryResponse, RagPipeline};
pub use records::FlightRecord;
pub use retriever::FlightRetriever;
pub use store::{EmbeddingStore, StoreSnapshot};

/// Load the persisted store, building it from the record file when it is absent or a rebuild is requested
pub fn initialize_vector_store(
  store: &mut EmbeddingStore,
  config: &ChatConfig,
) -> anyhow::Result<()> {
  bentley::announce("Initializing Vector Store");

  if !config.rebuild && store.load_store()?.is_some() {
    return Ok(());
  }

  if config.rebuild {
    bentley::info("Rebuilding vector store...");
  } else {
    bentley::info("Vector store not found. Creating new vector store...");
  }

  let records = records::load_or_generate(&config.data_path, config.record_count)?;
  store.rebuild(records::preprocess(&records))?;
  Ok(())
}
