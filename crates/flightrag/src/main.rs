use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use flightrag::{
  api_key_from_env, initialize_vector_store, ChatConfig, EmbeddingStore, FlightRetriever,
  GroqChatModel, OnnxEmbeddingModel, RagPipeline, StoreError,
};

#[derive(Parser)]
#[command(name = "adsb-chat")]
#[command(about = "ADS-B flight data chatbot\nAnswers questions using the nearest flight records as context")]
#[command(version)]
struct Cli {
  /// Flight record JSON file; synthesized when missing
  #[arg(long, value_name = "FILE")]
  data: Option<PathBuf>,

  /// Directory holding the vector store
  #[arg(long, value_name = "DIR")]
  store: Option<PathBuf>,

  /// Chat model identifier
  #[arg(long)]
  model: Option<String>,

  /// OpenAI-compatible API base URL
  #[arg(long, env = "FLIGHTRAG_API_BASE")]
  api_base: Option<String>,

  /// Documents retrieved per question
  #[arg(short = 'k', long)]
  top_k: Option<usize>,

  /// Records to synthesize when the data file is missing
  #[arg(long)]
  records: Option<usize>,

  /// Re-embed the records even if a store exists
  #[arg(long)]
  rebuild: bool,

  /// Answer these questions and exit instead of starting the chat loop
  #[arg(long, value_name = "QUESTION")]
  ask: Vec<String>,

  /// Print --ask responses as JSON
  #[arg(long, requires = "ask")]
  json: bool,

  /// Show debug output
  #[arg(short, long)]
  verbose: bool,
}

impl Cli {
  fn config(&self) -> ChatConfig {
    let defaults = ChatConfig::default();
    ChatConfig {
      data_path: self.data.clone().unwrap_or(defaults.data_path),
      store_dir: self.store.clone().unwrap_or(defaults.store_dir),
      chat_model: self.model.clone().unwrap_or(defaults.chat_model),
      api_base: self.api_base.clone().unwrap_or(defaults.api_base),
      top_k: self.top_k.unwrap_or(defaults.top_k),
      record_count: self.records.unwrap_or(defaults.record_count),
      rebuild: self.rebuild,
      ..defaults
    }
  }
}

fn init_logging(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if verbose {
      EnvFilter::new("flightrag=debug,warn")
    } else {
      EnvFilter::new("warn")
    }
  });

  let _ = tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(filter)
    .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  init_logging(cli.verbose);
  bentley::set_verbosity(bentley::Verbosity::from_flags(false, cli.verbose));

  bentley::announce("ADS-B Flight Data RAG Application");

  let api_key = match api_key_from_env() {
    Ok(key) => key,
    Err(e) => {
      bentley::error(&format!("ERROR: {e}"));
      bentley::info(&e.remediation());
      std::process::exit(1);
    }
  };

  let config = cli.config();

  let model = OnnxEmbeddingModel::load(&config.embedding_model).await?;
  let mut store = EmbeddingStore::new(Box::new(model), &config.store_dir);

  if let Err(e) = initialize_vector_store(&mut store, &config) {
    if let Some(StoreError::ModelMismatch { .. }) = e.downcast_ref::<StoreError>() {
      bentley::error(&e.to_string());
      bentley::info("Run again with --rebuild to re-embed the records with the current model.");
      std::process::exit(1);
    }
    return Err(e);
  }

  bentley::info("Initializing retriever...");
  let retriever = FlightRetriever::new(store);

  bentley::info("Initializing RAG pipeline with Groq LLM...");
  let chat_model = GroqChatModel::new(&config.chat_model, &api_key)
    .with_api_base(&config.api_base)
    .with_sampling(config.temperature, config.max_tokens);
  let mut pipeline = RagPipeline::new(retriever, Box::new(chat_model)).with_top_k(config.top_k);

  bentley::success("RAG Pipeline ready!");

  if !cli.ask.is_empty() {
    let responses = pipeline.chat(&cli.ask).await?;
    if cli.json {
      println!("{}", serde_json::to_string_pretty(&responses)?);
    } else {
      for response in &responses {
        println!("Q: {}\nA: {}\n", response.question, response.answer);
      }
    }
    return Ok(());
  }

  let stdin = BufReader::new(tokio::io::stdin());
  pipeline.interactive_chat(stdin, &mut std::io::stdout()).await
}
