use anyhow::{anyhow, Result};

#[cfg(feature = "neural")]
use ort::{
  session::{builder::GraphOptimizationLevel, Session, SessionOutputs},
  value::Tensor,
};

pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const MINILM_DIMENSION: usize = 384;

#[cfg(feature = "neural")]
const TOKENIZER_FILE: &str = "tokenizer.json";
#[cfg(feature = "neural")]
const MODEL_FILE: &str = "onnx/model.onnx";
#[cfg(feature = "neural")]
const MAX_SEQUENCE_LENGTH: usize = 256;

const MAX_TEXT_LENGTH: usize = 8192;

/// Turns text into dense vectors of a fixed dimension
pub trait EmbeddingModel: Send {
  /// Identifier recorded next to stored embeddings
  fn name(&self) -> &str;

  fn dimension(&self) -> usize;

  fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

  fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
    self
      .embed_batch(&[text.to_string()])?
      .pop()
      .ok_or_else(|| anyhow!("Embedding model returned no vector for the query"))
  }
}

#[cfg(feature = "neural")]
pub struct OnnxEmbeddingModel {
  model_id: String,
  session: Session,
  tokenizer: tokenizers::Tokenizer,
}

#[cfg(feature = "neural")]
#[cfg(not(tarpaulin_include))]
impl OnnxEmbeddingModel {
  /// Fetch the tokenizer and ONNX export from the Hugging Face hub (cached locally) and load them
  pub async fn load(model_id: &str) -> Result<Self> {
    bentley::info!("Loading embedding model {model_id}...");

    let api =
      hf_hub::api::tokio::Api::new().map_err(|e| anyhow!("HF API initialization failed: {e}"))?;
    let repo = api.model(model_id.to_string());

    let tokenizer_file =
      repo.get(TOKENIZER_FILE).await.map_err(|e| anyhow!("Failed to download tokenizer: {e}"))?;
    let model_path =
      repo.get(MODEL_FILE).await.map_err(|e| anyhow!("Failed to download ONNX model: {e}"))?;

    let mut tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_file)
      .map_err(|e| anyhow!("Failed to load tokenizer: {e}"))?;
    tokenizer
      .with_truncation(Some(tokenizers::TruncationParams {
        max_length: MAX_SEQUENCE_LENGTH,
        ..Default::default()
      }))
      .map_err(|e| anyhow!("Failed to configure truncation: {e}"))?;
    tokenizer.with_padding(None);

    let session = Session::builder()?
      .with_optimization_level(GraphOptimizationLevel::Level1)?
      .commit_from_file(&model_path)
      .map_err(|e| anyhow!("Failed to load ONNX model: {e}"))?;

    tracing::debug!(model = model_id, path = %model_path.display(), "embedding model loaded");

    Ok(Self { model_id: model_id.to_string(), session, tokenizer })
  }
}

#[cfg(feature = "neural")]
impl EmbeddingModel for OnnxEmbeddingModel {
  fn name(&self) -> &str {
    &self.model_id
  }

  fn dimension(&self) -> usize {
    MINILM_DIMENSION
  }

  fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
      return Ok(vec![]);
    }
    validate_inputs(texts)?;

    let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let encodings = self
      .tokenizer
      .encode_batch(text_refs, true)
      .map_err(|e| anyhow!("Failed to encode texts: {e}"))?;

    let (ids, mask, token_type_ids, batch, length) = batch_tokens(&encodings);

    let ids = Tensor::from_array(([batch, length], ids.into_boxed_slice()))?;
    let mask_tensor = Tensor::from_array(([batch, length], mask.clone().into_boxed_slice()))?;
    let token_type_ids =
      Tensor::from_array(([batch, length], token_type_ids.into_boxed_slice()))?;

    let outputs = self.session.run(ort::inputs![
      "input_ids" => ids,
      "attention_mask" => mask_tensor,
      "token_type_ids" => token_type_ids
    ])?;

    let output = hidden_state(&outputs)?;
    let (shape, data) = output.try_extract_tensor::<f32>()?;
    let dims: Vec<i64> = shape.iter().copied().collect();

    let hidden = match dims.as_slice() {
      [b, l, h] if *b as usize == batch && *l as usize == length => *h as usize,
      other => return Err(anyhow!("Unexpected hidden state shape {other:?}")),
    };

    Ok(
      mean_pool(data, &mask, batch, length, hidden)
        .into_iter()
        .map(normalize_vector)
        .collect(),
    )
  }
}

#[cfg(feature = "neural")]
fn hidden_state<'a>(outputs: &'a SessionOutputs<'_>) -> Result<&'a ort::value::Value> {
  outputs.get("last_hidden_state").or_else(|| outputs.get("output_0")).ok_or_else(|| {
    anyhow!("No output tensor found - available outputs: {:?}", outputs.keys().collect::<Vec<_>>())
  })
}

#[cfg(feature = "neural")]
fn batch_tokens(
  encodings: &[tokenizers::Encoding],
) -> (Vec<i64>, Vec<i64>, Vec<i64>, usize, usize) {
  let batch = encodings.len();
  let length = encodings.iter().map(|e| e.len()).max().unwrap_or(0);

  let mut ids = Vec::with_capacity(batch * length);
  let mut mask = Vec::with_capacity(batch * length);
  let mut token_type_ids = Vec::with_capacity(batch * length);

  for encoding in encodings {
    let encoding_ids = encoding.get_ids();
    let encoding_mask = encoding.get_attention_mask();

    for i in 0..length {
      if i < encoding_ids.len() {
        ids.push(encoding_ids[i] as i64);
        mask.push(encoding_mask[i] as i64);
      } else {
        ids.push(0);
        mask.push(0);
      }
      token_type_ids.push(0);
    }
  }

  (ids, mask, token_type_ids, batch, length)
}

/// Average token vectors per sequence, counting only positions the mask marks as real.
///
/// `data` is a row-major `[batch, length, hidden]` tensor and `mask` is `[batch, length]`.
pub fn mean_pool(
  data: &[f32],
  mask: &[i64],
  batch: usize,
  length: usize,
  hidden: usize,
) -> Vec<Vec<f32>> {
  (0..batch)
    .map(|b| {
      let mut pooled = vec![0.0f32; hidden];
      let mut count = 0.0f32;

      for t in 0..length {
        if mask[b * length + t] == 0 {
          continue;
        }
        let start = (b * length + t) * hidden;
        for (acc, value) in pooled.iter_mut().zip(&data[start..start + hidden]) {
          *acc += value;
        }
        count += 1.0;
      }

      if count > 0.0 {
        pooled.iter_mut().for_each(|v| *v /= count);
      }
      pooled
    })
    .collect()
}

pub fn normalize_vector(vector: Vec<f32>) -> Vec<f32> {
  let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
  if magnitude > 0.0 {
    vector.into_iter().map(|x| x / magnitude).collect()
  } else {
    vector
  }
}

fn validate_inputs(texts: &[String]) -> Result<()> {
  for text in texts {
    if text.len() > MAX_TEXT_LENGTH {
      return Err(anyhow!("Text too long: {} characters (max {MAX_TEXT_LENGTH})", text.len()));
    }
  }
  Ok(())
}

/// Deterministic bag-of-words embeddings for tests and offline runs.
///
/// Every lowercase alphanumeric word is hashed into one of `dimension` buckets;
/// texts sharing words land close together.
pub struct MockEmbeddingModel {
  pub dimension: usize,
  pub fail_on_texts: Vec<String>,
  pub calls: usize,
}

impl MockEmbeddingModel {
  pub fn new() -> Self {
    Self::with_dimension(32)
  }

  pub fn with_dimension(dimension: usize) -> Self {
    Self { dimension, fail_on_texts: vec![], calls: 0 }
  }

  fn bucket(&self, word: &str) -> usize {
    // FNV-1a
    let hash = word
      .bytes()
      .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
    (hash % self.dimension as u64) as usize
  }

  fn vectorize(&self, text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; self.dimension];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
      vector[self.bucket(&word.to_lowercase())] += 1.0;
    }
    normalize_vector(vector)
  }
}

impl Default for MockEmbeddingModel {
  fn default() -> Self {
    Self::new()
  }
}

impl EmbeddingModel for MockEmbeddingModel {
  fn name(&self) -> &str {
    "mock-bag-of-words"
  }

  fn dimension(&self) -> usize {
    self.dimension
  }

  fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    self.calls += 1;

    if let Some(text) = texts.iter().find(|t| self.fail_on_texts.contains(t)) {
      return Err(anyhow!("Mock failure for text: {text}"));
    }
    validate_inputs(texts)?;

    Ok(texts.iter().map(|t| self.vectorize(t)).collect())
  }
}
