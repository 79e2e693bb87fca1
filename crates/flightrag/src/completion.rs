use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_CHAT_MODEL: &str = "openai/gpt-oss-20b";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// A message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
  pub role: String,
  pub content: String,
}

impl Message {
  pub fn system(content: impl Into<String>) -> Self {
    Self { role: "system".to_string(), content: content.into() }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self { role: "user".to_string(), content: content.into() }
  }
}

/// Hosted language model that answers a conversation with one reply
#[async_trait]
pub trait ChatModel: Send + Sync {
  fn model_name(&self) -> &str;

  async fn complete(&self, messages: &[Message]) -> anyhow::Result<String>;
}

/// Groq's OpenAI-compatible chat completions endpoint
pub struct GroqChatModel {
  model_name: String,
  api_key: String,
  api_base: String,
  max_tokens: u32,
  temperature: f64,
  http_client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: &'a [Message],
  max_tokens: u32,
  temperature: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
  content: Option<String>,
}

impl GroqChatModel {
  pub fn new(model_name: &str, api_key: &str) -> Self {
    Self {
      model_name: model_name.to_string(),
      api_key: api_key.to_string(),
      api_base: GROQ_API_BASE.to_string(),
      max_tokens: DEFAULT_MAX_TOKENS,
      temperature: DEFAULT_TEMPERATURE,
      http_client: reqwest::Client::new(),
    }
  }

  pub fn with_api_base(mut self, api_base: &str) -> Self {
    self.api_base = api_base.trim_end_matches('/').to_string();
    self
  }

  pub fn with_sampling(mut self, temperature: f64, max_tokens: u32) -> Self {
    self.temperature = temperature;
    self.max_tokens = max_tokens;
    self
  }

  fn endpoint(&self) -> String {
    format!("{}/chat/completions", self.api_base)
  }
}

#[async_trait]
impl ChatModel for GroqChatModel {
  fn model_name(&self) -> &str {
    &self.model_name
  }

  async fn complete(&self, messages: &[Message]) -> anyhow::Result<String> {
    let request = ChatRequest {
      model: &self.model_name,
      messages,
      max_tokens: self.max_tokens,
      temperature: self.temperature,
    };

    tracing::debug!(model = %self.model_name, messages = messages.len(), "sending chat completion");

    let resp = self
      .http_client
      .post(self.endpoint())
      .bearer_auth(&self.api_key)
      .json(&request)
      .send()
      .await?;

    if !resp.status().is_success() {
      let status = resp.status();
      let body = resp.text().await.unwrap_or_default();
      anyhow::bail!("Chat completion API error ({status}): {body}");
    }

    let response: ChatResponse = resp.json().await?;
    Ok(response.choices.into_iter().next().and_then(|c| c.message.content).unwrap_or_default())
  }
}
