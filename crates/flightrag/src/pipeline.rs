use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::completion::{ChatModel, Message};
use crate::retriever::FlightRetriever;

pub const DEFAULT_TOP_K: usize = 5;

const SYSTEM_PROMPT: &str = "\
You are an expert aviation assistant specializing in ADS-B (Automatic Dependent Surveillance-Broadcast) flight data analysis.

Your role is to:
1. Answer questions about flight positions, altitudes, speeds, and routes
2. Provide insights based on real-time ADS-B data
3. Identify patterns and anomalies in flight data
4. Explain aviation terminology clearly
5. Always cite the specific flight data when answering queries

When answering:
- Be precise with numbers (altitudes, speeds, coordinates)
- Use aviation terminology correctly
- Flag any unusual flight patterns
- Provide context for your answers based on the retrieved data

If the retrieved data doesn't contain relevant information, say so clearly.";

const RULE_WIDTH: usize = 70;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
  pub question: String,
  pub context: String,
  pub answer: String,
  pub success: bool,
}

pub fn build_messages(context: &str, question: &str) -> Vec<Message> {
  vec![
    Message::system(SYSTEM_PROMPT),
    Message::user(format!(
      "Based on the following flight data context, answer the user's question:\n\nContext:\n{context}\n\nQuestion: {question}"
    )),
  ]
}

/// Retrieval followed by one chat completion per question
pub struct RagPipeline {
  retriever: FlightRetriever,
  model: Box<dyn ChatModel>,
  top_k: usize,
}

impl RagPipeline {
  pub fn new(retriever: FlightRetriever, model: Box<dyn ChatModel>) -> Self {
    Self { retriever, model, top_k: DEFAULT_TOP_K }
  }

  pub fn with_top_k(mut self, top_k: usize) -> Self {
    self.top_k = top_k;
    self
  }

  /// Retrieval failures are errors; a failed completion is reported in the response instead
  pub async fn query(&mut self, question: &str) -> Result<QueryResponse> {
    let context = self.retriever.get_augmented_context(question, self.top_k)?;
    let messages = build_messages(&context, question);

    let (answer, success) = match self.model.complete(&messages).await {
      Ok(answer) => (answer, true),
      Err(e) => {
        tracing::warn!(model = self.model.model_name(), error = %e, "completion failed");
        (format!("Error generating response: {e}"), false)
      }
    };

    Ok(QueryResponse { question: question.to_string(), context, answer, success })
  }

  pub async fn chat(&mut self, questions: &[String]) -> Result<Vec<QueryResponse>> {
    let mut responses = Vec::with_capacity(questions.len());
    for question in questions {
      responses.push(self.query(question).await?);
    }
    Ok(responses)
  }

  /// Line-oriented chat loop until `exit`/`quit`, end of input, or Ctrl-C
  pub async fn interactive_chat<R, W>(&mut self, mut input: R, output: &mut W) -> Result<()>
  where
    R: AsyncBufRead + Unpin,
    W: Write,
  {
    let heavy = "=".repeat(RULE_WIDTH);
    writeln!(output, "\n{heavy}\nADS-B Flight Data RAG Chatbot\n{heavy}")?;
    writeln!(output, "Ask me anything about the flight data!")?;
    writeln!(output, "Type 'exit' or 'quit' to end the conversation.\n")?;

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
      write!(output, "You: ")?;
      output.flush()?;

      let mut line = String::new();
      let read = tokio::select! {
        read = input.read_line(&mut line) => read?,
        _ = &mut interrupt => 0,
      };
      if read == 0 {
        writeln!(output, "\n\nChatbot interrupted. Goodbye!")?;
        return Ok(());
      }

      let question = line.trim();
      if question.is_empty() {
        continue;
      }
      if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
        writeln!(output, "\nThank you for using the ADS-B Chatbot. Goodbye!")?;
        return Ok(());
      }

      writeln!(output, "\nProcessing your query...\n")?;
      let outcome = tokio::select! {
        outcome = self.query(question) => outcome,
        _ = &mut interrupt => {
          writeln!(output, "\n\nChatbot interrupted. Goodbye!")?;
          return Ok(());
        }
      };

      match outcome {
        Ok(response) => {
          writeln!(output, "Assistant: {}", response.answer)?;
          writeln!(output, "\n{}\n", "-".repeat(RULE_WIDTH))?;
        }
        Err(e) => writeln!(output, "Error: {e}")?,
      }
    }
  }
}
