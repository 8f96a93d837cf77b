/// LLM client: the single point of entry for chat-completion and embedding
/// calls in AdaptiveCV.
///
/// Pipeline stages and the embedding metric only see the `LanguageModel` and
/// `EmbeddingProvider` traits, so tests swap in scripted fakes and no other
/// module talks to the provider's HTTP API directly.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub mod prompts;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const LONG_OUTPUT_MAX_TOKENS: u32 = 4000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Marker some models echo back in front of schema-shaped output.
const SCHEMA_MARKER: &str = "JSON_OUTPUT_ACCORDING_TO_RESUME_DATA_SCHEMA";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Embedding response had {got} vectors for {expected} inputs")]
    EmbeddingCount { expected: usize, got: usize },
}

/// One completion call. `json_output` asks the provider for a JSON object;
/// `longer_output` raises the token ceiling for long-form text.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub json_output: bool,
    pub longer_output: bool,
}

impl<'a> CompletionRequest<'a> {
    pub fn text(prompt: &'a str) -> Self {
        Self {
            prompt,
            json_output: false,
            longer_output: false,
        }
    }

    pub fn json(prompt: &'a str) -> Self {
        Self {
            prompt,
            json_output: true,
            longer_output: false,
        }
    }

    pub fn longer(mut self) -> Self {
        self.longer_output = true;
        self
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Runs one completion and returns the raw text of the first choice.
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError>;

    /// Completion in JSON mode, parsed leniently with `parse_json_markdown`.
    /// An empty object, array or string counts as no content.
    async fn complete_json(&self, prompt: &str) -> Result<Value, LlmError> {
        let text = self.complete(CompletionRequest::json(prompt)).await?;
        let value = parse_json_markdown(&text)?;
        if is_empty_value(&value) {
            return Err(LlmError::EmptyContent);
        }
        Ok(value)
    }
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// One vector per input, in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}

// ── OpenAI wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

// ── Client ──────────────────────────────────────────────────────────────────

/// Chat-completions and embeddings client for the OpenAI HTTP API.
/// Every call is a single attempt; failures surface to the caller.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, LlmError> {
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompts::CV_EXPERT_SYSTEM,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
            temperature: 0.0,
            max_tokens: request.longer_output.then_some(LONG_OUTPUT_MAX_TOKENS),
            response_format: request.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response: ChatResponse = self.post("chat/completions", &body).await?.json().await?;

        if let Some(usage) = &response.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(LlmError::EmptyContent),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbeddingRequest {
            model: &self.embedding_model,
            input: inputs.iter().map(|s| s.replace('\n', " ")).collect(),
        };
        let mut response: EmbeddingResponse =
            self.post("embeddings", &body).await?.json().await?;

        if response.data.len() != inputs.len() {
            return Err(LlmError::EmbeddingCount {
                expected: inputs.len(),
                got: response.data.len(),
            });
        }

        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

// ── Output parsing ──────────────────────────────────────────────────────────

/// Parses model output that should be JSON but may be wrapped in a markdown
/// code fence, carry a `json`/`typescript` tag, or echo the schema marker.
pub fn parse_json_markdown(text: &str) -> Result<Value, serde_json::Error> {
    let body = strip_language_tag(strip_code_fences(text));
    let body = body.replace(SCHEMA_MARKER, "");
    serde_json::from_str(body.trim())
}

/// A missing closing fence (a reply cut off mid-stream) still has its
/// opening fence removed.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    match text.strip_prefix("```") {
        Some(stripped) => stripped
            .trim_end()
            .strip_suffix("```")
            .unwrap_or(stripped)
            .trim(),
        None => text,
    }
}

fn strip_language_tag(text: &str) -> &str {
    for tag in ["json", "typescript"] {
        if let Some(rest) = text.strip_prefix(tag) {
            return rest.trim_start();
        }
    }
    text
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
