//! Model client for LLM extraction calls.
//!
//! The [`ModelClient`] trait abstracts the completion endpoint so the
//! pipeline can be tested without network calls. [`AnthropicClient`] is
//! the reference implementation against the Anthropic messages API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Fixed sampling temperature. Zero keeps extraction deterministic.
const TEMPERATURE: f32 = 0.0;

/// Fixed ceiling on output tokens per extraction call.
const MAX_TOKENS: u32 = 2048;

/// Default model used for extraction.
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// A text-completion model endpoint.
///
/// One call per URL: the built prompt goes in as a single user message,
/// the first text block of the reply comes back.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Complete a prompt, returning the model's raw text reply.
    async fn complete(&self, prompt: &str) -> ModelResult<String>;

    /// Client name for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Anthropic messages API client.
#[derive(Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicClient {
    /// Create a client with the given API key and a 60 second call timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_timeout(api_key, Duration::from_secs(60))
    }

    /// Create a client with a specific per-call timeout.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> ModelResult<Self> {
        let api_key =
            std::env::var("ANTHROPIC_API_KEY").map_err(|_| ModelError::MissingApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the base URL (for proxies and test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> ModelResult<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Http(Box::new(e)))?;

        // First text block of the reply is the extraction payload.
        reply
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .ok_or(ModelError::Empty)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

// Request/Response types

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = AnthropicClient::new("sk-test")
            .with_model("claude-3-5-haiku-20241022")
            .with_base_url("http://localhost:9999");

        assert_eq!(client.model(), "claude-3-5-haiku-20241022");
        assert_eq!(client.base_url, "http://localhost:9999");
        assert_eq!(client.name(), "anthropic");
    }

    #[test]
    fn test_response_text_block_parsing() {
        let raw = r#"{"content": [{"type": "text", "text": "{\"a\": 1}"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            parsed.content.first(),
            Some(ContentBlock::Text { text }) if text == "{\"a\": 1}"
        ));
    }
}
