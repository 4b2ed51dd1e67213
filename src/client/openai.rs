//! Client for OpenAI-compatible endpoints.
//!
//! Covers chat completions (summaries, podcast scripts) and speech synthesis.
//! One attempt per call: failures are returned to the orchestrator, which
//! decides whether another provider should be tried.

use crate::client::{Completion, CompletionProvider, TokenCounter, api_error};
use crate::models::{BriefError, ProviderError, ProviderId, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Message in a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Optional sampling parameters for a chat call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

/// Chat completion request payload.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Speech synthesis request payload.
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

/// Client for an OpenAI-compatible API.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    tokens: Arc<TokenCounter>,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// `timeout_secs` bounds every request made through this client.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout_secs: u64,
        tokens: Arc<TokenCounter>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(BriefError::Network)?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build headers for a request.
    fn headers(&self) -> std::result::Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| ProviderError::AuthenticationFailed)?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Send a chat request and return the first choice's content.
    pub async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: ChatOptions,
    ) -> std::result::Result<String, ProviderError> {
        let start = Instant::now();
        let request = ChatCompletionRequest {
            model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("No content in response".to_string()))?;

        debug!(
            model = model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Chat completion finished"
        );

        Ok(content)
    }

    /// Synthesize speech and return the encoded audio.
    pub async fn speech(
        &self,
        model: &str,
        voice: &str,
        input: &str,
    ) -> std::result::Result<Vec<u8>, ProviderError> {
        let voice = voice.to_lowercase();
        let request = SpeechRequest {
            model,
            voice: &voice,
            input,
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    async fn complete(
        &self,
        prompt: &str,
        model: &str,
    ) -> std::result::Result<Completion, ProviderError> {
        let text = self
            .chat(model, &[Message::user(prompt)], ChatOptions::default())
            .await?;
        let (input_tokens, output_tokens) = self.tokens.count_call(model, prompt, &text);

        Ok(Completion {
            text,
            input_tokens,
            output_tokens,
        })
    }
}
