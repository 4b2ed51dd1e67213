//! Client for the Cohere v2 chat API.

use crate::client::{Completion, CompletionProvider, Message, TokenCounter, api_error};
use crate::models::{BriefError, ProviderError, ProviderId, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
}

/// `{"message": {"content": [{"type": "text", "text": ...}]}}`
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.message
            .content
            .into_iter()
            .find_map(|block| block.text)
    }
}

/// Cohere chat client.
pub struct CohereClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    tokens: Arc<TokenCounter>,
}

impl CohereClient {
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
}

#[async_trait]
impl CompletionProvider for CohereClient {
    fn id(&self) -> ProviderId {
        ProviderId::Cohere
    }

    async fn complete(
        &self,
        prompt: &str,
        model: &str,
    ) -> std::result::Result<Completion, ProviderError> {
        let request = ChatRequest {
            model,
            messages: vec![Message::user(prompt)],
        };

        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        let text = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?
            .into_text()
            .ok_or_else(|| ProviderError::InvalidResponse("No text in response".to_string()))?;

        let (input_tokens, output_tokens) = self.tokens.count_call(model, prompt, &text);

        Ok(Completion {
            text,
            input_tokens,
            output_tokens,
        })
    }
}
