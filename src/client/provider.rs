//! Provider abstraction.
//!
//! The orchestrator talks to every language-model service through
//! [`CompletionProvider`]; concrete clients live next to this module.

use crate::models::{ProviderError, ProviderId};
use async_trait::async_trait;
use serde::Deserialize;

/// Text and token counts from one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// One call to an external language model.
///
/// Implementations make exactly one attempt; retry and fallback belong to
/// the caller.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider identity used for routing and cost records.
    fn id(&self) -> ProviderId;

    /// Send a single-turn prompt to `model`.
    async fn complete(&self, prompt: &str, model: &str) -> Result<Completion, ProviderError>;
}

/// Error body shapes returned by the supported APIs.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiErrorBody {
    /// OpenAI-compatible: `{"error": {"message": ...}}`
    Nested { error: ApiErrorDetail },
    /// Cohere: `{"message": ...}`
    Flat { message: String },
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Map a non-success HTTP status and body to a provider error.
pub(crate) fn api_error(status: u16, body: &str) -> ProviderError {
    if status == 401 {
        return ProviderError::AuthenticationFailed;
    }

    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody::Nested { error }) => error.message,
        Ok(ApiErrorBody::Flat { message }) => message,
        Err(_) => body.to_string(),
    };

    ProviderError::Api { status, message }
}
