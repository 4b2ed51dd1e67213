//! Token counting.
//!
//! Counts come from the tiktoken encoding registered for a model. Models the
//! tokenizer cannot resolve are estimated at four characters per token, and
//! that estimate is applied to both sides of a call so input and output stay
//! comparable.

use dashmap::DashMap;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Characters per token used when no encoding is known for a model.
pub const CHARS_PER_TOKEN: usize = 4;

/// Crude token estimate for text of unknown encoding.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() / CHARS_PER_TOKEN) as u64
}

/// Model-keyed tokenizer cache.
#[derive(Default)]
pub struct TokenCounter {
    /// `None` marks models the tokenizer could not resolve
    encodings: DashMap<String, Option<Arc<CoreBPE>>>,
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("models", &self.encodings.len())
            .finish()
    }
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn encoding(&self, model: &str) -> Option<Arc<CoreBPE>> {
        if let Some(cached) = self.encodings.get(model) {
            return cached.clone();
        }

        let loaded = tiktoken_rs::get_bpe_from_model(model).ok().map(Arc::new);
        if loaded.is_none() {
            debug!(model = model, "No tokenizer for model, estimating by characters");
        }
        self.encodings
            .entry(model.to_string())
            .or_insert(loaded)
            .clone()
    }

    /// True if an exact encoding is available for the model.
    pub fn is_exact(&self, model: &str) -> bool {
        self.encoding(model).is_some()
    }

    /// Count tokens in one text.
    pub fn count(&self, model: &str, text: &str) -> u64 {
        match self.encoding(model) {
            Some(bpe) => bpe.encode_with_special_tokens(text).len() as u64,
            None => estimate_tokens(text),
        }
    }

    /// Count (input, output) tokens for one call with a single method.
    pub fn count_call(&self, model: &str, prompt: &str, output: &str) -> (u64, u64) {
        match self.encoding(model) {
            Some(bpe) => (
                bpe.encode_with_special_tokens(prompt).len() as u64,
                bpe.encode_with_special_tokens(output).len() as u64,
            ),
            None => (estimate_tokens(prompt), estimate_tokens(output)),
        }
    }
}
