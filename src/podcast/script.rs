//! Podcast script generation.

use crate::client::{ChatOptions, Message};
use crate::models::{BriefError, ProviderId, Result};
use crate::podcast::StudioBackend;
use std::sync::Arc;
use tracing::info;

pub const SCRIPTWRITER_SYSTEM_PROMPT: &str = "You are a professional podcast scriptwriter. \
Create engaging, concise dialogue for short 30-second podcasts.";

/// Sampling used for each script chunk.
pub const SCRIPT_OPTIONS: ChatOptions = ChatOptions {
    max_tokens: Some(200),
    temperature: Some(0.7),
};

/// Split text into chunks of at most `max_chars` characters without
/// breaking sentences.
///
/// A single sentence longer than `max_chars` becomes its own chunk.
pub fn chunk_by_sentences(text: &str, max_chars: usize) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in split_sentences(&normalized) {
        let len = sentence.chars().count();
        if current_len > 0 && current_len + 1 + len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(sentence);
        current_len += len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Sentences end at `.`, `!` or `?` followed by a space.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev_terminal = false;

    for (i, c) in text.char_indices() {
        if c == ' ' && prev_terminal {
            let sentence = text[start..i].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = i + 1;
        }
        prev_terminal = matches!(c, '.' | '!' | '?');
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

pub fn script_prompt(chunk: &str) -> String {
    format!(
        "Convert the following text into a SHORT engaging podcast script.\n\
         Make it conversational, informative, and around 30 seconds long (approximately 75-90 words).\n\
         Keep it brief and to the point. You can format it as simple dialogue or a host monologue.\n\n\
         Text:\n{chunk}\n\nPodcast Script:"
    )
}

/// Turns text chunks into a podcast script.
pub struct ScriptWriter {
    backend: Arc<dyn StudioBackend>,
    model: String,
}

impl ScriptWriter {
    pub fn new(backend: Arc<dyn StudioBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// Script for one chunk.
    pub async fn write(&self, chunk: &str) -> Result<String> {
        let messages = [
            Message::system(SCRIPTWRITER_SYSTEM_PROMPT),
            Message::user(script_prompt(chunk)),
        ];
        self.backend
            .chat(&self.model, &messages, SCRIPT_OPTIONS)
            .await
            .map_err(|source| BriefError::ProviderCall {
                provider: ProviderId::OpenAi,
                source,
            })
    }

    /// Script for every chunk, joined by blank lines.
    pub async fn write_all(&self, chunks: &[String]) -> Result<String> {
        let mut scripts = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            info!(chunk = idx + 1, total = chunks.len(), "Generating script chunk");
            scripts.push(self.write(chunk).await?);
        }
        Ok(scripts.join("\n\n").trim().to_string())
    }
}
