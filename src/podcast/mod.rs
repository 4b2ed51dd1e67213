//! Podcast studio: text, URL or PDF in, script and audio file out.
//!
//! Flow:
//! Input → extract + clean → sentence chunks → script per chunk → TTS → file

mod extract;
mod script;
mod tts;

#[cfg(test)]
pub(crate) mod mock;

pub use extract::*;
pub use script::*;
pub use tts::*;

use crate::client::{ChatOptions, Message, OpenAiClient};
use crate::models::{PodcastConfig, ProviderError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Chat and speech endpoints used by the studio.
#[async_trait]
pub trait StudioBackend: Send + Sync {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: ChatOptions,
    ) -> std::result::Result<String, ProviderError>;

    async fn speech(
        &self,
        model: &str,
        voice: &str,
        input: &str,
    ) -> std::result::Result<Vec<u8>, ProviderError>;
}

#[async_trait]
impl StudioBackend for OpenAiClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: ChatOptions,
    ) -> std::result::Result<String, ProviderError> {
        OpenAiClient::chat(self, model, messages, options).await
    }

    async fn speech(
        &self,
        model: &str,
        voice: &str,
        input: &str,
    ) -> std::result::Result<Vec<u8>, ProviderError> {
        OpenAiClient::speech(self, model, voice, input).await
    }
}

/// A generated episode.
#[derive(Debug, Clone)]
pub struct PodcastEpisode {
    pub script: String,
    /// `None` when speech synthesis failed
    pub audio_path: Option<PathBuf>,
    pub chunks: usize,
}

/// End-to-end podcast generation.
pub struct PodcastStudio {
    extractor: InputExtractor,
    writer: ScriptWriter,
    synthesizer: SpeechSynthesizer,
    chunk_chars: usize,
}

impl PodcastStudio {
    pub fn new(backend: Arc<dyn StudioBackend>, config: &PodcastConfig) -> Result<Self> {
        Ok(Self {
            extractor: InputExtractor::new(config.fetch_timeout_secs)?,
            writer: ScriptWriter::new(Arc::clone(&backend), config.script_model.clone()),
            synthesizer: SpeechSynthesizer::new(
                backend,
                config.tts_model.clone(),
                config.output_dir.clone(),
                config.file_prefix.clone(),
            ),
            chunk_chars: config.chunk_chars,
        })
    }

    /// Produce a script and, if synthesis succeeds, an audio file.
    ///
    /// Extraction and script failures are errors; a speech failure is logged
    /// and leaves `audio_path` empty.
    pub async fn create(&self, input: &str, pdf: Option<&Path>, voice: Voice) -> Result<PodcastEpisode> {
        info!(voice = %voice, "Podcast generation started");

        let content = self.extractor.process_input(input, pdf).await?;
        let chunks = chunk_by_sentences(&content, self.chunk_chars);
        let script = self.writer.write_all(&chunks).await?;

        info!("Generating audio");
        let audio_path = match self.synthesizer.synthesize(&script, voice).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "TTS failed, returning script only");
                None
            }
        };

        Ok(PodcastEpisode {
            script,
            audio_path,
            chunks: chunks.len(),
        })
    }
}
