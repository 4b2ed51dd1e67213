//! Speech synthesis and audio file output.

use crate::models::{BriefError, ProviderId, Result};
use crate::podcast::StudioBackend;
use chrono::{DateTime, Local, TimeZone};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Supported TTS voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl Voice {
    pub const ALL: [Voice; 6] = [
        Voice::Alloy,
        Voice::Echo,
        Voice::Fable,
        Voice::Onyx,
        Voice::Nova,
        Voice::Shimmer,
    ];

    /// Lowercase name sent to the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Alloy => "alloy",
            Voice::Echo => "echo",
            Voice::Fable => "fable",
            Voice::Onyx => "onyx",
            Voice::Nova => "nova",
            Voice::Shimmer => "shimmer",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Voice {
    type Err = BriefError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Voice::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = Voice::ALL.iter().map(Voice::as_str).collect();
                BriefError::Config(crate::models::ConfigError::Invalid(format!(
                    "unknown voice '{s}', expected one of: {}",
                    names.join(", ")
                )))
            })
    }
}

/// `<prefix>_<voice>_<YYYYMMDD_HHMMSS>.<ext>`
pub fn output_file_name<Tz>(prefix: &str, voice: Voice, ext: &str, timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!(
        "{prefix}_{voice}_{}.{ext}",
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// Writes synthesized speech under an output directory.
pub struct SpeechSynthesizer {
    backend: Arc<dyn StudioBackend>,
    model: String,
    output_dir: PathBuf,
    prefix: String,
    extension: String,
}

impl SpeechSynthesizer {
    pub fn new(
        backend: Arc<dyn StudioBackend>,
        model: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            output_dir: output_dir.into(),
            prefix: prefix.into(),
            extension: "mp3".to_string(),
        }
    }

    /// Synthesize `script` and return the written file path.
    ///
    /// The output directory is created if missing.
    pub async fn synthesize(&self, script: &str, voice: Voice) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| BriefError::io(format!("creating {}", self.output_dir.display()), e))?;

        let file_name = output_file_name(&self.prefix, voice, &self.extension, &Local::now());
        let path = self.output_dir.join(file_name);

        let audio = self
            .backend
            .speech(&self.model, voice.as_str(), script)
            .await
            .map_err(|source| BriefError::ProviderCall {
                provider: ProviderId::OpenAi,
                source,
            })?;

        tokio::fs::write(&path, &audio)
            .await
            .map_err(|e| BriefError::io(format!("writing {}", path.display()), e))?;

        info!(path = %path.display(), bytes = audio.len(), "Audio written");
        Ok(path)
    }
}
