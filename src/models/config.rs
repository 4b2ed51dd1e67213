//! Configuration models for newsbrief.
//!
//! Everything tunable is parameterized here. The config is read once at
//! startup (TOML file, then environment overrides), validated, and passed
//! by reference to every component that needs it.

use super::ProviderId;
use crate::cost::ModelPrice;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::info;

/// Top-level configuration for newsbrief.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenAI-compatible provider (summaries, podcast scripts, speech)
    pub openai: ProviderConfig,

    /// Cohere provider (sentiment, fallback)
    pub cohere: ProviderConfig,

    /// News source settings
    pub news: NewsConfig,

    /// Cost ceiling
    pub budget: BudgetConfig,

    /// HTTP client settings shared by all providers
    pub http: HttpConfig,

    /// Summarization pipeline settings
    pub pipeline: PipelineConfig,

    /// Podcast studio settings
    pub podcast: PodcastConfig,

    /// Extra or overriding model prices (USD per 1M tokens), keyed by model id
    pub pricing: HashMap<String, ModelPrice>,
}

/// Per-provider settings. Unset fields fall back to the provider's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (supports ${ENV_VAR} expansion)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Base URL of the API
    #[serde(default)]
    pub base_url: Option<String>,

    /// Model id used for every call through this provider
    #[serde(default)]
    pub model: Option<String>,

    /// Requests-per-minute quota (0 disables spacing)
    #[serde(default)]
    pub requests_per_minute: Option<u32>,
}

/// Provider settings with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub api_key_env: String,
    pub base_url: String,
    pub model: String,
    pub requests_per_minute: u32,
}

impl ProviderSettings {
    fn defaults(id: ProviderId) -> Self {
        match id {
            ProviderId::OpenAi => Self {
                api_key_env: "OPENAI_API_KEY".to_string(),
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                requests_per_minute: 500,
            },
            ProviderId::Cohere => Self {
                api_key_env: "COHERE_API_KEY".to_string(),
                base_url: "https://api.cohere.com/v2".to_string(),
                model: "command-r7b-12-2024".to_string(),
                requests_per_minute: 50,
            },
        }
    }
}

/// News source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// API key (supports ${ENV_VAR} expansion)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_news_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the news API
    #[serde(default = "default_news_base_url")]
    pub base_url: String,

    /// Requests-per-minute quota
    #[serde(default = "default_news_rpm")]
    pub requests_per_minute: u32,

    /// Country code for headlines
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_news_api_key_env() -> String {
    "NEWS_API_KEY".to_string()
}

fn default_news_base_url() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_news_rpm() -> u32 {
    100
}

fn default_country() -> String {
    "us".to_string()
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_news_api_key_env(),
            base_url: default_news_base_url(),
            requests_per_minute: default_news_rpm(),
            country: default_country(),
        }
    }
}

/// Budget configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Maximum cumulative spend (USD) before further calls are refused
    #[serde(default = "default_daily_budget")]
    pub daily_usd: f64,
}

fn default_daily_budget() -> f64 {
    5.0
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_usd: default_daily_budget(),
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

/// Summarization pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Provider asked for summaries first
    #[serde(default = "default_summary_provider")]
    pub summary_provider: ProviderId,

    /// Provider asked for sentiment
    #[serde(default = "default_sentiment_provider")]
    pub sentiment_provider: ProviderId,

    /// In-flight article cap for concurrent mode
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Characters of article content included in the summary prompt
    #[serde(default = "default_content_chars")]
    pub content_chars: usize,

    /// Category used when the prompt is left empty
    #[serde(default = "default_category")]
    pub default_category: String,
}

fn default_summary_provider() -> ProviderId {
    ProviderId::OpenAi
}

fn default_sentiment_provider() -> ProviderId {
    ProviderId::Cohere
}

fn default_max_concurrent() -> usize {
    3
}

fn default_content_chars() -> usize {
    500
}

fn default_category() -> String {
    "technology".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            summary_provider: default_summary_provider(),
            sentiment_provider: default_sentiment_provider(),
            max_concurrent: default_max_concurrent(),
            content_chars: default_content_chars(),
            default_category: default_category(),
        }
    }
}

/// Podcast studio configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastConfig {
    /// Directory receiving generated audio
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name prefix for generated audio
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Default voice
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Model writing the script
    #[serde(default = "default_script_model")]
    pub script_model: String,

    /// Text-to-speech model
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Maximum characters per script-generation chunk
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,

    /// Timeout for fetching URL input
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("recordings")
}

fn default_file_prefix() -> String {
    "podcast".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

fn default_script_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_chunk_chars() -> usize {
    2000
}

fn default_fetch_timeout() -> u64 {
    10
}

impl Default for PodcastConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
            voice: default_voice(),
            script_model: default_script_model(),
            tts_model: default_tts_model(),
            chunk_chars: default_chunk_chars(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

/// API keys resolved at startup.
#[derive(Clone)]
pub struct ApiKeys {
    pub openai: String,
    pub cohere: String,
    pub news: String,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys").finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Load, apply environment overrides and validate.
    ///
    /// A missing file is not an error: defaults are used.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |var| std::env::var(var).ok())
    }

    /// [`Config::load`] with an explicit environment lookup.
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            info!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DAILY_BUDGET`, `REQUEST_TIMEOUT` and `MAX_CONCURRENT` overrides.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("DAILY_BUDGET") {
            self.budget.daily_usd = parse_override("DAILY_BUDGET", &raw)?;
        }
        if let Some(raw) = lookup("REQUEST_TIMEOUT") {
            self.http.timeout_secs = parse_override("REQUEST_TIMEOUT", &raw)?;
        }
        if let Some(raw) = lookup("MAX_CONCURRENT") {
            self.pipeline.max_concurrent = parse_override("MAX_CONCURRENT", &raw)?;
        }
        Ok(())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.budget.daily_usd > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "budget.daily_usd must be positive, got {}",
                self.budget.daily_usd
            )));
        }
        if self.pipeline.max_concurrent == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.pipeline.content_chars == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.content_chars must be at least 1".to_string(),
            ));
        }
        if self.pipeline.summary_provider == self.pipeline.sentiment_provider {
            return Err(ConfigError::Invalid(format!(
                "pipeline.summary_provider and pipeline.sentiment_provider must differ (both '{}')",
                self.pipeline.summary_provider
            )));
        }
        if self.podcast.chunk_chars == 0 {
            return Err(ConfigError::Invalid(
                "podcast.chunk_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Raw settings table for a provider.
    pub fn provider(&self, id: ProviderId) -> &ProviderConfig {
        match id {
            ProviderId::OpenAi => &self.openai,
            ProviderId::Cohere => &self.cohere,
        }
    }

    /// Provider settings with defaults filled in.
    pub fn provider_settings(&self, id: ProviderId) -> ProviderSettings {
        let raw = self.provider(id);
        let defaults = ProviderSettings::defaults(id);
        ProviderSettings {
            api_key_env: raw.api_key_env.clone().unwrap_or(defaults.api_key_env),
            base_url: raw.base_url.clone().unwrap_or(defaults.base_url),
            model: raw.model.clone().unwrap_or(defaults.model),
            requests_per_minute: raw
                .requests_per_minute
                .unwrap_or(defaults.requests_per_minute),
        }
    }

    /// Resolve the API key for one provider from config or environment.
    pub fn resolve_provider_key(&self, id: ProviderId) -> Result<String, ConfigError> {
        let env_var = self.provider_settings(id).api_key_env;
        resolve_key(self.provider(id).api_key.as_deref(), &env_var, |v| {
            std::env::var(v).ok()
        })
        .ok_or(ConfigError::MissingApiKey {
            service: id.to_string(),
            env_var,
        })
    }

    /// Resolve every key the news summarizer needs.
    ///
    /// All missing keys are reported together.
    pub fn resolve_api_keys(&self) -> Result<ApiKeys, ConfigError> {
        self.resolve_api_keys_with(|v| std::env::var(v).ok())
    }

    /// Same as [`Config::resolve_api_keys`] with an explicit environment.
    pub fn resolve_api_keys_with<F>(&self, lookup: F) -> Result<ApiKeys, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_env = self.provider_settings(ProviderId::OpenAi).api_key_env;
        let cohere_env = self.provider_settings(ProviderId::Cohere).api_key_env;

        let openai = resolve_key(self.openai.api_key.as_deref(), &openai_env, &lookup);
        let cohere = resolve_key(self.cohere.api_key.as_deref(), &cohere_env, &lookup);
        let news = resolve_key(self.news.api_key.as_deref(), &self.news.api_key_env, &lookup);

        match (openai, cohere, news) {
            (Some(openai), Some(cohere), Some(news)) => Ok(ApiKeys {
                openai,
                cohere,
                news,
            }),
            (openai, cohere, news) => {
                let missing = [
                    (openai.is_none(), openai_env),
                    (cohere.is_none(), cohere_env),
                    (news.is_none(), self.news.api_key_env.clone()),
                ]
                .into_iter()
                .filter_map(|(missing, name)| missing.then_some(name))
                .collect();
                Err(ConfigError::MissingCredentials(missing))
            }
        }
    }

    /// Price table: built-in defaults overlaid with `[pricing]`.
    pub fn price_table(&self) -> crate::cost::PriceTable {
        crate::cost::PriceTable::default().with_overrides(&self.pricing)
    }
}

fn resolve_key<F>(explicit: Option<&str>, env_var: &str, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = explicit {
        let key = expand_env_vars(key);
        if !key.trim().is_empty() {
            return Some(key);
        }
    }
    lookup(env_var).filter(|k| !k.trim().is_empty())
}

fn parse_override<T: std::str::FromStr>(var: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: raw.to_string(),
    })
}

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern"));

/// Expand environment variables in a string.
///
/// Supports ${VAR_NAME} syntax.
/// If the variable is not set, the placeholder is left unchanged.
pub fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();

    for cap in ENV_VAR_PATTERN.captures_iter(s) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing API key for '{service}': set {env_var} env var or api_key in config")]
    MissingApiKey { service: String, env_var: String },

    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_match_reference_quotas() {
        let config = Config::default();
        let openai = config.provider_settings(ProviderId::OpenAi);
        let cohere = config.provider_settings(ProviderId::Cohere);

        assert_eq!(openai.model, "gpt-4o-mini");
        assert_eq!(openai.requests_per_minute, 500);
        assert_eq!(cohere.model, "command-r7b-12-2024");
        assert_eq!(cohere.requests_per_minute, 50);
        assert_eq!(config.news.requests_per_minute, 100);
        assert_eq!(config.budget.daily_usd, 5.0);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.pipeline.max_concurrent, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_provider_defaults() {
        let config: Config = toml::from_str(
            r#"
            [openai]
            model = "gpt-4o"

            [budget]
            daily_usd = 1.5

            [pricing."my-model"]
            input_per_1m = 1.0
            output_per_1m = 2.0
            "#,
        )
        .unwrap();

        let openai = config.provider_settings(ProviderId::OpenAi);
        assert_eq!(openai.model, "gpt-4o");
        assert_eq!(openai.base_url, "https://api.openai.com/v1");
        assert_eq!(openai.requests_per_minute, 500);
        assert_eq!(config.budget.daily_usd, 1.5);
        assert_eq!(config.pricing["my-model"].output_per_1m, 2.0);
        assert_eq!(config.pipeline.content_chars, 500);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[("DAILY_BUDGET", "12.5"), ("REQUEST_TIMEOUT", "45")]))
            .unwrap();
        assert_eq!(config.budget.daily_usd, 12.5);
        assert_eq!(config.http.timeout_secs, 45);

        let err = config
            .apply_overrides(env(&[("DAILY_BUDGET", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn test_missing_credentials_are_reported_together() {
        let config = Config::default();
        let err = config
            .resolve_api_keys_with(env(&[("COHERE_API_KEY", "co-key")]))
            .unwrap_err();

        match err {
            ConfigError::MissingCredentials(missing) => {
                assert_eq!(missing, vec!["OPENAI_API_KEY", "NEWS_API_KEY"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_explicit_key_wins_over_environment() {
        let mut config = Config::default();
        config.openai.api_key = Some("sk-inline".to_string());
        let keys = config
            .resolve_api_keys_with(env(&[
                ("OPENAI_API_KEY", "sk-env"),
                ("COHERE_API_KEY", "co"),
                ("NEWS_API_KEY", "news"),
            ]))
            .unwrap();
        assert_eq!(keys.openai, "sk-inline");
        assert_eq!(keys.news, "news");
    }

    #[test]
    fn test_validate_rejects_same_provider_for_both_roles() {
        let mut config = Config::default();
        config.pipeline.sentiment_provider = ProviderId::OpenAi;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.budget.daily_usd = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_with(&dir.path().join("absent.toml"), env(&[])).unwrap();
        assert_eq!(config.pipeline.default_category, "technology");
        assert_eq!(config.budget.daily_usd, 5.0);
        assert_eq!(config.pipeline.max_concurrent, 3);
    }
}
