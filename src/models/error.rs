//! Error types for newsbrief.
//!
//! Failure taxonomy:
//! - Per-call: a provider call failed (triggers fallback one level up)
//! - Per-ask: every configured provider failed for one logical request
//! - Per-run: the budget ceiling was crossed (no further calls)
//! - Per-article: one article's pipeline could not complete (batch continues)

use super::ProviderId;
use thiserror::Error;

/// Top-level error type for newsbrief.
#[derive(Debug, Error)]
pub enum BriefError {
    // ═══════════════════════════════════════════════════════════════════
    // PROVIDER: one external model call or one logical ask
    // ═══════════════════════════════════════════════════════════════════
    #[error("{provider} call failed: {source}")]
    ProviderCall {
        provider: ProviderId,
        #[source]
        source: ProviderError,
    },

    #[error(
        "All providers failed: {primary} ({primary_error}); {secondary} ({secondary_error})"
    )]
    AllProvidersFailed {
        primary: ProviderId,
        primary_error: ProviderError,
        secondary: ProviderId,
        secondary_error: ProviderError,
    },

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(ProviderId),

    #[error("Daily budget of ${budget:.2} exceeded! Current: ${spent:.2}")]
    BudgetExceeded { budget: f64, spent: f64 },

    // ═══════════════════════════════════════════════════════════════════
    // PIPELINE: article and input level
    // ═══════════════════════════════════════════════════════════════════
    #[error("Failed to process article '{title}': {source}")]
    ArticleProcessing {
        title: String,
        #[source]
        source: Box<BriefError>,
    },

    #[error("News source unavailable: {0}")]
    SourceFetch(String),

    #[error("No content found to process")]
    EmptyInput,

    #[error("Extraction failed: {0}")]
    Extraction(String),

    // ═══════════════════════════════════════════════════════════════════
    // INFRASTRUCTURE
    // ═══════════════════════════════════════════════════════════════════
    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors from a single provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e)
        }
    }
}

impl BriefError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap a failure as fatal to a single article.
    pub fn article(title: impl Into<String>, source: BriefError) -> Self {
        Self::ArticleProcessing {
            title: title.into(),
            source: Box::new(source),
        }
    }

    /// True if this error (or the article failure wrapping it) is a budget stop.
    pub fn is_budget_exceeded(&self) -> bool {
        match self {
            Self::BudgetExceeded { .. } => true,
            Self::ArticleProcessing { source, .. } => source.is_budget_exceeded(),
            _ => false,
        }
    }

    /// True if a secondary provider may be tried after this error.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(self, Self::ProviderCall { .. })
    }
}

/// Result type alias for newsbrief.
pub type Result<T> = std::result::Result<T, BriefError>;
