//! Article, provider and result types for newsbrief.
//!
//! These types represent the core data flow through the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an external language-model service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// OpenAI-compatible chat completions endpoint
    OpenAi,
    /// Cohere v2 chat endpoint
    Cohere,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::OpenAi, ProviderId::Cohere];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Cohere => "cohere",
        }
    }

    /// Human-readable label used in log lines and the report.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "OpenAI",
            ProviderId::Cohere => "Cohere",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A news article as fetched from the news source.
///
/// Never mutated after the fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub content: String,
    pub url: String,
    /// Source name ("Unknown" when the feed omits it)
    pub source: String,
    /// Publication timestamp as reported by the feed
    pub published_at: String,
}

/// Summary and sentiment for one article.
///
/// Produced once per article; terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub title: String,
    pub source: String,
    pub url: String,
    pub published_at: String,

    /// Summary text
    pub summary: String,

    /// Sentiment analysis (or the placeholder when it could not be produced)
    pub sentiment: String,

    /// Provider that produced the summary (differs from the configured
    /// summary provider when fallback kicked in)
    pub summary_provider: ProviderId,
}

impl SummaryResult {
    /// Build a result, copying the article fields through.
    pub fn from_article(
        article: &Article,
        summary: String,
        sentiment: String,
        summary_provider: ProviderId,
    ) -> Self {
        Self {
            title: article.title.clone(),
            source: article.source.clone(),
            url: article.url.clone(),
            published_at: article.published_at.clone(),
            summary,
            sentiment,
            summary_provider,
        }
    }
}
