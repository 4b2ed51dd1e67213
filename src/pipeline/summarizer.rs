//! Per-article summarization.
//!
//! Summary first (with fallback), then sentiment on the summary text.
//! A summary failure is fatal for the article; a sentiment failure only
//! degrades the result, unless it is a budget stop.

use crate::models::{Article, BriefError, ProviderId, Result, SummaryResult};
use crate::orchestrator::ProviderOrchestrator;
use std::sync::Arc;
use tracing::{info, warn};

/// Placeholder stored when sentiment analysis is unavailable.
pub const SENTIMENT_UNAVAILABLE: &str = "Unable to analyze sentiment";

/// Default number of content characters sent to the model.
pub const DEFAULT_CONTENT_CHARS: usize = 500;

/// Article text block shared by the prompts.
pub fn article_text(article: &Article, content_chars: usize) -> String {
    let content: String = article.content.chars().take(content_chars).collect();
    format!(
        "Title: {}\nDescription: {}\nContent: {}",
        article.title, article.description, content
    )
}

pub fn summary_prompt(article_text: &str) -> String {
    format!("Summarize this news article in 2-3 sentences:\n\n{article_text}")
}

pub fn sentiment_prompt(summary: &str) -> String {
    format!(
        "Analyze the sentiment of this text: \"{summary}\"\n\n\
         Provide:\n\
         - Overall sentiment (positive/negative/neutral)\n\
         - Confidence (0-100%)\n\
         - Key emotional tone\n\n\
         Be concise (2-3 sentences)."
    )
}

/// Produces a [`SummaryResult`] for one article.
pub struct ArticleSummarizer {
    orchestrator: Arc<ProviderOrchestrator>,
    summary_provider: ProviderId,
    sentiment_provider: ProviderId,
    content_chars: usize,
}

impl ArticleSummarizer {
    pub fn new(
        orchestrator: Arc<ProviderOrchestrator>,
        summary_provider: ProviderId,
        sentiment_provider: ProviderId,
    ) -> Self {
        Self {
            orchestrator,
            summary_provider,
            sentiment_provider,
            content_chars: DEFAULT_CONTENT_CHARS,
        }
    }

    /// Override how much article content goes into the prompt.
    pub fn with_content_chars(mut self, content_chars: usize) -> Self {
        self.content_chars = content_chars;
        self
    }

    pub fn orchestrator(&self) -> &Arc<ProviderOrchestrator> {
        &self.orchestrator
    }

    /// Summarize one article.
    ///
    /// Errors are wrapped in [`BriefError::ArticleProcessing`] with the title.
    pub async fn summarize(&self, article: &Article) -> Result<SummaryResult> {
        let short_title: String = article.title.chars().take(60).collect();
        info!(title = %short_title, "Processing article");

        self.try_summarize(article)
            .await
            .map_err(|e| BriefError::article(&article.title, e))
    }

    async fn try_summarize(&self, article: &Article) -> Result<SummaryResult> {
        let text = article_text(article, self.content_chars);

        let answer = self
            .orchestrator
            .ask_with_fallback(&summary_prompt(&text), self.summary_provider)
            .await?;
        info!(provider = answer.provider_used.label(), "Summary generated");

        let sentiment = match self
            .orchestrator
            .ask(self.sentiment_provider, &sentiment_prompt(&answer.text))
            .await
        {
            Ok(sentiment) => {
                info!(provider = self.sentiment_provider.label(), "Sentiment analyzed");
                sentiment
            }
            Err(e) if e.is_budget_exceeded() => return Err(e),
            Err(e) => {
                warn!(
                    provider = self.sentiment_provider.label(),
                    error = %e,
                    "Sentiment analysis failed"
                );
                SENTIMENT_UNAVAILABLE.to_string()
            }
        };

        Ok(SummaryResult::from_article(
            article,
            answer.text,
            sentiment,
            answer.provider_used,
        ))
    }
}
