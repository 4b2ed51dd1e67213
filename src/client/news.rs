//! NewsAPI headline reader.
//!
//! A failed fetch never propagates: the caller gets an empty list and decides
//! whether "nothing to process" is fatal.

use crate::client::RateLimiter;
use crate::models::{Article, BriefError, NewsConfig, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: Option<RawSource>,
    #[serde(default)]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    name: Option<String>,
}

impl From<RawArticle> for Article {
    fn from(raw: RawArticle) -> Self {
        Article {
            title: raw.title.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            content: raw.content.unwrap_or_default(),
            url: raw.url.unwrap_or_default(),
            source: raw
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            published_at: raw.published_at.unwrap_or_default(),
        }
    }
}

/// Parse a `top-headlines` response body.
pub fn parse_headlines(body: &str) -> Result<Vec<Article>> {
    let response: HeadlinesResponse = serde_json::from_str(body)
        .map_err(|e| BriefError::SourceFetch(format!("malformed response: {e}")))?;

    if response.status != "ok" {
        return Err(BriefError::SourceFetch(format!(
            "News API error: {}",
            response.message.unwrap_or_else(|| response.status.clone())
        )));
    }

    Ok(response.articles.into_iter().map(Article::from).collect())
}

/// Headline reader for NewsAPI.
pub struct NewsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    country: String,
    rate_limiter: RateLimiter,
}

impl NewsClient {
    pub fn new(api_key: impl Into<String>, config: &NewsConfig, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(BriefError::Network)?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            country: config.country.clone(),
            rate_limiter: RateLimiter::per_minute("news", config.requests_per_minute),
        })
    }

    /// Fetch top headlines for a category.
    ///
    /// Returns an empty list on any failure.
    pub async fn fetch_top_headlines(&self, category: &str, max_articles: usize) -> Vec<Article> {
        match self.try_fetch(category, max_articles).await {
            Ok(articles) => {
                info!(count = articles.len(), category = category, "Fetched articles from News API");
                articles
            }
            Err(e) => {
                warn!(error = %e, category = category, "Error fetching news");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, category: &str, max_articles: usize) -> Result<Vec<Article>> {
        self.rate_limiter.acquire().await;

        let page_size = max_articles.to_string();
        let response = self
            .client
            .get(format!("{}/top-headlines", self.base_url))
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("category", category),
                ("country", self.country.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| BriefError::SourceFetch(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BriefError::SourceFetch(e.to_string()))?;

        if !status.is_success() {
            return Err(BriefError::SourceFetch(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let mut articles = parse_headlines(&body)?;
        articles.truncate(max_articles);
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headlines() {
        let body = r#"{
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": {"id": null, "name": "Test Source"},
                "author": "someone",
                "title": "Test Article",
                "description": "Test description",
                "url": "https://example.com",
                "publishedAt": "2026-01-19T10:00:00Z",
                "content": "Test content"
            }]
        }"#;

        let articles = parse_headlines(body).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Test Article");
        assert_eq!(articles[0].source, "Test Source");
        assert_eq!(articles[0].published_at, "2026-01-19T10:00:00Z");
    }

    #[test]
    fn test_null_fields_become_empty() {
        let body = r#"{"status": "ok", "articles": [{"title": "Only title", "description": null, "content": null}]}"#;
        let articles = parse_headlines(body).unwrap();
        assert_eq!(articles[0].description, "");
        assert_eq!(articles[0].content, "");
        assert_eq!(articles[0].source, "Unknown");
    }

    #[test]
    fn test_error_status_and_garbage_are_source_failures() {
        let err = parse_headlines(r#"{"status": "error", "code": "apiKeyInvalid", "message": "bad key"}"#)
            .unwrap_err();
        assert!(matches!(err, BriefError::SourceFetch(ref m) if m.contains("bad key")));

        assert!(matches!(
            parse_headlines("not json"),
            Err(BriefError::SourceFetch(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_source_yields_empty_list() {
        let config = NewsConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            requests_per_minute: 0,
            ..NewsConfig::default()
        };
        let client = NewsClient::new("key", &config, 2).unwrap();
        assert!(client.fetch_top_headlines("technology", 3).await.is_empty());
    }
}
