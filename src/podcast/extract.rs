//! Input extraction and cleaning for podcast generation.
//!
//! Input is one of: a PDF file, a URL, or raw text. Everything ends up as
//! one line of plain ASCII-ish prose.

use crate::models::{BriefError, Result};
use regex::Regex;
use reqwest::header::USER_AGENT;
use scraper::{Html, Node};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static pattern"));
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s.,!?-]").expect("static pattern"));
static PUNCT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]{2,}").expect("static pattern"));

/// True if the input should be fetched rather than used as text.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Visible text of an HTML document: scripts, styles and comments dropped,
/// entities decoded, one space between phrases.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let text = document
        .root_element()
        .descendants()
        .filter(|node| {
            !node.ancestors().any(|parent| {
                parent
                    .value()
                    .as_element()
                    .is_some_and(|e| matches!(e.name(), "script" | "style"))
            })
        })
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    text.lines()
        .flat_map(|line| line.trim().split("  "))
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse whitespace, drop unsupported characters and squash punctuation runs.
pub fn clean_text(text: &str) -> String {
    let cleaned = WHITESPACE.replace_all(text, " ");
    let cleaned = DISALLOWED.replace_all(cleaned.trim(), "");
    PUNCT_RUN.replace_all(&cleaned, ".").into_owned()
}

/// Extract text from a PDF on a blocking thread.
pub async fn extract_pdf(path: &Path) -> Result<String> {
    let owned: PathBuf = path.to_owned();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
        .await
        .map_err(|e| BriefError::Internal(format!("PDF extraction task failed: {e}")))?
        .map_err(|e| {
            BriefError::Extraction(format!(
                "Error extracting from PDF {}: {e}",
                path.display()
            ))
        })?;

    debug!(path = %path.display(), chars = text.len(), "Extracted PDF text");
    Ok(text)
}

/// Fetches and normalizes podcast input.
pub struct InputExtractor {
    client: reqwest::Client,
}

impl InputExtractor {
    pub fn new(fetch_timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(fetch_timeout_secs))
            .build()
            .map_err(BriefError::Network)?;
        Ok(Self { client })
    }

    /// Download a page and return its visible text.
    pub async fn fetch_url(&self, url: &str) -> Result<String> {
        let extraction = |e: reqwest::Error| {
            BriefError::Extraction(format!("Error extracting from URL: {e}"))
        };

        let html = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(extraction)?
            .text()
            .await
            .map_err(extraction)?;

        Ok(html_to_text(&html))
    }

    /// Resolve the input to cleaned text.
    ///
    /// A PDF takes precedence over `text`. Fails with
    /// [`BriefError::EmptyInput`] when nothing is left after cleaning.
    pub async fn process_input(&self, text: &str, pdf: Option<&Path>) -> Result<String> {
        let raw = match pdf {
            Some(path) => {
                info!(path = %path.display(), "Extracting text from PDF");
                extract_pdf(path).await?
            }
            None if is_url(text.trim()) => {
                info!(url = text.trim(), "Extracting text from URL");
                self.fetch_url(text.trim()).await?
            }
            None => text.to_string(),
        };

        let cleaned = clean_text(&raw);
        if cleaned.trim().is_empty() {
            return Err(BriefError::EmptyInput);
        }
        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_drops_scripts_and_styles() {
        let html = r#"<html><head><style>body { color: red; }</style>
            <script type="text/javascript">var x = "<p>hidden</p>";</script></head>
            <body><h1>Title</h1><p>First &amp; second.</p><!-- note --></body></html>"#;

        let text = html_to_text(html);
        assert_eq!(text, "Title First & second.");
    }

    #[test]
    fn test_html_entities_are_decoded_before_cleaning() {
        let text = html_to_text("<p>It&#8217;s here &mdash; now &lt;3</p>");
        assert_eq!(text, "It\u{2019}s here \u{2014} now <3");
        assert_eq!(clean_text(&text), "Its here  now 3");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Hello,\n\n world!!!  "), "Hello, world.");
        assert_eq!(clean_text("Price: $5 — 50% off?!"), "Price 5  50 off.");
        assert_eq!(clean_text("well-known fact..."), "well-known fact.");
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com"));
        assert!(is_url("http://example.com"));
        assert!(!is_url("ftp://example.com"));
        assert!(!is_url("just some text"));
    }

    #[tokio::test]
    async fn test_process_plain_text() {
        let extractor = InputExtractor::new(2).unwrap();
        let text = extractor
            .process_input("Rust is   fast. Really fast!!", None)
            .await
            .unwrap();
        assert_eq!(text, "Rust is fast. Really fast.");
    }

    #[tokio::test]
    async fn test_empty_after_cleaning_is_rejected() {
        let extractor = InputExtractor::new(2).unwrap();
        assert!(matches!(
            extractor.process_input("   ", None).await,
            Err(BriefError::EmptyInput)
        ));
        assert!(matches!(
            extractor.process_input("€€€ ©", None).await,
            Err(BriefError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_url_is_extraction_error() {
        let extractor = InputExtractor::new(2).unwrap();
        let err = extractor
            .process_input("http://127.0.0.1:9/article", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BriefError::Extraction(ref m) if m.starts_with("Error extracting from URL")));
    }

    #[tokio::test]
    async fn test_missing_pdf_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pdf");
        let extractor = InputExtractor::new(2).unwrap();
        let err = extractor
            .process_input("ignored", Some(&missing))
            .await
            .unwrap_err();
        assert!(matches!(err, BriefError::Extraction(_)));
    }
}
