//! Batch processing of articles.
//!
//! Serial or bounded-concurrent. A failed article is dropped from the results
//! and recorded; the batch continues. Once the budget stop is observed, or the
//! run is cancelled, no further article is started. Articles already in flight
//! are allowed to finish.

use crate::models::{Article, BriefError, SummaryResult};
use crate::pipeline::ArticleSummarizer;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How articles are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// One article at a time, in input order.
    Serial,
    /// Up to `max_concurrent` articles in flight; results in completion order.
    Concurrent { max_concurrent: usize },
}

/// An article that could not be processed.
#[derive(Debug)]
pub struct ArticleFailure {
    pub title: String,
    pub error: BriefError,
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<SummaryResult>,
    pub failures: Vec<ArticleFailure>,
    /// Articles never started because of a budget stop or cancellation
    pub skipped: usize,
    pub budget_exhausted: bool,
    pub cancelled: bool,
}

impl BatchOutcome {
    /// Number of articles handed to the batch.
    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len() + self.skipped
    }

    fn record(&mut self, title: String, result: crate::models::Result<SummaryResult>) {
        match result {
            Ok(summary) => self.results.push(summary),
            Err(error) => {
                if error.is_budget_exceeded() {
                    self.budget_exhausted = true;
                }
                warn!(title = %title, error = %error, "Failed to process article");
                self.failures.push(ArticleFailure { title, error });
            }
        }
    }
}

/// Outcome of one spawned article task.
enum TaskResult {
    Done(String, crate::models::Result<SummaryResult>),
    Skipped { cancelled: bool },
}

/// Runs the summarizer over a batch of articles.
pub struct BatchRunner {
    summarizer: Arc<ArticleSummarizer>,
    cancel: CancellationToken,
    show_progress: bool,
}

impl BatchRunner {
    pub fn new(summarizer: Arc<ArticleSummarizer>) -> Self {
        Self {
            summarizer,
            cancel: CancellationToken::new(),
            show_progress: false,
        }
    }

    /// Use an external cancellation token (e.g. wired to Ctrl-C).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Render a progress bar on stderr.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        pb.set_style(style);
        pb
    }

    /// Process every article according to `mode`.
    pub async fn run(&self, articles: Vec<Article>, mode: BatchMode) -> BatchOutcome {
        info!(articles = articles.len(), mode = ?mode, "Starting batch");
        let pb = self.progress_bar(articles.len());

        let outcome = match mode {
            BatchMode::Serial => self.run_serial(articles, &pb).await,
            BatchMode::Concurrent { max_concurrent } => {
                self.run_concurrent(articles, max_concurrent, &pb).await
            }
        };

        pb.finish_with_message(format!(
            "Done! {} summarized, {} failed",
            outcome.results.len(),
            outcome.failures.len()
        ));
        info!(
            summarized = outcome.results.len(),
            failed = outcome.failures.len(),
            skipped = outcome.skipped,
            budget_exhausted = outcome.budget_exhausted,
            cancelled = outcome.cancelled,
            "Batch complete"
        );
        outcome
    }

    async fn run_serial(&self, articles: Vec<Article>, pb: &ProgressBar) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let total = articles.len();

        for (index, article) in articles.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                outcome.cancelled = true;
            }
            if outcome.cancelled || outcome.budget_exhausted {
                outcome.skipped = total - index;
                break;
            }

            let result = self.summarizer.summarize(&article).await;
            outcome.record(article.title, result);
            pb.inc(1);
        }

        outcome
    }

    async fn run_concurrent(
        &self,
        articles: Vec<Article>,
        max_concurrent: usize,
        pb: &ProgressBar,
    ) -> BatchOutcome {
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let budget_hit = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();

        for article in articles {
            let semaphore = Arc::clone(&semaphore);
            let budget_hit = Arc::clone(&budget_hit);
            let summarizer = Arc::clone(&self.summarizer);
            let cancel = self.cancel.clone();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return TaskResult::Skipped { cancelled: false };
                };
                if cancel.is_cancelled() {
                    return TaskResult::Skipped { cancelled: true };
                }
                if budget_hit.load(Ordering::SeqCst) {
                    return TaskResult::Skipped { cancelled: false };
                }

                let result = summarizer.summarize(&article).await;
                if matches!(&result, Err(e) if e.is_budget_exceeded()) {
                    budget_hit.store(true, Ordering::SeqCst);
                }
                TaskResult::Done(article.title, result)
            });
        }

        let mut outcome = BatchOutcome::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(TaskResult::Done(title, result)) => {
                    outcome.record(title, result);
                    pb.inc(1);
                }
                Ok(TaskResult::Skipped { cancelled }) => {
                    outcome.skipped += 1;
                    outcome.cancelled |= cancelled;
                }
                Err(e) => {
                    warn!(error = %e, "Task panicked");
                    outcome.failures.push(ArticleFailure {
                        title: String::new(),
                        error: BriefError::Internal(format!("article task failed: {e}")),
                    });
                }
            }
        }

        outcome.budget_exhausted |= budget_hit.load(Ordering::SeqCst);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RateLimiter;
    use crate::client::mock::{InFlightGauge, MockProvider};
    use crate::cost::{ModelPrice, PriceTable};
    use crate::models::ProviderId;
    use crate::orchestrator::ProviderOrchestrator;
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn articles(n: usize) -> Vec<Article> {
        (1..=n)
            .map(|i| Article {
                title: format!("Article {i}"),
                description: format!("Description {i}"),
                content: format!("Content {i}"),
                url: format!("https://example.com/{i}"),
                source: "Example".to_string(),
                published_at: "2026-01-19T10:00:00Z".to_string(),
            })
            .collect()
    }

    fn runner(openai: &MockProvider, cohere: &MockProvider, budget: f64) -> BatchRunner {
        let prices = PriceTable::new([
            ("gpt-x".to_string(), ModelPrice::new(0.15, 0.60)),
            ("co-x".to_string(), ModelPrice::new(0.0375, 0.15)),
        ]);
        let orch = ProviderOrchestrator::with_prices(prices, budget)
            .with_provider(Arc::new(openai.clone()), "gpt-x", RateLimiter::per_minute("openai", 0))
            .with_provider(Arc::new(cohere.clone()), "co-x", RateLimiter::per_minute("cohere", 0));
        let summarizer =
            ArticleSummarizer::new(Arc::new(orch), ProviderId::OpenAi, ProviderId::Cohere);
        BatchRunner::new(Arc::new(summarizer))
    }

    fn failing_third() -> (MockProvider, MockProvider) {
        (
            MockProvider::new(ProviderId::OpenAi, "Summary.").failing_when("Article 3"),
            MockProvider::new(ProviderId::Cohere, "Neutral.").failing_when("Article 3"),
        )
    }

    #[tokio::test]
    async fn test_serial_failed_article_is_dropped() {
        let (openai, cohere) = failing_third();
        let outcome = runner(&openai, &cohere, 5.0)
            .run(articles(5), BatchMode::Serial)
            .await;

        assert_eq!(outcome.results.len(), 4);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].title, "Article 3");
        assert!(!outcome.budget_exhausted);
        assert!(!outcome.cancelled);

        // serial keeps input order
        let titles: Vec<_> = outcome.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Article 1", "Article 2", "Article 4", "Article 5"]);
    }

    #[tokio::test]
    async fn test_concurrent_failed_article_is_dropped() {
        let (openai, cohere) = failing_third();
        let outcome = runner(&openai, &cohere, 5.0)
            .run(articles(5), BatchMode::Concurrent { max_concurrent: 3 })
            .await;

        assert_eq!(outcome.results.len(), 4);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.total(), 5);

        let titles: BTreeSet<_> = outcome.results.iter().map(|r| r.title.clone()).collect();
        assert!(!titles.contains("Article 3"));
    }

    #[tokio::test]
    async fn test_concurrency_cap_bounds_articles_in_flight() {
        // each article has at most one provider call open at a time, so a
        // gauge shared by both providers counts articles in flight
        let gauge = Arc::new(InFlightGauge::default());
        let delay = Duration::from_millis(20);
        let openai = MockProvider::new(ProviderId::OpenAi, "Summary.")
            .with_delay(delay, Arc::clone(&gauge));
        let cohere = MockProvider::new(ProviderId::Cohere, "Neutral.")
            .with_delay(delay, Arc::clone(&gauge));

        let outcome = runner(&openai, &cohere, 5.0)
            .run(articles(6), BatchMode::Concurrent { max_concurrent: 2 })
            .await;

        assert_eq!(outcome.results.len(), 6);
        assert_eq!(openai.call_count(), 6);
        assert_eq!(cohere.call_count(), 6);
        assert_eq!(gauge.peak(), 2);
    }

    #[tokio::test]
    async fn test_serial_stops_after_budget_stop() {
        let openai =
            MockProvider::new(ProviderId::OpenAi, "Summary.").with_tokens(1_000_000, 1_000_000);
        let cohere = MockProvider::new(ProviderId::Cohere, "Neutral.");
        let outcome = runner(&openai, &cohere, 0.5)
            .run(articles(5), BatchMode::Serial)
            .await;

        assert!(outcome.budget_exhausted);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.skipped, 4);
        assert_eq!(openai.call_count(), 1);
        assert_eq!(cohere.call_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_stops_after_budget_stop() {
        let openai =
            MockProvider::new(ProviderId::OpenAi, "Summary.").with_tokens(1_000_000, 1_000_000);
        let cohere = MockProvider::new(ProviderId::Cohere, "Neutral.");
        let outcome = runner(&openai, &cohere, 0.5)
            .run(articles(4), BatchMode::Concurrent { max_concurrent: 1 })
            .await;

        assert!(outcome.budget_exhausted);
        assert_eq!(outcome.results.len(), 0);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.skipped, 3);
        assert_eq!(openai.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_processes_nothing() {
        let openai = MockProvider::new(ProviderId::OpenAi, "Summary.");
        let cohere = MockProvider::new(ProviderId::Cohere, "Neutral.");
        let token = CancellationToken::new();
        token.cancel();

        for mode in [BatchMode::Serial, BatchMode::Concurrent { max_concurrent: 2 }] {
            let outcome = runner(&openai, &cohere, 5.0)
                .with_cancellation(token.clone())
                .run(articles(3), mode)
                .await;
            assert!(outcome.cancelled);
            assert!(outcome.results.is_empty());
            assert_eq!(outcome.skipped, 3);
        }
        assert_eq!(openai.call_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_treated_as_one() {
        let openai = MockProvider::new(ProviderId::OpenAi, "Summary.");
        let cohere = MockProvider::new(ProviderId::Cohere, "Neutral.");
        let outcome = runner(&openai, &cohere, 5.0)
            .run(articles(2), BatchMode::Concurrent { max_concurrent: 0 })
            .await;
        assert_eq!(outcome.results.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let openai = MockProvider::new(ProviderId::OpenAi, "Summary.");
        let cohere = MockProvider::new(ProviderId::Cohere, "Neutral.");
        let outcome = runner(&openai, &cohere, 5.0)
            .run(Vec::new(), BatchMode::Serial)
            .await;
        assert_eq!(outcome.total(), 0);
    }
}
