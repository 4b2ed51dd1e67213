//! newsbrief - multi-provider news summarization and podcast generation.
//!
//! ## Architecture
//!
//! Every language-model call goes through the [`ProviderOrchestrator`]:
//! - **Rate limiting**: one limiter per provider (minimum spacing between calls)
//! - **Cost tracking**: one shared ledger, priced per million tokens
//! - **Budget ceiling**: no call starts once the daily budget is spent
//! - **Fallback**: a failed primary call is retried once on the other provider
//!
//! ## Pipelines
//!
//! - **News**: Fetch headlines → Summarize (with fallback) → Sentiment → Report
//! - **Podcast**: Text/URL/PDF → Clean → Chunk → Script → Speech → Audio file

pub mod client;
pub mod cost;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod podcast;

// Re-exports for convenience
pub use client::{CohereClient, NewsClient, OpenAiClient, RateLimiter, TokenCounter};
pub use cost::{CostSummary, CostTracker, PriceTable};
pub use models::{ApiKeys, Article, BriefError, Config, ProviderId, Result, SummaryResult};
pub use orchestrator::{FallbackAnswer, ProviderOrchestrator};
pub use pipeline::{ArticleSummarizer, BatchMode, BatchOutcome, BatchRunner, render_report};
pub use podcast::{PodcastEpisode, PodcastStudio, Voice};
