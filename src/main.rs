//! newsbrief CLI - news summaries and podcast generation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use newsbrief::{
    ArticleSummarizer, BatchMode, BatchRunner, Config, NewsClient, OpenAiClient, PodcastStudio,
    ProviderId, ProviderOrchestrator, TokenCounter, Voice, render_report,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Articles processed when the requested count is not a number.
const DEFAULT_ARTICLE_COUNT: usize = 3;
const MAX_ARTICLE_COUNT: usize = 10;

#[derive(Parser)]
#[command(name = "newsbrief")]
#[command(version)]
#[command(about = "Multi-provider news summarizer and podcast studio")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "newsbrief.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize top headlines with sentiment analysis
    News {
        /// News category (technology/business/health/general)
        #[arg(long)]
        category: Option<String>,

        /// Number of articles to process (1-10)
        #[arg(long)]
        count: Option<String>,

        /// Process articles concurrently
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        concurrent: Option<bool>,
    },

    /// Turn text, a URL or a PDF into a short podcast
    Podcast {
        /// Text or URL to convert
        input: Option<String>,

        /// PDF file to convert (takes precedence over input)
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Voice (alloy, echo, fable, onyx, nova, shimmer)
        #[arg(long)]
        voice: Option<String>,
    },

    /// Validate configuration and credentials
    Validate,

    /// Show example configuration
    Example,
}

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

const EXAMPLE_CONFIG: &str = r#"# newsbrief configuration file

[openai]
# API key (defaults to the OPENAI_API_KEY env var)
# api_key = "${OPENAI_API_KEY}"
base_url = "https://api.openai.com/v1"
model = "gpt-4o-mini"
requests_per_minute = 500

[cohere]
# api_key_env = "COHERE_API_KEY"
base_url = "https://api.cohere.com/v2"
model = "command-r7b-12-2024"
requests_per_minute = 50

[news]
# api_key_env = "NEWS_API_KEY"
base_url = "https://newsapi.org/v2"
requests_per_minute = 100
country = "us"

[budget]
daily_usd = 5.0          # or DAILY_BUDGET

[http]
timeout_secs = 30        # or REQUEST_TIMEOUT

[pipeline]
summary_provider = "openai"
sentiment_provider = "cohere"
max_concurrent = 3       # or MAX_CONCURRENT
content_chars = 500
default_category = "technology"

[podcast]
output_dir = "recordings"
file_prefix = "podcast"
voice = "alloy"
script_model = "gpt-3.5-turbo"
tts_model = "tts-1"
chunk_chars = 2000
fetch_timeout_secs = 10

[pricing]
# USD per 1M tokens; overrides the built-in table
"gpt-4o-mini" = { input_per_1m = 0.15, output_per_1m = 0.60 }
"#;

/// Requested article count: clamped to 1-10, anything unparsable means 3.
fn parse_article_count(input: &str) -> usize {
    match input.trim().parse::<i64>() {
        Ok(n) => n.clamp(1, MAX_ARTICLE_COUNT as i64) as usize,
        Err(_) => DEFAULT_ARTICLE_COUNT,
    }
}

/// Requested category, or `default` when left empty.
fn parse_category(input: &str, default: &str) -> String {
    match input.trim() {
        "" => default.to_string(),
        category => category.to_lowercase(),
    }
}

fn parse_yes(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("y")
}

fn prompt(question: &str) -> Result<String> {
    print!("{question}");
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line)
}

fn load_config(cli: &Cli) -> Result<Config> {
    Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing articles in flight");
            token.cancel();
        }
    });
}

async fn run_news(
    config: Config,
    category: Option<String>,
    count: Option<String>,
    concurrent: Option<bool>,
) -> Result<()> {
    let keys = config
        .resolve_api_keys()
        .context("Failed to resolve API keys")?;

    println!("{}", "=".repeat(80));
    println!("NEWS SUMMARIZER - Multi-Provider Edition");
    println!("{}", "=".repeat(80));

    let category = match category {
        Some(c) => parse_category(&c, &config.pipeline.default_category),
        None => parse_category(
            &prompt("\nEnter news category (technology/business/health/general): ")?,
            &config.pipeline.default_category,
        ),
    };
    let count = match count {
        Some(c) => parse_article_count(&c),
        None => parse_article_count(&prompt("How many articles to process? (1-10): ")?),
    };
    let concurrent = match concurrent {
        Some(c) => c,
        None => parse_yes(&prompt("Use async processing? (y/n): ")?),
    };

    // must be live before the first network call
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let tokens = Arc::new(TokenCounter::new());
    let orchestrator = Arc::new(
        ProviderOrchestrator::from_config(&config, &keys, tokens)
            .context("Failed to create provider clients")?,
    );
    let news = NewsClient::new(keys.news.clone(), &config.news, config.http.timeout_secs)
        .context("Failed to create news client")?;

    println!("\nFetching {count} articles from category: {category}");
    let Some(articles) = cancel
        .run_until_cancelled(news.fetch_top_headlines(&category, count))
        .await
    else {
        println!("\n\nOperation cancelled by user.");
        return Ok(());
    };
    if articles.is_empty() {
        println!("No articles fetched. Check your News API key.");
        return Ok(());
    }

    let summarizer = ArticleSummarizer::new(
        Arc::clone(&orchestrator),
        config.pipeline.summary_provider,
        config.pipeline.sentiment_provider,
    )
    .with_content_chars(config.pipeline.content_chars);

    let runner = BatchRunner::new(Arc::new(summarizer))
        .with_cancellation(cancel)
        .with_progress(true);

    let mode = if concurrent {
        println!("\nProcessing {} articles concurrently...", articles.len());
        BatchMode::Concurrent {
            max_concurrent: config.pipeline.max_concurrent,
        }
    } else {
        println!("\nProcessing {} articles...", articles.len());
        BatchMode::Serial
    };

    let outcome = runner.run(articles, mode).await;

    let tracker = orchestrator.cost_tracker();
    println!(
        "\n{}",
        render_report(&outcome, &tracker.summary(), &tracker.by_provider())
    );

    for (provider, stats) in orchestrator.rate_limiter_stats() {
        debug!(
            provider = provider.label(),
            requests = stats.total_requests,
            waited_secs = stats.total_wait_secs,
            "Rate limiter"
        );
    }

    if outcome.cancelled {
        println!("\n\nOperation cancelled by user.");
    } else {
        println!("\n✓ Processing complete!");
    }
    Ok(())
}

async fn run_podcast(
    config: Config,
    input: Option<String>,
    pdf: Option<PathBuf>,
    voice: Option<String>,
) -> Result<()> {
    let voice: Voice = voice
        .as_deref()
        .unwrap_or(&config.podcast.voice)
        .parse()
        .context("Invalid voice")?;

    let input = match (input, &pdf) {
        (Some(input), _) => input,
        (None, Some(_)) => String::new(),
        (None, None) => prompt("Paste text or a URL: ")?,
    };

    let api_key = config
        .resolve_provider_key(ProviderId::OpenAi)
        .context("Failed to resolve API key")?;
    let settings = config.provider_settings(ProviderId::OpenAi);
    let client = OpenAiClient::new(
        api_key,
        settings.base_url,
        config.http.timeout_secs,
        Arc::new(TokenCounter::new()),
    )
    .context("Failed to create OpenAI client")?;

    let studio = PodcastStudio::new(Arc::new(client), &config.podcast)
        .context("Failed to create podcast studio")?;

    let episode = studio
        .create(&input, pdf.as_deref(), voice)
        .await
        .context("Podcast generation failed")?;

    println!("\n=== Podcast Script ({} chunks) ===\n", episode.chunks);
    println!("{}", episode.script);
    match &episode.audio_path {
        Some(path) => println!("\nAudio:  {}", path.display()),
        None => println!("\nAudio generation failed; script only."),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match &cli.command {
        Commands::Example => {
            println!("{EXAMPLE_CONFIG}");
        }

        Commands::Validate => {
            let config = load_config(&cli)?;
            let keys = config
                .resolve_api_keys()
                .context("Failed to resolve API keys")?;
            debug!(?keys, "Credentials resolved");

            info!("Configuration is valid");
            for id in ProviderId::ALL {
                let settings = config.provider_settings(id);
                info!(
                    "  {}: {} at {} ({} rpm)",
                    id.label(),
                    settings.model,
                    settings.base_url,
                    settings.requests_per_minute
                );
            }
            info!("  Daily budget: ${:.2}", config.budget.daily_usd);
            info!(
                "  Summary: {}, sentiment: {}, max concurrent: {}",
                config.pipeline.summary_provider.label(),
                config.pipeline.sentiment_provider.label(),
                config.pipeline.max_concurrent
            );
        }

        Commands::News {
            category,
            count,
            concurrent,
        } => {
            let config = load_config(&cli)?;
            run_news(config, category.clone(), count.clone(), *concurrent).await?;
        }

        Commands::Podcast { input, pdf, voice } => {
            let config = load_config(&cli)?;
            run_podcast(config, input.clone(), pdf.clone(), voice.clone()).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_interrupt_during_fetch_returns_without_articles() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let fetched = cancel
            .run_until_cancelled(std::future::pending::<Vec<newsbrief::Article>>())
            .await;
        assert!(fetched.is_none());
    }

    #[test]
    fn test_article_count_is_clamped() {
        assert_eq!(parse_article_count("5"), 5);
        assert_eq!(parse_article_count(" 10 "), 10);
        assert_eq!(parse_article_count("0"), 1);
        assert_eq!(parse_article_count("-4"), 1);
        assert_eq!(parse_article_count("25"), 10);
    }

    #[test]
    fn test_invalid_article_count_defaults_to_three() {
        assert_eq!(parse_article_count(""), 3);
        assert_eq!(parse_article_count("five"), 3);
        assert_eq!(parse_article_count("2.5"), 3);
    }

    #[test]
    fn test_empty_category_uses_default() {
        assert_eq!(parse_category("  \n", "technology"), "technology");
        assert_eq!(parse_category("Business\n", "technology"), "business");
    }

    #[test]
    fn test_parse_yes() {
        assert!(parse_yes("y\n"));
        assert!(parse_yes(" Y "));
        assert!(!parse_yes("yes"));
        assert!(!parse_yes(""));
    }

    #[test]
    fn test_example_config_parses_and_validates() {
        let config: Config = toml::from_str(EXAMPLE_CONFIG).unwrap();
        config.validate().unwrap();
        assert_eq!(config.podcast.chunk_chars, 2000);
        assert_eq!(config.pipeline.summary_provider, ProviderId::OpenAi);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "newsbrief",
            "news",
            "--category",
            "health",
            "--count",
            "4",
            "--concurrent",
        ])
        .unwrap();
        match cli.command {
            Commands::News {
                category,
                count,
                concurrent,
            } => {
                assert_eq!(category.as_deref(), Some("health"));
                assert_eq!(count.as_deref(), Some("4"));
                assert_eq!(concurrent, Some(true));
            }
            _ => panic!("expected news command"),
        }
    }
}
