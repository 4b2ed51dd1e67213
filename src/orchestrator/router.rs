//! Provider orchestration.
//!
//! One rate limiter per provider, one cost tracker shared by all of them.
//! A logical request is `ask` (single provider) or `ask_with_fallback`
//! (primary, then the other configured provider on a call failure).
//!
//! Each ask runs, in order:
//! 0. budget gate (refuse once the ceiling has been reached)
//! 1. rate limiter acquire, then the budget gate again since another
//!    task may have crossed the ceiling while this one waited
//! 2. provider call
//! 3. cost record
//! 4. budget enforcement (reactive; one call can overshoot)

use crate::client::{
    CohereClient, CompletionProvider, OpenAiClient, RateLimiter, RateLimiterStats, TokenCounter,
};
use crate::cost::{CostTracker, PriceTable};
use crate::models::{ApiKeys, BriefError, Config, ProviderId, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answer to a request that may have been served by the secondary provider.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackAnswer {
    pub provider_used: ProviderId,
    pub text: String,
}

/// A configured provider: client, model and its own limiter.
struct ProviderRoute {
    client: Arc<dyn CompletionProvider>,
    model: String,
    limiter: RateLimiter,
}

/// Routes prompts to providers with rate limiting, cost tracking and fallback.
pub struct ProviderOrchestrator {
    routes: BTreeMap<ProviderId, ProviderRoute>,
    cost: Arc<CostTracker>,
    daily_budget: f64,
}

impl ProviderOrchestrator {
    /// Create an orchestrator with no providers.
    pub fn new(cost: Arc<CostTracker>, daily_budget: f64) -> Self {
        Self {
            routes: BTreeMap::new(),
            cost,
            daily_budget,
        }
    }

    /// Register a provider. Replaces any provider with the same id.
    pub fn with_provider(
        mut self,
        client: Arc<dyn CompletionProvider>,
        model: impl Into<String>,
        limiter: RateLimiter,
    ) -> Self {
        self.routes.insert(
            client.id(),
            ProviderRoute {
                client,
                model: model.into(),
                limiter,
            },
        );
        self
    }

    /// Build both providers from configuration.
    pub fn from_config(config: &Config, keys: &ApiKeys, tokens: Arc<TokenCounter>) -> Result<Self> {
        let cost = Arc::new(CostTracker::new(config.price_table()));
        let openai = config.provider_settings(ProviderId::OpenAi);
        let cohere = config.provider_settings(ProviderId::Cohere);
        let timeout = config.http.timeout_secs;

        let openai_client = OpenAiClient::new(
            keys.openai.clone(),
            openai.base_url,
            timeout,
            Arc::clone(&tokens),
        )?;
        let cohere_client =
            CohereClient::new(keys.cohere.clone(), cohere.base_url, timeout, tokens)?;

        let orchestrator = Self::new(cost, config.budget.daily_usd)
            .with_provider(
                Arc::new(openai_client),
                openai.model,
                RateLimiter::per_minute(ProviderId::OpenAi.as_str(), openai.requests_per_minute),
            )
            .with_provider(
                Arc::new(cohere_client),
                cohere.model,
                RateLimiter::per_minute(ProviderId::Cohere.as_str(), cohere.requests_per_minute),
            );

        info!(
            providers = orchestrator.routes.len(),
            daily_budget_usd = orchestrator.daily_budget,
            "Provider orchestrator ready"
        );
        Ok(orchestrator)
    }

    /// Shortcut for tests and embedders that want a bare tracker.
    pub fn with_prices(prices: PriceTable, daily_budget: f64) -> Self {
        Self::new(Arc::new(CostTracker::new(prices)), daily_budget)
    }

    /// Shared cost tracker.
    pub fn cost_tracker(&self) -> &Arc<CostTracker> {
        &self.cost
    }

    /// True once the ceiling has been reached; no further calls will be made.
    pub fn budget_exhausted(&self) -> bool {
        self.cost.total_cost() >= self.daily_budget
    }

    /// The unique other configured provider, if there is exactly one.
    pub fn secondary_of(&self, primary: ProviderId) -> Option<ProviderId> {
        let mut others = self.routes.keys().copied().filter(|id| *id != primary);
        match (others.next(), others.next()) {
            (Some(secondary), None) => Some(secondary),
            _ => None,
        }
    }

    /// Per-provider limiter statistics.
    pub fn rate_limiter_stats(&self) -> Vec<(ProviderId, RateLimiterStats)> {
        self.routes
            .iter()
            .map(|(id, route)| (*id, route.limiter.stats()))
            .collect()
    }

    fn check_budget(&self) -> Result<()> {
        let spent = self.cost.total_cost();
        if spent >= self.daily_budget {
            return Err(BriefError::BudgetExceeded {
                budget: self.daily_budget,
                spent,
            });
        }
        Ok(())
    }

    /// Ask one provider.
    ///
    /// Call failures and budget stops are returned untouched.
    pub async fn ask(&self, provider: ProviderId, prompt: &str) -> Result<String> {
        let route = self
            .routes
            .get(&provider)
            .ok_or(BriefError::ProviderNotConfigured(provider))?;

        self.check_budget()?;
        route.limiter.acquire().await;
        self.check_budget()?;

        let completion = route
            .client
            .complete(prompt, &route.model)
            .await
            .map_err(|source| BriefError::ProviderCall { provider, source })?;

        let cost = self.cost.record(
            provider,
            &route.model,
            completion.input_tokens,
            completion.output_tokens,
        );
        debug!(
            provider = %provider,
            model = %route.model,
            cost_usd = cost,
            "Provider call complete"
        );

        self.cost.enforce_budget(self.daily_budget)?;

        Ok(completion.text)
    }

    /// Ask `primary`; on a call failure ask the other configured provider once.
    ///
    /// Budget stops are never retried on another provider.
    pub async fn ask_with_fallback(
        &self,
        prompt: &str,
        primary: ProviderId,
    ) -> Result<FallbackAnswer> {
        info!(provider = primary.label(), "Trying primary provider");

        let primary_error = match self.ask(primary, prompt).await {
            Ok(text) => {
                return Ok(FallbackAnswer {
                    provider_used: primary,
                    text,
                });
            }
            Err(BriefError::ProviderCall { source, .. }) => source,
            Err(other) => return Err(other),
        };

        let Some(secondary) = self.secondary_of(primary) else {
            return Err(BriefError::ProviderCall {
                provider: primary,
                source: primary_error,
            });
        };

        warn!(
            provider = primary.label(),
            error = %primary_error,
            fallback = secondary.label(),
            "Primary provider failed, falling back to secondary provider"
        );

        match self.ask(secondary, prompt).await {
            Ok(text) => Ok(FallbackAnswer {
                provider_used: secondary,
                text,
            }),
            Err(BriefError::ProviderCall { source, .. }) => {
                warn!(provider = secondary.label(), error = %source, "Secondary provider also failed");
                Err(BriefError::AllProvidersFailed {
                    primary,
                    primary_error,
                    secondary,
                    secondary_error: source,
                })
            }
            Err(other) => Err(other),
        }
    }
}
