//! Static model price table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Price of a model in USD per 1M tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    /// Input price per 1M tokens (USD)
    pub input_per_1m: f64,
    /// Output price per 1M tokens (USD)
    pub output_per_1m: f64,
}

impl ModelPrice {
    pub const fn new(input_per_1m: f64, output_per_1m: f64) -> Self {
        Self {
            input_per_1m,
            output_per_1m,
        }
    }

    /// Cost of one call.
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * self.input_per_1m;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * self.output_per_1m;
        input_cost + output_cost
    }
}

/// Conservative price applied to models missing from the table.
pub const FALLBACK_PRICE: ModelPrice = ModelPrice::new(3.0, 15.0);

const BUILTIN_PRICES: &[(&str, ModelPrice)] = &[
    ("gpt-4o-mini", ModelPrice::new(0.15, 0.60)),
    ("gpt-4o", ModelPrice::new(2.50, 10.00)),
    ("gpt-3.5-turbo", ModelPrice::new(0.50, 1.50)),
    ("command-r7b-12-2024", ModelPrice::new(0.0375, 0.15)),
];

/// Model id → price lookup with a fallback for unlisted models.
#[derive(Debug, Clone)]
pub struct PriceTable {
    prices: HashMap<String, ModelPrice>,
    fallback: ModelPrice,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::new(
            BUILTIN_PRICES
                .iter()
                .map(|(model, price)| (model.to_string(), *price)),
        )
    }
}

impl PriceTable {
    /// Create a table from explicit entries (no built-ins).
    pub fn new(entries: impl IntoIterator<Item = (String, ModelPrice)>) -> Self {
        Self {
            prices: entries.into_iter().collect(),
            fallback: FALLBACK_PRICE,
        }
    }

    /// Overlay entries from configuration.
    pub fn with_overrides(mut self, overrides: &HashMap<String, ModelPrice>) -> Self {
        self.prices
            .extend(overrides.iter().map(|(model, price)| (model.clone(), *price)));
        self
    }

    /// Price for a model, or the fallback when unlisted.
    pub fn price(&self, model: &str) -> ModelPrice {
        self.prices.get(model).copied().unwrap_or(self.fallback)
    }

    /// True if the model has an explicit entry.
    pub fn contains(&self, model: &str) -> bool {
        self.prices.contains_key(model)
    }
}
