//! Running cost accounting against a budget ceiling.
//!
//! The total and the record list live behind one mutex, so
//! `total_cost == sum(record.cost)` holds after every `record` even when
//! several workers complete calls at once.

use super::PriceTable;
use crate::models::{BriefError, ProviderId, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Fraction of the ceiling at which a warning is surfaced.
pub const BUDGET_WARNING_RATIO: f64 = 0.9;

/// One completed provider call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub provider: ProviderId,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Cost in USD
    pub cost: f64,
}

/// Aggregate view over all records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub total_requests: usize,
    pub total_cost: f64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub average_cost: f64,
}

impl CostSummary {
    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }
}

/// Outcome of a budget check that did not fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BudgetStatus {
    /// Below the warning threshold
    Within,
    /// At or above 90% of the ceiling
    Warning { percent_used: f64 },
}

#[derive(Debug, Default)]
struct Ledger {
    total_cost: f64,
    records: Vec<CostRecord>,
}

/// Process-wide cost tracker shared by every provider.
#[derive(Debug)]
pub struct CostTracker {
    prices: PriceTable,
    ledger: Mutex<Ledger>,
}

impl Default for CostTracker {
    fn default() -> Self {
        Self::new(PriceTable::default())
    }
}

impl CostTracker {
    /// Create a tracker pricing calls with the given table.
    pub fn new(prices: PriceTable) -> Self {
        Self {
            prices,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        // both fields are written under one guard
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a completed call and return its cost.
    pub fn record(
        &self,
        provider: ProviderId,
        model: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> f64 {
        let cost = self.prices.price(model).cost(input_tokens, output_tokens);

        let mut ledger = self.ledger();
        ledger.total_cost += cost;
        ledger.records.push(CostRecord {
            provider,
            model: model.to_string(),
            input_tokens,
            output_tokens,
            cost,
        });

        debug!(
            provider = %provider,
            model = model,
            input_tokens = input_tokens,
            output_tokens = output_tokens,
            cost_usd = cost,
            total_usd = ledger.total_cost,
            "Recorded call cost"
        );

        cost
    }

    /// Running total in USD.
    pub fn total_cost(&self) -> f64 {
        self.ledger().total_cost
    }

    /// Snapshot of all records, in completion order.
    pub fn records(&self) -> Vec<CostRecord> {
        self.ledger().records.clone()
    }

    /// Aggregate summary. Average is 0 on an empty tracker.
    pub fn summary(&self) -> CostSummary {
        let ledger = self.ledger();
        let total_requests = ledger.records.len();
        CostSummary {
            total_requests,
            total_cost: ledger.total_cost,
            total_input_tokens: ledger.records.iter().map(|r| r.input_tokens).sum(),
            total_output_tokens: ledger.records.iter().map(|r| r.output_tokens).sum(),
            average_cost: ledger.total_cost / total_requests.max(1) as f64,
        }
    }

    /// Per-provider subtotals.
    pub fn by_provider(&self) -> BTreeMap<ProviderId, CostSummary> {
        let ledger = self.ledger();
        let mut out: BTreeMap<ProviderId, CostSummary> = BTreeMap::new();
        for record in &ledger.records {
            let entry = out.entry(record.provider).or_default();
            entry.total_requests += 1;
            entry.total_cost += record.cost;
            entry.total_input_tokens += record.input_tokens;
            entry.total_output_tokens += record.output_tokens;
        }
        for summary in out.values_mut() {
            summary.average_cost = summary.total_cost / summary.total_requests.max(1) as f64;
        }
        out
    }

    /// Fail once the total reaches the ceiling; warn from 90% upward.
    ///
    /// Runs after a call completes, so one call may overshoot.
    pub fn enforce_budget(&self, ceiling: f64) -> Result<BudgetStatus> {
        let spent = self.total_cost();

        if spent >= ceiling {
            return Err(BriefError::BudgetExceeded {
                budget: ceiling,
                spent,
            });
        }

        let percent_used = if ceiling > 0.0 {
            spent / ceiling * 100.0
        } else {
            0.0
        };
        if spent >= ceiling * BUDGET_WARNING_RATIO {
            warn!(
                percent_used = format!("{percent_used:.1}%"),
                spent_usd = spent,
                budget_usd = ceiling,
                "Approaching daily budget"
            );
            return Ok(BudgetStatus::Warning { percent_used });
        }

        Ok(BudgetStatus::Within)
    }
}
