//! Plain-text report for a batch run.

use crate::cost::CostSummary;
use crate::models::ProviderId;
use crate::pipeline::BatchOutcome;
use std::collections::BTreeMap;
use std::fmt::Write;

const WIDTH: usize = 80;

/// Format an integer with `,` thousands separators.
pub fn with_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Render article summaries followed by the cost summary.
pub fn render_report(
    outcome: &BatchOutcome,
    costs: &CostSummary,
    by_provider: &BTreeMap<ProviderId, CostSummary>,
) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_report(&mut out, outcome, costs, by_provider);
    out
}

fn write_report(
    out: &mut String,
    outcome: &BatchOutcome,
    costs: &CostSummary,
    by_provider: &BTreeMap<ProviderId, CostSummary>,
) -> std::fmt::Result {
    let rule = "=".repeat(WIDTH);

    writeln!(out, "{rule}")?;
    writeln!(out, "NEWS SUMMARY REPORT")?;
    writeln!(out, "{rule}")?;

    for (i, result) in outcome.results.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "{}. {}", i + 1, result.title)?;
        writeln!(
            out,
            "   Source: {} | Published: {}",
            result.source, result.published_at
        )?;
        writeln!(out, "   URL: {}", result.url)?;
        writeln!(out)?;
        writeln!(out, "   SUMMARY:")?;
        writeln!(out, "   {}", result.summary)?;
        writeln!(out)?;
        writeln!(out, "   SENTIMENT:")?;
        writeln!(out, "   {}", result.sentiment)?;
        writeln!(out)?;
        writeln!(out, "   {}", "-".repeat(WIDTH - 4))?;
    }

    if !outcome.failures.is_empty() || outcome.skipped > 0 {
        writeln!(out)?;
        writeln!(out, "Failed articles: {}", outcome.failures.len())?;
        for failure in &outcome.failures {
            writeln!(out, "  - {}", failure.error)?;
        }
        if outcome.skipped > 0 {
            writeln!(out, "Not started: {}", outcome.skipped)?;
        }
    }
    if outcome.budget_exhausted {
        writeln!(out, "Note: daily budget reached, remaining articles were not processed.")?;
    }
    if outcome.cancelled {
        writeln!(out, "Note: run cancelled before all articles were processed.")?;
    }

    writeln!(out)?;
    writeln!(out, "{rule}")?;
    writeln!(out, "COST SUMMARY")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "Total requests: {}", costs.total_requests)?;
    writeln!(out, "Total cost: ${:.4}", costs.total_cost)?;
    writeln!(out, "Total tokens: {}", with_thousands(costs.total_tokens()))?;
    writeln!(out, "  Input: {}", with_thousands(costs.total_input_tokens))?;
    writeln!(out, "  Output: {}", with_thousands(costs.total_output_tokens))?;
    writeln!(out, "Average cost per request: ${:.6}", costs.average_cost)?;

    if !by_provider.is_empty() {
        writeln!(out, "By provider:")?;
        for (provider, summary) in by_provider {
            writeln!(
                out,
                "  {}: {} requests, ${:.4}, {} tokens",
                provider.label(),
                summary.total_requests,
                summary.total_cost,
                with_thousands(summary.total_tokens())
            )?;
        }
    }
    writeln!(out, "{rule}")?;

    Ok(())
}
