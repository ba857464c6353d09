//! Savings and cost reporting for optimized prompts
//!
//! The optimizer only returns token counts. Everything that divides by them
//! lives here, guarded against empty prompts.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Price per 1000 tokens for a model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// USD per 1000 input tokens
    pub input_per_1k: f64,
    /// USD per 1000 output tokens
    pub output_per_1k: f64,
}

impl ModelPricing {
    pub fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    pub fn input_cost(&self, tokens: usize) -> f64 {
        tokens as f64 * self.input_per_1k / 1000.0
    }

    pub fn output_cost(&self, tokens: usize) -> f64 {
        tokens as f64 * self.output_per_1k / 1000.0
    }
}

/// Savings of one optimization run under a price table entry
#[derive(Debug, Clone, Serialize)]
pub struct SavingsReport {
    pub original_tokens: usize,
    pub optimized_tokens: usize,
    /// Negative when the optimized prompt came out longer
    pub tokens_saved: i64,
    /// Percentage of original tokens removed, 0 for an empty prompt
    pub percent_saved: f64,
    pub input_cost_saved: f64,
    pub output_cost_saved: f64,
    pub total_cost_saved: f64,
    /// Share of the original per-call cost that was saved, in percent
    pub cost_percent_saved: f64,
    pub pricing: ModelPricing,
}

impl SavingsReport {
    pub fn new(original_tokens: usize, optimized_tokens: usize, pricing: ModelPricing) -> Self {
        let tokens_saved = original_tokens as i64 - optimized_tokens as i64;
        let percent_saved = if original_tokens > 0 {
            tokens_saved as f64 / original_tokens as f64 * 100.0
        } else {
            0.0
        };

        let input_cost_saved = pricing.input_cost(original_tokens) - pricing.input_cost(optimized_tokens);
        let output_cost_saved =
            pricing.output_cost(original_tokens) - pricing.output_cost(optimized_tokens);
        let total_cost_saved = input_cost_saved + output_cost_saved;
        let original_cost = pricing.input_cost(original_tokens) + pricing.output_cost(original_tokens);
        let cost_percent_saved = if original_cost > 0.0 {
            total_cost_saved / original_cost * 100.0
        } else {
            0.0
        };

        Self {
            original_tokens,
            optimized_tokens,
            tokens_saved,
            percent_saved,
            input_cost_saved,
            output_cost_saved,
            total_cost_saved,
            cost_percent_saved,
            pricing,
        }
    }

    /// Size of the optimized prompt relative to the original, in percent
    pub fn remaining_percent(&self) -> f64 {
        100.0 - self.percent_saved
    }

    pub fn share_line(&self, aggressiveness: f32) -> String {
        format!(
            "Saved {} tokens (${:.4}) with #PromptOptimizer\nOptimization level: {:.0}%",
            self.tokens_saved,
            self.total_cost_saved,
            aggressiveness * 100.0
        )
    }
}

impl std::fmt::Display for SavingsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = &self.pricing;
        writeln!(f, "=== Optimization Results ===")?;
        writeln!(
            f,
            "Token reduction: {:.1}% ({} tokens saved)",
            self.percent_saved, self.tokens_saved
        )?;
        writeln!(
            f,
            "Cost reduction: {:.1}% (${:.4} saved per call)",
            self.cost_percent_saved, self.total_cost_saved
        )?;
        writeln!(
            f,
            "Prompt reduced to {:.1}% of original size",
            self.remaining_percent()
        )?;
        writeln!(f)?;
        writeln!(f, "Input cost")?;
        writeln!(f, "  Original:  ${:.4}", p.input_cost(self.original_tokens))?;
        writeln!(f, "  Optimized: ${:.4}", p.input_cost(self.optimized_tokens))?;
        writeln!(f, "  Saved:     ${:.4}", self.input_cost_saved)?;
        writeln!(f, "Output cost")?;
        writeln!(f, "  Original:  ${:.4}", p.output_cost(self.original_tokens))?;
        writeln!(f, "  Optimized: ${:.4}", p.output_cost(self.optimized_tokens))?;
        writeln!(f, "  Saved:     ${:.4}", self.output_cost_saved)?;
        Ok(())
    }
}

/// Totals across several optimization runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenMetrics {
    pub total_original_tokens: u64,
    pub total_optimized_tokens: u64,
    /// Sum of signed per-prompt savings
    pub tokens_saved: i64,
    pub prompt_count: u64,
    /// Runs whose counts came from the whitespace fallback
    pub fallback_count: u64,
    pub estimated_savings: f64,
}

impl TokenMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, original: usize, optimized: usize, fallback: bool, saved_cost: Option<f64>) {
        self.total_original_tokens += original as u64;
        self.total_optimized_tokens += optimized as u64;
        self.tokens_saved += original as i64 - optimized as i64;
        self.prompt_count += 1;
        if fallback {
            self.fallback_count += 1;
        }
        if let Some(c) = saved_cost {
            self.estimated_savings += c;
        }
    }

    pub fn compression_ratio(&self) -> f64 {
        if self.total_original_tokens == 0 {
            return 1.0;
        }
        self.total_optimized_tokens as f64 / self.total_original_tokens as f64
    }

    pub fn average_tokens_saved(&self) -> f64 {
        if self.prompt_count == 0 {
            return 0.0;
        }
        self.tokens_saved as f64 / self.prompt_count as f64
    }
}

/// Thread-safe metrics tracker
#[derive(Clone)]
pub struct MetricsTracker {
    inner: Arc<Mutex<TokenMetrics>>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TokenMetrics::new())),
        }
    }

    pub fn record(&self, original: usize, optimized: usize, fallback: bool, saved_cost: Option<f64>) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.record(original, optimized, fallback, saved_cost);
        }
    }

    pub fn get_metrics(&self) -> TokenMetrics {
        self.inner
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn summary(&self) -> MetricsSummary {
        let metrics = self.get_metrics();
        MetricsSummary {
            prompt_count: metrics.prompt_count,
            total_original_tokens: metrics.total_original_tokens,
            total_optimized_tokens: metrics.total_optimized_tokens,
            tokens_saved: metrics.tokens_saved,
            compression_ratio: metrics.compression_ratio(),
            avg_tokens_saved: metrics.average_tokens_saved(),
            fallback_count: metrics.fallback_count,
            estimated_savings: metrics.estimated_savings,
        }
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub prompt_count: u64,
    pub total_original_tokens: u64,
    pub total_optimized_tokens: u64,
    pub tokens_saved: i64,
    pub compression_ratio: f64,
    pub avg_tokens_saved: f64,
    pub fallback_count: u64,
    pub estimated_savings: f64,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Token Metrics Summary ===")?;
        writeln!(f, "Prompts optimized: {}", self.prompt_count)?;
        writeln!(f, "Original tokens: {}", self.total_original_tokens)?;
        writeln!(f, "Optimized tokens: {}", self.total_optimized_tokens)?;
        writeln!(f, "Tokens saved: {}", self.tokens_saved)?;
        writeln!(f, "Compression ratio: {:.2}%", self.compression_ratio * 100.0)?;
        writeln!(f, "Avg tokens saved/prompt: {:.1}", self.avg_tokens_saved)?;
        if self.fallback_count > 0 {
            writeln!(f, "Word-count fallbacks: {}", self.fallback_count)?;
        }
        writeln!(f, "Estimated savings: ${:.4}", self.estimated_savings)?;
        Ok(())
    }
}
