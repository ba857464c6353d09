//! PromptOptimizer - Shorten LLM prompts before they are sent
//!
//! This library rewrites a prompt into a shorter form and reports how many
//! sub-word tokens that saved, so callers can estimate the cost difference.
//!
//! ## Pipeline
//!
//! - **Rule rewrites**: Regex substitutions gated by aggressiveness
//! - **Linguistic reduction**: Part-of-speech driven word dropping and verb nominalization
//! - **Whitespace normalization**: Single spaces, no leading or trailing whitespace
//! - **Token counting**: tiktoken BPE counts with a whitespace word-count fallback
//! - **Savings reports**: Per-model cost estimates and batch totals

pub mod config;
pub mod metrics;
pub mod nlp;
pub mod optimization;
pub mod tokenizer;

pub use config::{Config, ConfigBuilder, ConfigError};
pub use metrics::{MetricsSummary, MetricsTracker, ModelPricing, SavingsReport, TokenMetrics};
pub use nlp::{Lemmatizer, NlpError, NounLexicon, PosTag, PosTagger, RuleTagger, TaggedToken};
pub use optimization::{
    apply_rules, LinguisticReducer, OptimizationConfig, OptimizationResult, OptimizationStats,
    OptimizerError, PromptOptimizer, Rule, RuleSet, DEFAULT_AGGRESSIVENESS,
};
pub use tokenizer::{
    count_words, CountingMethod, SubwordTokenizer, TiktokenTokenizer, TokenEncoding,
    TokenizerError,
};
