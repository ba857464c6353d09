//! Prompt shortening pipeline
//!
//! Rule rewrites run first, then the part-of-speech reducer, then whitespace
//! normalization. Token counts are taken on the untouched prompt and on the
//! final text.

mod linguistic;
mod rules;
mod strategies;

pub use linguistic::{
    LinguisticReducer, Reduction, TokenAction, FUNCTION_WORD_LEVEL, VERB_NOMINALIZATION_LEVEL,
};
pub use rules::{apply_rules, Rewrite, Rule, RuleSet};
pub use strategies::PromptOptimizer;

use crate::nlp::NlpError;
use crate::tokenizer::{CountingMethod, TokenEncoding, TokenizerError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Aggressiveness used when the caller does not pick one
pub const DEFAULT_AGGRESSIVENESS: f32 = 0.7;

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("Lexicon error: {0}")]
    Lexicon(#[from] NlpError),
}

/// Configuration for building an optimizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// Aggressiveness for `PromptOptimizer::optimize_default`
    pub aggressiveness: f32,
    /// Encoding used for token counts
    pub encoding: TokenEncoding,
    /// Extra noun lemmas on top of the builtin list
    pub lexicon_path: Option<PathBuf>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            aggressiveness: DEFAULT_AGGRESSIVENESS,
            encoding: TokenEncoding::default(),
            lexicon_path: None,
        }
    }
}

/// Optimized prompt with before/after token counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub optimized: String,
    pub original_tokens: usize,
    pub optimized_tokens: usize,
    /// Both counts always come from the same method
    pub counting: CountingMethod,
}

impl OptimizationResult {
    /// Negative when nominalization made the text longer
    pub fn tokens_saved(&self) -> i64 {
        self.original_tokens as i64 - self.optimized_tokens as i64
    }

    pub fn into_tuple(self) -> (String, usize, usize) {
        (self.optimized, self.original_tokens, self.optimized_tokens)
    }
}

impl From<OptimizationResult> for (String, usize, usize) {
    fn from(result: OptimizationResult) -> Self {
        result.into_tuple()
    }
}

/// Statistics about what the pipeline did
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizationStats {
    pub original_tokens: usize,
    pub optimized_tokens: usize,
    pub tokens_saved: i64,
    pub compression_ratio: f32,
    pub rules_applied: Vec<String>,
    pub words_kept: usize,
    pub words_substituted: usize,
    pub words_dropped: usize,
}

impl OptimizationStats {
    pub fn new(original: usize, optimized: usize) -> Self {
        let saved = original as i64 - optimized as i64;
        let ratio = if original > 0 {
            optimized as f32 / original as f32
        } else {
            1.0
        };

        Self {
            original_tokens: original,
            optimized_tokens: optimized,
            tokens_saved: saved,
            compression_ratio: ratio,
            ..Default::default()
        }
    }
}
