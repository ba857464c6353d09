//! Pipeline orchestration

use super::{
    LinguisticReducer, OptimizationConfig, OptimizationResult, OptimizationStats, OptimizerError,
    RuleSet,
};
use crate::nlp::{Lemmatizer, NounLexicon, PosTagger, RuleTagger};
use crate::tokenizer::{count_pair, SubwordTokenizer, TiktokenTokenizer};
use tracing::{debug, info};

/// Prompt optimizer: rule rewrites, part-of-speech reduction, whitespace
/// normalization and token counting.
///
/// The tagger, lemmatizer and tokenizer are loaded once by the constructor
/// and only read afterwards. All three are `Send + Sync`, so one optimizer
/// can be shared across threads behind an `Arc`.
pub struct PromptOptimizer {
    rules: RuleSet,
    reducer: LinguisticReducer,
    tokenizer: Box<dyn SubwordTokenizer>,
    default_aggressiveness: f32,
}

impl PromptOptimizer {
    /// Builtin tagger and lexicon plus the configured tiktoken encoding
    pub fn new(config: &OptimizationConfig) -> Result<Self, OptimizerError> {
        let lexicon = match &config.lexicon_path {
            Some(path) => NounLexicon::with_file(path)?,
            None => NounLexicon::builtin(),
        };
        let tokenizer = TiktokenTokenizer::new(config.encoding)?;
        info!(
            "Loaded optimizer (encoding: {}, noun lemmas: {})",
            config.encoding,
            lexicon.len()
        );

        let mut optimizer = Self::from_parts(RuleTagger::new(), lexicon, tokenizer);
        optimizer.default_aggressiveness = config.aggressiveness;
        Ok(optimizer)
    }

    pub fn from_parts(
        tagger: impl PosTagger + 'static,
        lemmatizer: impl Lemmatizer + 'static,
        tokenizer: impl SubwordTokenizer + 'static,
    ) -> Self {
        Self {
            rules: RuleSet::default(),
            reducer: LinguisticReducer::new(Box::new(tagger), Box::new(lemmatizer)),
            tokenizer: Box::new(tokenizer),
            default_aggressiveness: super::DEFAULT_AGGRESSIVENESS,
        }
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn reducer(&self) -> &LinguisticReducer {
        &self.reducer
    }

    pub fn default_aggressiveness(&self) -> f32 {
        self.default_aggressiveness
    }

    pub fn apply_rules(&self, text: &str, aggressiveness: f32) -> String {
        self.rules.apply(text, aggressiveness).text
    }

    pub fn linguistic_optimize(&self, text: &str, aggressiveness: f32) -> String {
        self.reducer.linguistic_optimize(text, aggressiveness)
    }

    /// Optimize a prompt. Never fails: tokenizer errors fall back to word
    /// counts for both texts.
    pub fn optimize(&self, prompt: &str, aggressiveness: f32) -> OptimizationResult {
        self.optimize_with_report(prompt, aggressiveness).0
    }

    pub fn optimize_default(&self, prompt: &str) -> OptimizationResult {
        self.optimize(prompt, self.default_aggressiveness)
    }

    /// Like `optimize`, also reporting which rules fired and what the
    /// reducer did
    pub fn optimize_with_report(
        &self,
        prompt: &str,
        aggressiveness: f32,
    ) -> (OptimizationResult, OptimizationStats) {
        let rewrite = self.rules.apply(prompt, aggressiveness);
        let reduction = self.reducer.reduce(&rewrite.text, aggressiveness);
        let optimized = collapse_whitespace(&reduction.text);

        let counts = count_pair(self.tokenizer.as_ref(), prompt, &optimized);
        debug!(
            "Optimized prompt at {:.2}: {} -> {} tokens ({:?})",
            aggressiveness, counts.original, counts.optimized, counts.method
        );

        let mut stats = OptimizationStats::new(counts.original, counts.optimized);
        stats.rules_applied = rewrite.applied.iter().map(|r| r.to_string()).collect();
        stats.words_kept = reduction.kept;
        stats.words_substituted = reduction.substituted;
        stats.words_dropped = reduction.dropped;

        let result = OptimizationResult {
            optimized,
            original_tokens: counts.original,
            optimized_tokens: counts.optimized,
            counting: counts.method,
        };

        (result, stats)
    }
}

impl std::fmt::Debug for PromptOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptOptimizer")
            .field("rules", &self.rules.rules().len())
            .field("tokenizer", &self.tokenizer.name())
            .field("default_aggressiveness", &self.default_aggressiveness)
            .finish()
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_was_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(c);
            last_was_space = false;
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{CountingMethod, TokenizerError};

    struct BrokenTokenizer;

    impl SubwordTokenizer for BrokenTokenizer {
        fn encode(&self, _text: &str) -> Result<Vec<usize>, TokenizerError> {
            Err(TokenizerError::Encode("offline".to_string()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn optimizer() -> PromptOptimizer {
        PromptOptimizer::new(&OptimizationConfig::default()).unwrap()
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b\n\nc  "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_empty_prompt() {
        let opt = optimizer();
        for a in [0.0, 0.5, 0.7, 1.0] {
            assert_eq!(opt.optimize("", a).into_tuple(), (String::new(), 0, 0));
        }
    }

    const SAMPLE: &str = "Please carefully explain the advantages and disadvantages, \
                          e.g. in JSON output in JSON format";

    #[test]
    fn test_full_pipeline_at_default() {
        let opt = optimizer();
        let (result, stats) = opt.optimize_with_report(SAMPLE, 0.7);

        assert_eq!(result.optimized, "pros/cons ex: JSON JSON:");
        assert_eq!(result.counting, CountingMethod::Subword);
        assert!(result.optimized_tokens < result.original_tokens);
        assert_eq!(
            stats.rules_applied,
            vec!["strip_intensifiers", "pros_cons", "json_shorthand", "example_shorthand"]
        );
    }

    #[test]
    fn test_full_pipeline_at_max_only_shortens_json() {
        let (result, stats) = optimizer().optimize_with_report(SAMPLE, 1.0);
        assert_eq!(stats.rules_applied, vec!["json_shorthand"]);
        assert!(result.optimized.ends_with("JSON JSON:"));
        assert!(!result.optimized.contains("pros/cons"));
    }

    #[test]
    fn test_default_aggressiveness() {
        let opt = optimizer();
        assert_eq!(opt.default_aggressiveness(), 0.7);
        let prompt = "Summarize the report for the team";
        assert_eq!(opt.optimize_default(prompt), opt.optimize(prompt, 0.7));
    }

    #[test]
    fn test_fallback_counts_words() {
        let opt =
            PromptOptimizer::from_parts(RuleTagger::new(), NounLexicon::builtin(), BrokenTokenizer);
        let prompt = "Explain   the results of the  experiment";
        let result = opt.optimize(prompt, 0.9);

        assert_eq!(result.counting, CountingMethod::WhitespaceFallback);
        assert_eq!(result.original_tokens, prompt.split_whitespace().count());
        assert_eq!(
            result.optimized_tokens,
            result.optimized.split_whitespace().count()
        );
    }

    #[test]
    fn test_custom_rules() {
        let rule = crate::optimization::Rule::new("tldr", "in summary", "tl;dr", 0.9).unwrap();
        let rules = RuleSet::new(vec![rule]);
        let opt = optimizer().with_rules(rules);
        assert_eq!(opt.apply_rules("In summary it works", 0.5), "tl;dr it works");
    }
}
