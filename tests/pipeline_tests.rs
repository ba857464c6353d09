//! End-to-end properties of the optimization pipeline

use prompt_optimizer::{
    apply_rules, count_words, ConfigBuilder, CountingMethod, NounLexicon, OptimizationConfig,
    PromptOptimizer, RuleTagger, SavingsReport, SubwordTokenizer, TokenizerError,
};
use std::sync::{Arc, OnceLock};

const PROMPTS: &[&str] = &[
    "Please carefully explain the advantages and disadvantages, e.g. in JSON output in JSON format",
    "Explain the results of the test in detail.",
    "  Summarize   the\tquarterly report\n\nfor the engineering team  ",
    "Could you very quickly list 5 ideas for improving our onboarding process?",
    "Compare Rust and Python for 3 projects, for example a CLI and a web service.",
    "",
];

const LEVELS: &[f32] = &[0.0, 0.3, 0.5, 0.7, 0.8, 0.9, 1.0];

fn optimizer() -> &'static PromptOptimizer {
    static OPTIMIZER: OnceLock<PromptOptimizer> = OnceLock::new();
    OPTIMIZER.get_or_init(|| PromptOptimizer::new(&OptimizationConfig::default()).unwrap())
}

struct OfflineTokenizer;

impl SubwordTokenizer for OfflineTokenizer {
    fn encode(&self, _text: &str) -> Result<Vec<usize>, TokenizerError> {
        Err(TokenizerError::Encode("encoding tables unavailable".to_string()))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

// ============================================================
// Whitespace normalization
// ============================================================

#[test]
fn test_output_whitespace_is_normalized() {
    let opt = optimizer();
    for prompt in PROMPTS {
        for &a in LEVELS {
            let result = opt.optimize(prompt, a);
            let out = &result.optimized;
            assert!(!out.contains("  "), "double space at {a}: {out:?}");
            assert_eq!(out.trim(), out, "untrimmed output at {a}: {out:?}");
            assert!(
                !out.contains(['\t', '\n', '\r']),
                "non-space whitespace at {a}: {out:?}"
            );
        }
    }
}

#[test]
fn test_whitespace_only_prompt() {
    let result = optimizer().optimize(" \t\n  ", 1.0);
    assert_eq!(result.optimized, "");
    assert_eq!(result.optimized_tokens, 0);
}

// ============================================================
// Empty input
// ============================================================

#[test]
fn test_empty_prompt_at_every_level() {
    for &a in LEVELS {
        assert_eq!(optimizer().optimize("", a).into_tuple(), (String::new(), 0, 0));
    }
}

// ============================================================
// Rule thresholds
// ============================================================

#[test]
fn test_rewrite_rules_fire_at_default() {
    for a in [0.0, 0.5, 0.7] {
        assert_eq!(
            apply_rules(PROMPTS[0], a),
            " explain the pros/cons, ex: in JSON JSON:",
            "aggressiveness {a}"
        );
    }
}

#[test]
fn test_only_json_rule_fires_at_max() {
    assert_eq!(
        apply_rules(PROMPTS[0], 1.0),
        "Please carefully explain the advantages and disadvantages, e.g. in JSON JSON:"
    );
}

#[test]
fn test_intensifier_rule_drops_out_above_its_priority() {
    assert_eq!(
        apply_rules(PROMPTS[0], 0.9),
        "Please carefully explain the pros/cons, ex: in JSON JSON:"
    );
}

#[test]
fn test_full_pipeline_at_default() {
    let result = optimizer().optimize(PROMPTS[0], 0.7);
    assert_eq!(result.optimized, "pros/cons ex: JSON JSON:");
    assert_eq!(result.counting, CountingMethod::Subword);
}

// ============================================================
// Low aggressiveness
// ============================================================

#[test]
fn test_low_aggressiveness_preserves_words() {
    let prompt = "Explain the results of the test in detail";
    for a in [0.0, 0.3, 0.5, 0.69] {
        assert_eq!(optimizer().optimize(prompt, a).optimized, prompt);
    }
}

// ============================================================
// Token counting
// ============================================================

#[test]
fn test_fallback_counts_whitespace_words() {
    let opt = PromptOptimizer::from_parts(RuleTagger::new(), NounLexicon::builtin(), OfflineTokenizer);
    for prompt in PROMPTS {
        for &a in LEVELS {
            let result = opt.optimize(prompt, a);
            assert_eq!(result.counting, CountingMethod::WhitespaceFallback);
            assert_eq!(result.original_tokens, count_words(prompt));
            assert_eq!(result.optimized_tokens, count_words(&result.optimized));
        }
    }
}

#[test]
fn test_special_token_falls_back() {
    let prompt = "Summarize the log <|endoftext|> and list the errors";
    let result = optimizer().optimize(prompt, 0.5);
    assert_eq!(result.counting, CountingMethod::WhitespaceFallback);
    assert_eq!(result.original_tokens, count_words(prompt));
    assert_eq!(result.optimized_tokens, count_words(&result.optimized));
}

#[test]
fn test_token_counts_do_not_grow_for_verbose_prompts() {
    let opt = optimizer();
    for prompt in &PROMPTS[..5] {
        let result = opt.optimize(prompt, 1.0);
        assert!(
            result.optimized_tokens <= result.original_tokens,
            "{prompt:?} grew: {} -> {}",
            result.original_tokens,
            result.optimized_tokens
        );
    }
}

// ============================================================
// Re-optimization
// ============================================================

#[test]
fn test_reoptimization_converges() {
    let opt = optimizer();
    for prompt in PROMPTS {
        let mut text = prompt.to_string();
        let mut converged = false;
        for _ in 0..10 {
            let next = opt.optimize(&text, 1.0).optimized;
            if next == text {
                converged = true;
                break;
            }
            assert!(count_words(&next) <= count_words(&text));
            text = next;
        }
        assert!(converged, "{prompt:?} did not settle, last: {text:?}");
    }
}

// ============================================================
// Sharing and configuration
// ============================================================

#[test]
fn test_optimizer_shared_across_threads() {
    let opt = Arc::new(PromptOptimizer::new(&OptimizationConfig::default()).unwrap());
    let expected = opt.optimize(PROMPTS[3], 0.9);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let opt = Arc::clone(&opt);
            std::thread::spawn(move || opt.optimize(PROMPTS[3], 0.9))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_config_drives_default_aggressiveness() {
    let config = ConfigBuilder::new().aggressiveness(0.9).build();
    let opt = PromptOptimizer::new(&config.optimization()).unwrap();
    assert_eq!(opt.default_aggressiveness(), 0.9);
    assert_eq!(opt.optimize_default(PROMPTS[1]), opt.optimize(PROMPTS[1], 0.9));
}

#[test]
fn test_extra_lexicon_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nouns.txt");
    std::fs::write(&path, "# team vocabulary\nrefactor\n").unwrap();

    let config = ConfigBuilder::new().lexicon_path(&path).build();
    assert!(config.validate().is_ok());
    assert!(PromptOptimizer::new(&config.optimization()).is_ok());

    let missing = ConfigBuilder::new().lexicon_path(dir.path().join("absent.txt")).build();
    assert!(missing.validate().is_err());
    assert!(PromptOptimizer::new(&missing.optimization()).is_err());
}

#[test]
fn test_report_from_result() {
    let config = ConfigBuilder::new().build();
    let pricing = config.pricing.default_pricing().unwrap();
    let result = optimizer().optimize(PROMPTS[0], 0.7);

    let report = SavingsReport::new(result.original_tokens, result.optimized_tokens, pricing);
    assert_eq!(report.tokens_saved, result.tokens_saved());
    assert!(report.percent_saved > 0.0 && report.percent_saved < 100.0);
    assert!(report.total_cost_saved > 0.0);
}
