//! Priority-gated regex rewrites

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;
use tracing::debug;

/// A case-insensitive substitution that fires while aggressiveness does not
/// exceed its priority
#[derive(Debug, Clone)]
pub struct Rule {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
    priority: f32,
}

impl Rule {
    pub fn new(
        name: &'static str,
        pattern: &str,
        replacement: &'static str,
        priority: f32,
    ) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            name,
            pattern,
            replacement,
            priority,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn priority(&self) -> f32 {
        self.priority
    }

    /// Low-priority rules drop out as aggressiveness rises
    pub fn fires_at(&self, aggressiveness: f32) -> bool {
        self.priority >= aggressiveness
    }

    /// Replaces every match; `None` when nothing matched
    pub fn rewrite(&self, text: &str) -> Option<String> {
        if !self.pattern.is_match(text) {
            return None;
        }
        Some(
            self.pattern
                .replace_all(text, regex::NoExpand(self.replacement))
                .into_owned(),
        )
    }
}

static DEFAULT_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    let table: [(&'static str, &str, &'static str, f32); 5] = [
        (
            "strip_intensifiers",
            r"\b(?:please\s+)?(?:carefully|very|extremely)\b",
            "",
            0.8,
        ),
        (
            "pros_cons",
            r"\badvantages and disadvantages\b",
            "pros/cons",
            0.9,
        ),
        ("json_shorthand", r"\boutput in JSON format\b", "JSON:", 1.0),
        (
            "example_shorthand",
            r"\b(?:for example\b|e\.g\.)",
            "ex:",
            0.9,
        ),
        ("collapse_whitespace", r"\s{2,}", " ", 0.0),
    ];

    let rules = table
        .into_iter()
        .map(|(name, pattern, replacement, priority)| {
            Rule::new(name, pattern, replacement, priority)
                .unwrap_or_else(|e| panic!("builtin rule {name} has an invalid pattern: {e}"))
        })
        .collect();
    RuleSet { rules }
});

/// Result of running a rule set over some text
#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub text: String,
    /// Rules that passed the gate and matched, in application order
    pub applied: Vec<&'static str>,
}

/// Ordered list of rules. Each rule sees the output of the one before it.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn apply(&self, text: &str, aggressiveness: f32) -> Rewrite {
        let mut current = text.to_string();
        let mut applied = Vec::new();

        for rule in self.rules.iter().filter(|r| r.fires_at(aggressiveness)) {
            if let Some(rewritten) = rule.rewrite(&current) {
                debug!("Rule {} rewrote {} -> {} bytes", rule.name, current.len(), rewritten.len());
                current = rewritten;
                applied.push(rule.name);
            }
        }

        Rewrite {
            text: current,
            applied,
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

/// Runs the builtin rule set
pub fn apply_rules(text: &str, aggressiveness: f32) -> String {
    DEFAULT_RULES.apply(text, aggressiveness).text
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Please carefully explain the advantages and disadvantages, \
                          e.g. in JSON output in JSON format";

    #[test]
    fn test_builtin_patterns_compile() {
        for rule in RuleSet::default().rules() {
            assert!(!rule.pattern.as_str().is_empty(), "{}", rule.name());
        }
        let err = Rule::new("broken", "(unclosed", "", 0.5).unwrap_err();
        assert!(err.to_string().contains("unclosed"));
    }

    #[test]
    fn test_default_rule_order() {
        let names: Vec<_> = RuleSet::default().rules().iter().map(Rule::name).collect();
        assert_eq!(
            names,
            vec![
                "strip_intensifiers",
                "pros_cons",
                "json_shorthand",
                "example_shorthand",
                "collapse_whitespace"
            ]
        );
    }

    #[test]
    fn test_rewrites_fire_at_default_aggressiveness() {
        let rewrite = RuleSet::default().apply(SAMPLE, 0.7);
        assert_eq!(rewrite.text, " explain the pros/cons, ex: in JSON JSON:");
        assert_eq!(
            rewrite.applied,
            vec!["strip_intensifiers", "pros_cons", "json_shorthand", "example_shorthand"]
        );
    }

    #[test]
    fn test_every_rule_passes_gate_at_zero() {
        assert_eq!(apply_rules(SAMPLE, 0.0), " explain the pros/cons, ex: in JSON JSON:");
        assert!(RuleSet::default().rules().iter().all(|r| r.fires_at(0.0)));
    }

    #[test]
    fn test_only_json_rule_at_full_aggressiveness() {
        let rewrite = RuleSet::default().apply(SAMPLE, 1.0);
        assert_eq!(
            rewrite.text,
            "Please carefully explain the advantages and disadvantages, e.g. in JSON JSON:"
        );
        assert_eq!(rewrite.applied, vec!["json_shorthand"]);
    }

    #[test]
    fn test_priority_gates() {
        let text = "Be very brief about advantages and disadvantages";
        // 0.85 is above the intensifier priority, so only pros_cons fires
        assert_eq!(apply_rules(text, 0.85), "Be very brief about pros/cons");
        // whitespace collapse sits at 0.0 and does not fire here
        assert_eq!(apply_rules(text, 0.8), "Be  brief about pros/cons");
        assert_eq!(apply_rules(text, 0.95), text);
    }

    #[test]
    fn test_whitespace_rule_only_at_zero() {
        assert_eq!(apply_rules("too   many \n\n spaces", 0.0), "too many spaces");
        assert_eq!(apply_rules("too   many", 0.5), "too   many");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(apply_rules("FOR EXAMPLE this", 0.9), "ex: this");
        assert_eq!(apply_rules("Output In Json Format", 1.0), "JSON:");
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(apply_rules("everything", 0.0), "everything");
        assert_eq!(apply_rules("forexample", 0.0), "forexample");
    }

    #[test]
    fn test_custom_rule_chains() {
        let mut rules = RuleSet::new(vec![Rule::new("a", "alpha", "beta", 0.9).unwrap()]);
        rules.push(Rule::new("b", "beta", "gamma", 0.9).unwrap());
        let rewrite = rules.apply("alpha", 0.5);
        assert_eq!(rewrite.text, "gamma");
        assert_eq!(rewrite.applied, vec!["a", "b"]);
    }

    #[test]
    fn test_replacement_is_literal() {
        let rules = RuleSet::new(vec![Rule::new("cash", "price", "$1", 0.0).unwrap()]);
        assert_eq!(rules.apply("the price", 0.0).text, "the $1");
    }
}
