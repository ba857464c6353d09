//! Part-of-speech driven word selection

use crate::nlp::{Lemmatizer, PosTag, PosTagger, TaggedToken};
use tracing::debug;

/// Verbs are swapped for a noun form (or dropped) from this level up
pub const VERB_NOMINALIZATION_LEVEL: f32 = 0.8;

/// Below this level every non-verb word is kept
pub const FUNCTION_WORD_LEVEL: f32 = 0.7;

/// What the reducer does with a single tagged token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenAction {
    Keep,
    Substitute(String),
    Drop,
}

/// Outcome of a reduction pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reduction {
    pub text: String,
    pub kept: usize,
    pub substituted: usize,
    pub dropped: usize,
}

/// Keeps, drops or nominalizes words based on their part of speech
pub struct LinguisticReducer {
    tagger: Box<dyn PosTagger>,
    lemmatizer: Box<dyn Lemmatizer>,
}

impl LinguisticReducer {
    pub fn new(tagger: Box<dyn PosTagger>, lemmatizer: Box<dyn Lemmatizer>) -> Self {
        Self { tagger, lemmatizer }
    }

    pub fn tagger(&self) -> &dyn PosTagger {
        self.tagger.as_ref()
    }

    pub fn decide(&self, token: &TaggedToken, aggressiveness: f32) -> TokenAction {
        if token.tag == PosTag::Verb && aggressiveness >= VERB_NOMINALIZATION_LEVEL {
            // BTreeSet: the first candidate is the smallest lemma
            return match self.lemmatizer.noun_lemmas(&token.text).into_iter().next() {
                Some(noun) => TokenAction::Substitute(noun),
                None => TokenAction::Drop,
            };
        }

        if token.tag.is_nominal() || aggressiveness < FUNCTION_WORD_LEVEL {
            TokenAction::Keep
        } else {
            TokenAction::Drop
        }
    }

    pub fn reduce(&self, text: &str, aggressiveness: f32) -> Reduction {
        if text.trim().is_empty() {
            return Reduction {
                text: text.to_string(),
                ..Default::default()
            };
        }

        let mut reduction = Reduction::default();
        let mut emitted: Vec<String> = Vec::new();

        for token in self.tagger.tag(text) {
            match self.decide(&token, aggressiveness) {
                TokenAction::Keep => {
                    reduction.kept += 1;
                    emitted.push(token.text);
                }
                TokenAction::Substitute(noun) => {
                    reduction.substituted += 1;
                    emitted.push(noun);
                }
                TokenAction::Drop => reduction.dropped += 1,
            }
        }

        debug!(
            "Reduced text: kept={}, substituted={}, dropped={}",
            reduction.kept, reduction.substituted, reduction.dropped
        );

        reduction.text = emitted.join(" ");
        reduction
    }

    /// Runs the reduction and returns only the text
    pub fn linguistic_optimize(&self, text: &str, aggressiveness: f32) -> String {
        self.reduce(text, aggressiveness).text
    }
}

impl std::fmt::Debug for LinguisticReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinguisticReducer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::{NounLexicon, RuleTagger};

    fn reducer() -> LinguisticReducer {
        LinguisticReducer::new(Box::new(RuleTagger::new()), Box::new(NounLexicon::builtin()))
    }

    fn token(text: &str, tag: PosTag) -> TaggedToken {
        TaggedToken::new(text, tag, 0)
    }

    #[test]
    fn test_empty_and_blank_input_unchanged() {
        let r = reducer();
        assert_eq!(r.linguistic_optimize("", 1.0), "");
        assert_eq!(r.linguistic_optimize("  \n ", 1.0), "  \n ");
    }

    #[test]
    fn test_decide_verbs() {
        let r = reducer();
        assert_eq!(
            r.decide(&token("lists", PosTag::Verb), 0.8),
            TokenAction::Substitute("list".to_string())
        );
        assert_eq!(r.decide(&token("explain", PosTag::Verb), 0.9), TokenAction::Drop);
        // below the nominalization level verbs follow the generic rule
        assert_eq!(r.decide(&token("explain", PosTag::Verb), 0.75), TokenAction::Drop);
        assert_eq!(r.decide(&token("explain", PosTag::Verb), 0.5), TokenAction::Keep);
    }

    #[test]
    fn test_decide_nominals_always_kept() {
        let r = reducer();
        for tag in [PosTag::Noun, PosTag::Propn, PosTag::Num] {
            assert_eq!(r.decide(&token("x", tag), 1.0), TokenAction::Keep);
        }
    }

    #[test]
    fn test_decide_function_words() {
        let r = reducer();
        assert_eq!(r.decide(&token("the", PosTag::Det), 0.69), TokenAction::Keep);
        assert_eq!(r.decide(&token("the", PosTag::Det), 0.7), TokenAction::Drop);
        assert_eq!(r.decide(&token(",", PosTag::Punct), 0.7), TokenAction::Drop);
    }

    #[test]
    fn test_low_aggressiveness_keeps_words() {
        let r = reducer();
        let text = "Explain the results of the test in detail";
        assert_eq!(r.linguistic_optimize(text, 0.5), text);
    }

    #[test]
    fn test_high_aggressiveness_keeps_content_words() {
        let r = reducer();
        let reduction = r.reduce("Explain the results of the test in detail.", 0.9);
        assert_eq!(reduction.text, "results test detail");
        assert_eq!(reduction.kept, 3);
        assert_eq!(reduction.dropped, 6);
    }

    #[test]
    fn test_verb_nominalized() {
        let r = reducer();
        let reduction = r.reduce("Please list 5 ideas", 0.8);
        assert_eq!(reduction.text, "list 5 ideas");
        assert_eq!(reduction.substituted, 1);
    }

    #[test]
    fn test_order_preserved() {
        let r = reducer();
        let out = r.linguistic_optimize("Compare Rust and Python for 3 projects", 1.0);
        assert_eq!(out, "Rust Python 3 projects");
    }
}
