//! Part-of-speech tagging and noun lemma lookup
//!
//! The linguistic reducer only needs two things from an NLP toolkit: an
//! ordered list of tagged words for a piece of text, and the noun lemmas a
//! surface word can take. Both are traits so a heavier model can be plugged
//! in; the built-in implementations are a lexicon/suffix-rule tagger and a
//! word-list lemma lexicon.

mod lemma;
mod tagger;

pub use lemma::NounLexicon;
pub use tagger::RuleTagger;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NlpError {
    #[error("Failed to read lexicon {path}: {source}")]
    LexiconRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed lexicon entry at line {line}: {entry}")]
    LexiconEntry { line: usize, entry: String },

    #[error("Unknown part-of-speech tag: {0}")]
    UnknownTag(String),
}

/// Universal part-of-speech tag set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PosTag {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
}

impl PosTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PosTag::Adj => "ADJ",
            PosTag::Adp => "ADP",
            PosTag::Adv => "ADV",
            PosTag::Aux => "AUX",
            PosTag::Cconj => "CCONJ",
            PosTag::Det => "DET",
            PosTag::Intj => "INTJ",
            PosTag::Noun => "NOUN",
            PosTag::Num => "NUM",
            PosTag::Part => "PART",
            PosTag::Pron => "PRON",
            PosTag::Propn => "PROPN",
            PosTag::Punct => "PUNCT",
            PosTag::Sconj => "SCONJ",
            PosTag::Sym => "SYM",
            PosTag::Verb => "VERB",
            PosTag::X => "X",
        }
    }

    /// Content tags the reducer always keeps verbatim
    pub fn is_nominal(&self) -> bool {
        matches!(self, PosTag::Noun | PosTag::Propn | PosTag::Num)
    }
}

impl fmt::Display for PosTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PosTag {
    type Err = NlpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s.to_ascii_uppercase().as_str() {
            "ADJ" => PosTag::Adj,
            "ADP" => PosTag::Adp,
            "ADV" => PosTag::Adv,
            "AUX" => PosTag::Aux,
            "CCONJ" => PosTag::Cconj,
            "DET" => PosTag::Det,
            "INTJ" => PosTag::Intj,
            "NOUN" => PosTag::Noun,
            "NUM" => PosTag::Num,
            "PART" => PosTag::Part,
            "PRON" => PosTag::Pron,
            "PROPN" => PosTag::Propn,
            "PUNCT" => PosTag::Punct,
            "SCONJ" => PosTag::Sconj,
            "SYM" => PosTag::Sym,
            "VERB" => PosTag::Verb,
            "X" => PosTag::X,
            _ => return Err(NlpError::UnknownTag(s.to_string())),
        };
        Ok(tag)
    }
}

/// A word of the input annotated with its part of speech
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    /// Surface text exactly as it appeared in the input
    pub text: String,
    pub tag: PosTag,
    /// Byte offset of the token in the tagged text
    pub offset: usize,
}

impl TaggedToken {
    pub fn new(text: impl Into<String>, tag: PosTag, offset: usize) -> Self {
        Self {
            text: text.into(),
            tag,
            offset,
        }
    }
}

/// Splits text into tagged tokens, in input order
pub trait PosTagger: Send + Sync {
    fn tag(&self, text: &str) -> Vec<TaggedToken>;
}

/// Looks up the noun lemmas a surface word can take
///
/// The returned set is ordered, so "first candidate" is always the
/// lexicographically smallest lemma.
pub trait Lemmatizer: Send + Sync {
    fn noun_lemmas(&self, word: &str) -> BTreeSet<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_display_roundtrip() {
        for tag in [PosTag::Verb, PosTag::Propn, PosTag::Cconj, PosTag::X] {
            let parsed: PosTag = tag.to_string().parse().unwrap();
            assert_eq!(parsed, tag);
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            "GERUND".parse::<PosTag>(),
            Err(NlpError::UnknownTag(_))
        ));
    }

    #[test]
    fn test_nominal_tags() {
        assert!(PosTag::Noun.is_nominal());
        assert!(PosTag::Propn.is_nominal());
        assert!(PosTag::Num.is_nominal());
        assert!(!PosTag::Verb.is_nominal());
        assert!(!PosTag::Adj.is_nominal());
    }

    #[test]
    fn test_tag_serializes_uppercase() {
        let json = serde_json::to_string(&PosTag::Propn).unwrap();
        assert_eq!(json, "\"PROPN\"");
    }
}
