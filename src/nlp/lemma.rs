//! Noun lemma lookup backed by a word list

use super::{Lemmatizer, NlpError};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use tracing::debug;

const BUILTIN_LEXICON: &str = include_str!("../../assets/noun_lemmas.txt");

/// Noun lemma lexicon.
///
/// A word has a noun reading if it is a listed lemma, an irregular surface
/// form, or a regular plural (-s, -es, -ies) of a listed lemma.
#[derive(Debug, Clone, Default)]
pub struct NounLexicon {
    lemmas: HashSet<String>,
    irregular: HashMap<String, String>,
}

impl NounLexicon {
    /// Empty lexicon; every lookup misses
    pub fn empty() -> Self {
        Self::default()
    }

    /// Lexicon built from the embedded word list
    pub fn builtin() -> Self {
        let mut lexicon = Self::empty();
        // The embedded list is checked by the tests below.
        if let Err(e) = lexicon.extend_from_str(BUILTIN_LEXICON) {
            debug!("Skipping malformed builtin lexicon entry: {}", e);
        }
        lexicon
    }

    /// Builtin lexicon plus the entries of a user file
    pub fn with_file(path: impl AsRef<Path>) -> Result<Self, NlpError> {
        let mut lexicon = Self::builtin();
        lexicon.extend_from_file(path)?;
        Ok(lexicon)
    }

    pub fn extend_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), NlpError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| NlpError::LexiconRead {
            path: path.to_path_buf(),
            source,
        })?;
        let before = self.len();
        self.extend_from_str(&content)?;
        debug!(
            "Loaded {} noun lemmas from {}",
            self.len() - before,
            path.display()
        );
        Ok(())
    }

    /// Parses one lemma per line. `#` starts a comment, and a
    /// `surface<TAB>lemma` line records an irregular form.
    pub fn extend_from_str(&mut self, content: &str) -> Result<(), NlpError> {
        for (index, raw) in content.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            match fields.as_slice() {
                [lemma] if is_word(lemma) => self.insert(lemma),
                [surface, lemma] if is_word(surface) && is_word(lemma) => {
                    self.insert_irregular(surface, lemma)
                }
                _ => {
                    return Err(NlpError::LexiconEntry {
                        line: index + 1,
                        entry: raw.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, lemma: &str) {
        self.lemmas.insert(lemma.to_lowercase());
    }

    pub fn insert_irregular(&mut self, surface: &str, lemma: &str) {
        self.irregular
            .insert(surface.to_lowercase(), lemma.to_lowercase());
    }

    pub fn len(&self) -> usize {
        self.lemmas.len() + self.irregular.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Lemmatizer for NounLexicon {
    fn noun_lemmas(&self, word: &str) -> BTreeSet<String> {
        let lower = word.to_lowercase();
        let mut found = BTreeSet::new();

        if let Some(lemma) = self.irregular.get(&lower) {
            found.insert(lemma.clone());
        }
        if self.lemmas.contains(&lower) {
            found.insert(lower.clone());
        }

        let plural_bases = [
            lower.strip_suffix("ies").map(|stem| format!("{stem}y")),
            lower.strip_suffix("es").map(str::to_string),
            lower
                .strip_suffix('s')
                .filter(|stem| !stem.ends_with('s'))
                .map(str::to_string),
        ];
        for base in plural_bases.into_iter().flatten() {
            if !base.is_empty() && self.lemmas.contains(&base) {
                found.insert(base);
            }
        }

        found
    }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_whitespace)
}
